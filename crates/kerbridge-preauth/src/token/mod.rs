//! Token pre-authentication: bridges an externally issued identity token into the AS and TGS
//! exchanges.
//!
//! A `PA-TOKEN-REQUEST` entry is accepted only after every one of the following gates passed, in
//! this order:
//!
//! 1. the mechanism is allowed by configuration;
//! 2. the envelope decrypts under the armor key with the `PA_TOKEN` key usage;
//! 3. the claimed issuer is on the trusted issuer list;
//! 4. a decoder exists for the token format, and its verification key is resolved if needed;
//! 5. the token decodes and validates;
//! 6. for TGS requests, the server principal of the request body is one of the token audiences.
//!
//! The request context is only written once all gates passed.

mod asn1;
mod auth_token;
mod jwt;
mod provider;
mod verify_key;

use std::sync::Arc;

use kerbridge_crypto::{unseal, KeyUsage};
use picky_krb::data_types::EncryptedData;

pub use self::asn1::{KrbToken, PaTokenRequest, TokenInfo};
pub use self::auth_token::{AuthToken, AuthTokenSpec};
pub use self::jwt::{JwtTokenDecoder, JwtTokenEncoder, JwtTokenProvider};
pub use self::provider::{
    TokenDecoder, TokenEncoder, TokenError, TokenFormat, TokenProvider, TokenProviderRegistry,
};
pub use self::verify_key::{
    resolve_verify_key, KeyResolution, LookupLimiter, LookupPermit, VerifyKeyMaterial, MAX_PENDING_KEY_LOOKUPS,
};
use crate::{
    ContextUpdate, KdcRequest, KdcRequestContext, PaDataType, PluginMeta, PreauthDataEntry, PreauthError,
    PreauthErrorExt as _, PreauthErrorKind, PreauthPlugin, PreauthResult, PreauthResultExt as _, PreauthWarning,
};

/// Progress of one entry through the token gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPreauthState {
    Start,
    PolicyChecked,
    Decrypted,
    IssuerTrusted,
    KeyResolved,
    Decoded,
    AudienceChecked,
    Accepted,
}

impl TokenPreauthState {
    /// Error context of a failure on the way to this state.
    pub fn context(self) -> &'static str {
        match self {
            Self::Start => "token preauth",
            Self::PolicyChecked => "token preauth policy",
            Self::Decrypted => "token preauth decryption",
            Self::IssuerTrusted => "token preauth issuer check",
            Self::KeyResolved => "token preauth key resolution",
            Self::Decoded => "token preauth decoding",
            Self::AudienceChecked => "token preauth audience check",
            Self::Accepted => "token preauth commit",
        }
    }

    fn advance(&mut self, next: Self) {
        trace!(from = ?self, to = ?next, "Token pre-authentication gate passed");
        *self = next;
    }
}

pub struct TokenPreauth {
    meta: PluginMeta,
    providers: Arc<TokenProviderRegistry>,
}

impl TokenPreauth {
    pub const NAME: &'static str = "token";

    pub fn new(providers: Arc<TokenProviderRegistry>) -> Self {
        Self {
            meta: PluginMeta::new(
                Self::NAME,
                1,
                &[PaDataType::TOKEN_REQUEST, PaDataType::TOKEN_CHALLENGE],
            ),
            providers,
        }
    }

    /// Installs the issuer's verification key into `decoder` when it needs one.
    ///
    /// Failing to find or load a key is not fatal: the decoder decides at decode time.
    fn install_verify_key(
        &self,
        ctx: &mut KdcRequestContext,
        issuer: &str,
        decoder: &mut dyn TokenDecoder,
    ) -> KeyResolution {
        if !decoder.requires_verify_key() {
            return KeyResolution::NotRequired;
        }

        let (mut resolution, material) = resolve_verify_key(ctx.config(), issuer);

        if let Some(material) = material {
            if let Err(e) = decoder.set_verify_key(&material) {
                resolution = KeyResolution::LoadFailed {
                    path: Some(material.path().to_path_buf()),
                    reason: e.to_string(),
                };
            }
        }

        match &resolution {
            KeyResolution::Scanned { path, candidates } if !candidates.is_empty() => {
                warn!(
                    issuer,
                    chosen = %path.display(),
                    candidates = ?candidates,
                    "Several verification key files match the issuer"
                );

                ctx.push_warning(PreauthWarning::AmbiguousVerifyKey {
                    issuer: issuer.to_owned(),
                    chosen: path.clone(),
                    candidates: candidates.clone(),
                });
            }
            KeyResolution::LoadFailed { path, reason } => {
                warn!(issuer, ?path, %reason, "Failed to load the verification key");

                ctx.push_warning(PreauthWarning::KeyLoadFailed {
                    issuer: issuer.to_owned(),
                    path: path.clone(),
                    reason: reason.clone(),
                });
            }
            KeyResolution::TimedOut => {
                warn!(issuer, timeout = ?ctx.config().key_scan_timeout(), "Verification key lookup timed out");

                ctx.push_warning(PreauthWarning::KeyLoadFailed {
                    issuer: issuer.to_owned(),
                    path: None,
                    reason: "verification key lookup timed out".to_owned(),
                });
            }
            KeyResolution::NotFound | KeyResolution::NoDirectory => {
                debug!(issuer, ?resolution, "No verification key for issuer");
            }
            KeyResolution::NotRequired | KeyResolution::Explicit(_) | KeyResolution::Scanned { .. } => {}
        }

        resolution
    }
}

impl PreauthPlugin for TokenPreauth {
    fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    fn verify(&self, ctx: &mut KdcRequestContext, entry: &PreauthDataEntry) -> PreauthResult<bool> {
        let mut state = TokenPreauthState::Start;

        if !ctx.config().allow_token_preauth() {
            warn!("Token pre-authentication is not allowed");
            return Err(PreauthError::policy_denied(TokenPreauthState::PolicyChecked.context()));
        }

        state.advance(TokenPreauthState::PolicyChecked);

        if entry.pa_type() != PaDataType::TOKEN_REQUEST {
            return Ok(false);
        }

        let context = TokenPreauthState::Decrypted.context();

        let armor_key = ctx
            .armor_key()
            .cloned()
            .ok_or_else(|| PreauthError::new(context, PreauthErrorKind::MissingArmorKey))?;

        let encrypted: EncryptedData =
            picky_asn1_der::from_bytes(entry.data()).map_err(|e| PreauthError::decode(context, e))?;

        let request = unseal::<asn1::PaTokenRequest>(&encrypted, &armor_key, KeyUsage::PA_TOKEN)
            .map_err(|e| PreauthError::crypto(context, e))?;

        state.advance(TokenPreauthState::Decrypted);

        let issuer = request.token_vendor();

        if !ctx.config().is_trusted_issuer(&issuer) {
            warn!(%issuer, "Token issuer is not trusted");
            return Err(PreauthError::untrusted_issuer(
                TokenPreauthState::IssuerTrusted.context(),
                issuer,
            ));
        }

        state.advance(TokenPreauthState::IssuerTrusted);

        let context = TokenPreauthState::KeyResolved.context();

        let format = request
            .token_format()
            .ok_or_else(|| PreauthError::new(context, PreauthErrorKind::Decode))?;

        let mut decoder = self
            .providers
            .create_token_decoder(format, ctx.config().token_leeway())
            .map_err(|e| PreauthError::decode(context, e))?;

        let resolution = self.install_verify_key(ctx, &issuer, decoder.as_mut());

        trace!(?resolution, "Verification key resolved");
        state.advance(TokenPreauthState::KeyResolved);

        let token = decoder.decode_from_bytes(request.token_value()).map_err(|e| {
            warn!(%issuer, error = %e, "Token rejected by the decoder");
            PreauthError::token(TokenPreauthState::Decoded.context(), e)
        })?;

        state.advance(TokenPreauthState::Decoded);

        let server_principal = match ctx.request() {
            KdcRequest::As(_) => None,
            KdcRequest::Tgs(tgs_request) => {
                let context = TokenPreauthState::AudienceChecked.context();

                let principal = tgs_request.server_principal().with_context(context)?;
                let name = principal.name();

                if !token.has_audience(&name) {
                    warn!(%issuer, server_principal = %name, audiences = ?token.audiences(), "Token is not scoped to the server principal");
                    return Err(PreauthError::audience_mismatch(context, name));
                }

                state.advance(TokenPreauthState::AudienceChecked);

                Some(principal)
            }
        };

        info!(
            issuer = token.issuer(),
            subject = token.subject(),
            "Token pre-authentication accepted"
        );

        let mut update = ContextUpdate::new(Self::NAME)
            .with_client_key(armor_key)
            .with_token(token);

        if let Some(principal) = server_principal {
            update = update.with_server_principal(principal);
        }

        ctx.apply(update).with_context(TokenPreauthState::Accepted.context())?;

        state.advance(TokenPreauthState::Accepted);

        Ok(true)
    }

    fn provide_padata(&self, ctx: &KdcRequestContext) -> Vec<PreauthDataEntry> {
        if ctx.config().allow_token_preauth() {
            vec![PreauthDataEntry::new(PaDataType::TOKEN_CHALLENGE, Vec::new())]
        } else {
            Vec::new()
        }
    }
}
