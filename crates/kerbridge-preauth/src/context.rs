use std::path::PathBuf;
use std::sync::Arc;

use kerbridge_crypto::EncryptionKey;

use crate::token::AuthToken;
use crate::{KdcConfig, KdcRequest, PreauthError, PreauthErrorExt as _, PreauthResult, PrincipalName, RequestKind};

/// Observable, non-fatal events recorded while processing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreauthWarning {
    /// A verification key was found but could not be loaded; decoding went on without it.
    KeyLoadFailed {
        issuer: String,
        path: Option<PathBuf>,
        reason: String,
    },
    /// Several key files matched the issuer; the first one in file name order was used.
    AmbiguousVerifyKey {
        issuer: String,
        chosen: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

/// Per-request state shared by the mechanisms processing one request.
///
/// Owned by a single worker and threaded through dispatch by exclusive borrow. The armor key,
/// client key, token and server principal are set-once: writing the same value again is a no-op,
/// writing a different one is a [`ContextAnomaly`](crate::PreauthErrorKind::ContextAnomaly).
#[derive(Debug)]
pub struct KdcRequestContext {
    config: Arc<KdcConfig>,
    request: KdcRequest,
    armor_key: Option<EncryptionKey>,
    client_key: Option<EncryptionKey>,
    token: Option<AuthToken>,
    server_principal: Option<PrincipalName>,
    authenticated_by: Vec<&'static str>,
    warnings: Vec<PreauthWarning>,
}

impl KdcRequestContext {
    pub fn new(config: Arc<KdcConfig>, request: KdcRequest) -> Self {
        Self {
            config,
            request,
            armor_key: None,
            client_key: None,
            token: None,
            server_principal: None,
            authenticated_by: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn for_as(config: Arc<KdcConfig>, as_req: picky_krb::messages::AsReq) -> Self {
        Self::new(config, KdcRequest::from(as_req))
    }

    pub fn for_tgs(config: Arc<KdcConfig>, tgs_req: picky_krb::messages::TgsReq) -> Self {
        Self::new(config, KdcRequest::from(tgs_req))
    }

    pub fn config(&self) -> &KdcConfig {
        &self.config
    }

    pub fn request(&self) -> &KdcRequest {
        &self.request
    }

    pub fn kind(&self) -> RequestKind {
        self.request.kind()
    }

    pub fn armor_key(&self) -> Option<&EncryptionKey> {
        self.armor_key.as_ref()
    }

    pub fn client_key(&self) -> Option<&EncryptionKey> {
        self.client_key.as_ref()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn server_principal(&self) -> Option<&PrincipalName> {
        self.server_principal.as_ref()
    }

    pub fn warnings(&self) -> &[PreauthWarning] {
        &self.warnings
    }

    /// Mechanisms that accepted a pre-authentication entry of this request.
    pub fn authenticated_by(&self) -> &[&'static str] {
        &self.authenticated_by
    }

    pub fn is_preauth_done(&self) -> bool {
        !self.authenticated_by.is_empty()
    }

    pub fn set_armor_key(&mut self, key: EncryptionKey) -> PreauthResult<()> {
        check_once(self.armor_key.as_ref(), &key, "armor key")?;
        self.armor_key = Some(key);
        Ok(())
    }

    pub fn set_client_key(&mut self, key: EncryptionKey) -> PreauthResult<()> {
        check_once(self.client_key.as_ref(), &key, "client key")?;
        self.client_key = Some(key);
        Ok(())
    }

    pub fn set_token(&mut self, token: AuthToken) -> PreauthResult<()> {
        check_once(self.token.as_ref(), &token, "token")?;
        self.token = Some(token);
        Ok(())
    }

    pub fn set_server_principal(&mut self, principal: PrincipalName) -> PreauthResult<()> {
        self.check_server_principal(&principal)?;
        self.server_principal = Some(principal);
        Ok(())
    }

    /// Records that `mechanism` authenticated the request without changing any slot.
    pub fn mark_preauth_done(&mut self, mechanism: &'static str) {
        if !self.authenticated_by.contains(&mechanism) {
            self.authenticated_by.push(mechanism);
        }
    }

    pub(crate) fn push_warning(&mut self, warning: PreauthWarning) {
        self.warnings.push(warning);
    }

    /// Applies every change of `update`, or none of them.
    pub fn apply(&mut self, update: ContextUpdate) -> PreauthResult<()> {
        if let Some(key) = &update.client_key {
            check_once(self.client_key.as_ref(), key, "client key")?;
        }

        if let Some(token) = &update.token {
            check_once(self.token.as_ref(), token, "token")?;
        }

        if let Some(principal) = &update.server_principal {
            self.check_server_principal(principal)?;
        }

        let ContextUpdate {
            mechanism,
            client_key,
            token,
            server_principal,
        } = update;

        if client_key.is_some() {
            self.client_key = client_key;
        }

        if token.is_some() {
            self.token = token;
        }

        if server_principal.is_some() {
            self.server_principal = server_principal;
        }

        self.mark_preauth_done(mechanism);

        Ok(())
    }

    fn check_server_principal(&self, principal: &PrincipalName) -> PreauthResult<()> {
        if self.kind() == RequestKind::As {
            warn!(%principal, "Server principal resolution attempted on an AS request");
            return Err(PreauthError::context_anomaly("server principal"));
        }

        check_once(self.server_principal.as_ref(), principal, "server principal")
    }
}

fn check_once<T: PartialEq>(current: Option<&T>, new: &T, field: &'static str) -> PreauthResult<()> {
    match current {
        Some(current) if current != new => {
            warn!(field, "Conflicting write to a set-once request context field, keeping the original value");
            Err(PreauthError::context_anomaly(field))
        }
        _ => Ok(()),
    }
}

/// Changes a mechanism commits to the request context once all of its checks passed.
#[derive(Debug, Clone)]
#[must_use]
pub struct ContextUpdate {
    mechanism: &'static str,
    client_key: Option<EncryptionKey>,
    token: Option<AuthToken>,
    server_principal: Option<PrincipalName>,
}

impl ContextUpdate {
    pub fn new(mechanism: &'static str) -> Self {
        Self {
            mechanism,
            client_key: None,
            token: None,
            server_principal: None,
        }
    }

    pub fn with_client_key(mut self, key: EncryptionKey) -> Self {
        self.client_key = Some(key);
        self
    }

    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_server_principal(mut self, principal: PrincipalName) -> Self {
        self.server_principal = Some(principal);
        self
    }
}
