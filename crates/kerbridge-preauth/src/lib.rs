#![doc = include_str!("../README.md")]

#[macro_use]
extern crate tracing;

#[macro_use]
mod macros;

pub mod config;
mod context;
mod enc_ts;
mod padata;
mod plugin;
mod principal;
mod registry;
mod request;
pub mod token;

use core::fmt;

use kerbridge_crypto::CryptoError;
use picky_krb::constants::error_codes::{
    KDC_ERROR_CLIENT_NOT_TRUSTED, KDC_ERR_ETYPE_NOSUPP, KDC_ERR_POLICY, KDC_ERR_PREAUTH_FAILED,
    KRB_AP_ERR_BAD_INTEGRITY, KRB_AP_ERR_SKEW, KRB_ERR_GENERIC,
};

pub use self::config::{ConfigError, KdcConfig};
pub use self::context::{ContextUpdate, KdcRequestContext, PreauthWarning};
pub use self::enc_ts::EncTsPreauth;
pub use self::padata::{PaDataType, PreauthDataEntry};
pub use self::plugin::{PluginMeta, PreauthPlugin};
pub use self::principal::PrincipalName;
pub use self::registry::{EntryOutcome, PreauthOutcome, PreauthRegistry, PreauthRegistryBuilder, PreauthReport};
pub use self::request::{AsRequest, KdcRequest, RequestKind, TgsRequest};
pub use self::token::{AuthToken, TokenError, TokenPreauth, TokenProviderRegistry};

pub type PreauthResult<T> = Result<T, PreauthError>;

#[non_exhaustive]
#[derive(Debug)]
pub enum PreauthErrorKind {
    /// Mechanism disabled by configuration
    PolicyDenied,
    UntrustedIssuer { issuer: String },
    Integrity(CryptoError),
    /// Malformed pre-authentication envelope or request structure
    Decode,
    /// The external token failed to decode or validate
    DecodeFailure(TokenError),
    AudienceMismatch { server_principal: String },
    UnsupportedAlgorithm(CryptoError),
    MissingArmorKey,
    MissingClientKey,
    ClockSkew { skew_secs: i64 },
    /// Conflicting write to a set-once request context slot
    ContextAnomaly { field: &'static str },
    DuplicateMechanism(PaDataType),
    Reason(String),
    General,
    Custom,
}

impl fmt::Display for PreauthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            PreauthErrorKind::PolicyDenied => write!(f, "pre-authentication mechanism denied by policy"),
            PreauthErrorKind::UntrustedIssuer { issuer } => write!(f, "untrusted token issuer: {issuer}"),
            PreauthErrorKind::Integrity(_) => write!(f, "integrity failure"),
            PreauthErrorKind::Decode => write!(f, "decode error"),
            PreauthErrorKind::DecodeFailure(_) => write!(f, "token decoding failed"),
            PreauthErrorKind::AudienceMismatch { server_principal } => {
                write!(f, "token audience does not include {server_principal}")
            }
            PreauthErrorKind::UnsupportedAlgorithm(_) => write!(f, "unsupported algorithm"),
            PreauthErrorKind::MissingArmorKey => write!(f, "no armor key in request context"),
            PreauthErrorKind::MissingClientKey => write!(f, "no client key in request context"),
            PreauthErrorKind::ClockSkew { skew_secs } => write!(f, "clock skew too great: {skew_secs}s"),
            PreauthErrorKind::ContextAnomaly { field } => write!(f, "conflicting write to request context {field}"),
            PreauthErrorKind::DuplicateMechanism(pa_type) => {
                write!(f, "a mechanism is already registered for {pa_type}")
            }
            PreauthErrorKind::Reason(description) => write!(f, "reason: {description}"),
            PreauthErrorKind::General => write!(f, "general error"),
            PreauthErrorKind::Custom => write!(f, "custom error"),
        }
    }
}

impl std::error::Error for PreauthErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self {
            PreauthErrorKind::Integrity(e) => Some(e),
            PreauthErrorKind::UnsupportedAlgorithm(e) => Some(e),
            PreauthErrorKind::DecodeFailure(e) => Some(e),
            PreauthErrorKind::PolicyDenied
            | PreauthErrorKind::UntrustedIssuer { .. }
            | PreauthErrorKind::Decode
            | PreauthErrorKind::AudienceMismatch { .. }
            | PreauthErrorKind::MissingArmorKey
            | PreauthErrorKind::MissingClientKey
            | PreauthErrorKind::ClockSkew { .. }
            | PreauthErrorKind::ContextAnomaly { .. }
            | PreauthErrorKind::DuplicateMechanism(_)
            | PreauthErrorKind::Reason(_)
            | PreauthErrorKind::General
            | PreauthErrorKind::Custom => None,
        }
    }
}

pub type PreauthError = kerbridge_error::Error<PreauthErrorKind>;

pub trait PreauthErrorExt {
    fn policy_denied(context: &'static str) -> Self;
    fn untrusted_issuer(context: &'static str, issuer: impl Into<String>) -> Self;
    fn audience_mismatch(context: &'static str, server_principal: impl Into<String>) -> Self;
    fn decode<E>(context: &'static str, e: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static;
    fn token(context: &'static str, error: TokenError) -> Self;
    fn crypto(context: &'static str, error: CryptoError) -> Self;
    fn context_anomaly(field: &'static str) -> Self;
    fn general(context: &'static str) -> Self;
    fn reason(context: &'static str, reason: impl Into<String>) -> Self;
    fn custom<E>(context: &'static str, e: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static;

    /// Kerberos error code sent back to the client.
    fn krb_error_code(&self) -> u32;

    /// Generic text safe to put in a client-visible KRB-ERROR.
    fn client_message(&self) -> &'static str;
}

impl PreauthErrorExt for PreauthError {
    fn policy_denied(context: &'static str) -> Self {
        Self::new(context, PreauthErrorKind::PolicyDenied)
    }

    fn untrusted_issuer(context: &'static str, issuer: impl Into<String>) -> Self {
        Self::new(context, PreauthErrorKind::UntrustedIssuer { issuer: issuer.into() })
    }

    fn audience_mismatch(context: &'static str, server_principal: impl Into<String>) -> Self {
        Self::new(
            context,
            PreauthErrorKind::AudienceMismatch {
                server_principal: server_principal.into(),
            },
        )
    }

    fn decode<E>(context: &'static str, e: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        Self::new(context, PreauthErrorKind::Decode).with_source(e)
    }

    fn token(context: &'static str, error: TokenError) -> Self {
        Self::new(context, PreauthErrorKind::DecodeFailure(error))
    }

    fn crypto(context: &'static str, error: CryptoError) -> Self {
        match error {
            CryptoError::UnsupportedAlgorithm(_) => Self::new(context, PreauthErrorKind::UnsupportedAlgorithm(error)),
            CryptoError::Decode(_) => Self::new(context, PreauthErrorKind::Decode).with_source(error),
            _ => Self::new(context, PreauthErrorKind::Integrity(error)),
        }
    }

    fn context_anomaly(field: &'static str) -> Self {
        Self::new("request context", PreauthErrorKind::ContextAnomaly { field })
    }

    fn general(context: &'static str) -> Self {
        Self::new(context, PreauthErrorKind::General)
    }

    fn reason(context: &'static str, reason: impl Into<String>) -> Self {
        Self::new(context, PreauthErrorKind::Reason(reason.into()))
    }

    fn custom<E>(context: &'static str, e: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        Self::new(context, PreauthErrorKind::Custom).with_source(e)
    }

    fn krb_error_code(&self) -> u32 {
        match self.kind() {
            PreauthErrorKind::PolicyDenied => KDC_ERR_POLICY,
            PreauthErrorKind::Integrity(_) => KRB_AP_ERR_BAD_INTEGRITY,
            PreauthErrorKind::UnsupportedAlgorithm(_) => KDC_ERR_ETYPE_NOSUPP,
            PreauthErrorKind::ClockSkew { .. } => KRB_AP_ERR_SKEW,
            PreauthErrorKind::UntrustedIssuer { .. } => KDC_ERROR_CLIENT_NOT_TRUSTED,
            PreauthErrorKind::Decode
            | PreauthErrorKind::DecodeFailure(_)
            | PreauthErrorKind::AudienceMismatch { .. }
            | PreauthErrorKind::MissingArmorKey
            | PreauthErrorKind::MissingClientKey => KDC_ERR_PREAUTH_FAILED,
            PreauthErrorKind::ContextAnomaly { .. }
            | PreauthErrorKind::DuplicateMechanism(_)
            | PreauthErrorKind::Reason(_)
            | PreauthErrorKind::General
            | PreauthErrorKind::Custom => KRB_ERR_GENERIC,
        }
    }

    fn client_message(&self) -> &'static str {
        match self.kind() {
            PreauthErrorKind::PolicyDenied => "pre-authentication mechanism unavailable",
            _ => "pre-authentication failed",
        }
    }
}

pub trait PreauthResultExt {
    #[must_use]
    fn with_context(self, context: &'static str) -> Self;
}

impl<T> PreauthResultExt for PreauthResult<T> {
    fn with_context(self, context: &'static str) -> Self {
        self.map_err(|mut e| {
            e.context = context;
            e
        })
    }
}
