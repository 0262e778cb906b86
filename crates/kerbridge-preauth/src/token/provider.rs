use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{AuthToken, AuthTokenSpec, JwtTokenProvider, VerifyKeyMaterial};

/// Wire tag of the token carried in a `KrbToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenFormat {
    Jwt,
}

impl TokenFormat {
    pub const fn value(self) -> i32 {
        match self {
            Self::Jwt => 1,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Jwt),
            _ => None,
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt => write!(f, "JWT"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no token provider for format {0}")]
    UnsupportedFormat(i32),
    #[error("a verification key is required to decode this token")]
    MissingVerifyKey,
    #[error("a signing key is required to encode this token")]
    MissingSignKey,
    #[error("invalid key material")]
    Key(#[source] jsonwebtoken::errors::Error),
    #[error("token rejected")]
    Rejected(#[source] jsonwebtoken::errors::Error),
    #[error("token signing failed")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("token is not valid UTF-8")]
    NotUtf8(#[source] core::str::Utf8Error),
    #[error("missing `{0}` claim")]
    MissingClaim(&'static str),
    #[error("invalid `{0}` claim")]
    InvalidClaim(&'static str),
}

/// Decodes and validates one token format.
///
/// Decoders are created per request and may hold the verification key installed for it.
pub trait TokenDecoder: Send {
    /// Whether [`TokenDecoder::decode_from_bytes`] needs a key installed with
    /// [`TokenDecoder::set_verify_key`].
    fn requires_verify_key(&self) -> bool;

    fn set_verify_key(&mut self, key: &VerifyKeyMaterial) -> Result<(), TokenError>;

    fn decode_from_bytes(&self, bytes: &[u8]) -> Result<AuthToken, TokenError>;
}

pub trait TokenEncoder: Send {
    fn set_sign_key(&mut self, pem: &[u8]) -> Result<(), TokenError>;

    fn encode(&self, spec: &AuthTokenSpec) -> Result<Vec<u8>, TokenError>;
}

pub trait TokenProvider: Send + Sync {
    fn token_format(&self) -> TokenFormat;

    fn create_token_decoder(&self, leeway: Duration) -> Box<dyn TokenDecoder>;

    fn create_token_encoder(&self) -> Box<dyn TokenEncoder>;
}

/// Token providers by format. Built once at startup and shared.
#[derive(Default)]
pub struct TokenProviderRegistry {
    providers: BTreeMap<TokenFormat, Arc<dyn TokenProvider>>,
}

impl TokenProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in JWT provider.
    pub fn with_defaults() -> Self {
        Self::new().with_provider(Arc::new(JwtTokenProvider))
    }

    /// Adds a provider, replacing any previous one for the same format.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.providers.insert(provider.token_format(), provider);
        self
    }

    pub fn provider(&self, format: TokenFormat) -> Option<&dyn TokenProvider> {
        self.providers.get(&format).map(|provider| provider.as_ref())
    }

    pub fn formats(&self) -> impl Iterator<Item = TokenFormat> + '_ {
        self.providers.keys().copied()
    }

    pub fn create_token_decoder(&self, format: i32, leeway: Duration) -> Result<Box<dyn TokenDecoder>, TokenError> {
        TokenFormat::from_value(format)
            .and_then(|format| self.provider(format))
            .map(|provider| provider.create_token_decoder(leeway))
            .ok_or(TokenError::UnsupportedFormat(format))
    }

    pub fn create_token_encoder(&self, format: TokenFormat) -> Result<Box<dyn TokenEncoder>, TokenError> {
        self.provider(format)
            .map(|provider| provider.create_token_encoder())
            .ok_or(TokenError::UnsupportedFormat(format.value()))
    }
}
