//! JSON Web Token provider backed by `jsonwebtoken`.
//!
//! Only asymmetric signatures are accepted. The algorithms allowed for a token are those of the
//! installed key family, so neither `none` nor HMAC can be used to forge a token.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use super::{
    AuthToken, AuthTokenSpec, TokenDecoder, TokenEncoder, TokenError, TokenFormat, TokenProvider, VerifyKeyMaterial,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Rsa,
    Ec,
}

impl KeyFamily {
    fn algorithms(self) -> &'static [Algorithm] {
        match self {
            Self::Rsa => &[
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ],
            Self::Ec => &[Algorithm::ES256, Algorithm::ES384],
        }
    }

    fn signing_algorithm(self) -> Algorithm {
        match self {
            Self::Rsa => Algorithm::RS256,
            Self::Ec => Algorithm::ES256,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JwtTokenProvider;

impl TokenProvider for JwtTokenProvider {
    fn token_format(&self) -> TokenFormat {
        TokenFormat::Jwt
    }

    fn create_token_decoder(&self, leeway: Duration) -> Box<dyn TokenDecoder> {
        Box::new(JwtTokenDecoder::new(leeway))
    }

    fn create_token_encoder(&self) -> Box<dyn TokenEncoder> {
        Box::new(JwtTokenEncoder::new())
    }
}

pub struct JwtTokenDecoder {
    leeway: Duration,
    key: Option<(DecodingKey, KeyFamily)>,
}

impl JwtTokenDecoder {
    pub fn new(leeway: Duration) -> Self {
        Self { leeway, key: None }
    }

    fn validation(&self, family: KeyFamily) -> Validation {
        let mut validation = Validation::new(family.signing_algorithm());
        validation.algorithms = family.algorithms().to_vec();
        validation.leeway = self.leeway.as_secs();
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

impl TokenDecoder for JwtTokenDecoder {
    fn requires_verify_key(&self) -> bool {
        true
    }

    fn set_verify_key(&mut self, key: &VerifyKeyMaterial) -> Result<(), TokenError> {
        let key = match DecodingKey::from_rsa_pem(key.pem()) {
            Ok(key) => (key, KeyFamily::Rsa),
            Err(_) => (
                DecodingKey::from_ec_pem(key.pem()).map_err(TokenError::Key)?,
                KeyFamily::Ec,
            ),
        };

        self.key = Some(key);

        Ok(())
    }

    fn decode_from_bytes(&self, bytes: &[u8]) -> Result<AuthToken, TokenError> {
        let (key, family) = self.key.as_ref().ok_or(TokenError::MissingVerifyKey)?;

        let token = core::str::from_utf8(bytes).map_err(TokenError::NotUtf8)?;

        let data = jsonwebtoken::decode::<Map<String, Value>>(token.trim(), key, &self.validation(*family))
            .map_err(TokenError::Rejected)?;

        AuthToken::from_claims(data.claims)
    }
}

#[derive(Default)]
pub struct JwtTokenEncoder {
    key: Option<(EncodingKey, KeyFamily)>,
}

impl JwtTokenEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenEncoder for JwtTokenEncoder {
    fn set_sign_key(&mut self, pem: &[u8]) -> Result<(), TokenError> {
        let key = match EncodingKey::from_rsa_pem(pem) {
            Ok(key) => (key, KeyFamily::Rsa),
            Err(_) => (EncodingKey::from_ec_pem(pem).map_err(TokenError::Key)?, KeyFamily::Ec),
        };

        self.key = Some(key);

        Ok(())
    }

    fn encode(&self, spec: &AuthTokenSpec) -> Result<Vec<u8>, TokenError> {
        let (key, family) = self.key.as_ref().ok_or(TokenError::MissingSignKey)?;

        let header = Header::new(family.signing_algorithm());

        let token = jsonwebtoken::encode(&header, &spec.to_claims(), key).map_err(TokenError::Sign)?;

        Ok(token.into_bytes())
    }
}
