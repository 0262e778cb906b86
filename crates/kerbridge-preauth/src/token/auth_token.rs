use serde_json::{Map, Value};

use super::TokenError;

/// Decoded and validated external identity token.
///
/// Only token decoders produce these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    issuer: String,
    subject: String,
    audiences: Vec<String>,
    not_before: Option<i64>,
    expires_at: Option<i64>,
    issued_at: Option<i64>,
    claims: Map<String, Value>,
}

impl AuthToken {
    pub(crate) fn from_claims(claims: Map<String, Value>) -> Result<Self, TokenError> {
        let issuer = string_claim(&claims, "iss")?.ok_or(TokenError::MissingClaim("iss"))?;
        let subject = string_claim(&claims, "sub")?.ok_or(TokenError::MissingClaim("sub"))?;

        let audiences = match claims.get("aud") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(audience)) => vec![audience.clone()],
            Some(Value::Array(values)) => {
                let mut audiences = Vec::with_capacity(values.len());

                for value in values {
                    let audience = value.as_str().ok_or(TokenError::InvalidClaim("aud"))?;

                    if !audiences.iter().any(|known| known == audience) {
                        audiences.push(audience.to_owned());
                    }
                }

                audiences
            }
            Some(_) => return Err(TokenError::InvalidClaim("aud")),
        };

        Ok(Self {
            issuer,
            subject,
            audiences,
            not_before: time_claim(&claims, "nbf")?,
            expires_at: time_claim(&claims, "exp")?,
            issued_at: time_claim(&claims, "iat")?,
            claims,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Intended recipients, in token order and without duplicates.
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }

    pub fn has_audience(&self, audience: &str) -> bool {
        self.audiences.iter().any(|known| known == audience)
    }

    pub fn not_before(&self) -> Option<i64> {
        self.not_before
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

fn string_claim(claims: &Map<String, Value>, name: &'static str) -> Result<Option<String>, TokenError> {
    match claims.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(TokenError::InvalidClaim(name)),
    }
}

fn time_claim(claims: &Map<String, Value>, name: &'static str) -> Result<Option<i64>, TokenError> {
    match claims.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or(TokenError::InvalidClaim(name)),
    }
}

/// Claims of a token to be minted by a [`TokenEncoder`](super::TokenEncoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokenSpec {
    issuer: String,
    subject: String,
    audiences: Vec<String>,
    not_before: Option<i64>,
    expires_at: Option<i64>,
    issued_at: Option<i64>,
    extra: Map<String, Value>,
}

impl AuthTokenSpec {
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            audiences: Vec::new(),
            not_before: None,
            expires_at: None,
            issued_at: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    #[must_use]
    pub fn not_before(mut self, timestamp: i64) -> Self {
        self.not_before = Some(timestamp);
        self
    }

    #[must_use]
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires_at = Some(timestamp);
        self
    }

    #[must_use]
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn to_claims(&self) -> Map<String, Value> {
        let mut claims = self.extra.clone();

        claims.insert("iss".to_owned(), Value::from(self.issuer.as_str()));
        claims.insert("sub".to_owned(), Value::from(self.subject.as_str()));

        match self.audiences.as_slice() {
            [] => {}
            [audience] => {
                claims.insert("aud".to_owned(), Value::from(audience.as_str()));
            }
            audiences => {
                claims.insert("aud".to_owned(), Value::from(audiences.to_vec()));
            }
        }

        for (name, value) in [("nbf", self.not_before), ("exp", self.expires_at), ("iat", self.issued_at)] {
            if let Some(value) = value {
                claims.insert(name.to_owned(), Value::from(value));
            }
        }

        claims
    }
}
