use kerbridge_crypto::integer::{i32_to_integer, integer_to_i32};
use kerbridge_crypto::{seal, EncryptionKey, KeyUsage};
use picky_asn1::restricted_string::Ia5String;
use picky_asn1::wrapper::{
    BitStringAsn1, ExplicitContextTag0, ExplicitContextTag1, IntegerAsn1, OctetStringAsn1, Optional,
};
use picky_krb::data_types::KerberosStringAsn1;
use serde::{Deserialize, Serialize};

use super::TokenFormat;
use crate::{PaDataType, PreauthDataEntry, PreauthError, PreauthErrorExt as _, PreauthResult};

/// ```not_rust
/// TokenInfo ::= SEQUENCE {
///     flags           [0] TokenFlags OPTIONAL,
///     token-vendor    [1] KerberosString,
/// }
/// ```
///
/// `KerberosString` is a GeneralString restricted to IA5 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub flags: Optional<Option<ExplicitContextTag0<BitStringAsn1>>>,
    pub token_vendor: ExplicitContextTag1<KerberosStringAsn1>,
}

/// ```not_rust
/// KrbToken ::= SEQUENCE {
///     token-format    [0] INTEGER,
///     token-value     [1] OCTET STRING,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KrbToken {
    pub token_format: ExplicitContextTag0<IntegerAsn1>,
    pub token_value: ExplicitContextTag1<OctetStringAsn1>,
}

/// ```not_rust
/// PA-TOKEN-REQUEST ::= SEQUENCE {
///     token-info      [0] TokenInfo,
///     token           [1] KrbToken,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaTokenRequest {
    pub token_info: ExplicitContextTag0<TokenInfo>,
    pub token: ExplicitContextTag1<KrbToken>,
}

impl PaTokenRequest {
    pub fn new(issuer: &str, format: TokenFormat, token_value: Vec<u8>) -> PreauthResult<Self> {
        let token_vendor = Ia5String::from_string(issuer.to_owned())
            .map_err(|_| reason_err!("PA-TOKEN-REQUEST", "token vendor is not an IA5 string"))?;

        Ok(Self {
            token_info: ExplicitContextTag0::from(TokenInfo {
                flags: Optional::from(None),
                token_vendor: ExplicitContextTag1::from(KerberosStringAsn1::from(token_vendor)),
            }),
            token: ExplicitContextTag1::from(KrbToken {
                token_format: ExplicitContextTag0::from(i32_to_integer(format.value())),
                token_value: ExplicitContextTag1::from(OctetStringAsn1::from(token_value)),
            }),
        })
    }

    /// Issuer claimed by the client, before any verification.
    pub fn token_vendor(&self) -> String {
        self.token_info.0.token_vendor.0.to_string()
    }

    /// Raw format tag, `None` when it does not fit an Int32.
    pub fn token_format(&self) -> Option<i32> {
        integer_to_i32(&self.token.0.token_format.0)
    }

    pub fn token_value(&self) -> &[u8] {
        &self.token.0.token_value.0.0
    }

    pub fn to_der(&self) -> PreauthResult<Vec<u8>> {
        picky_asn1_der::to_vec(self).map_err(|e| custom_err!("PA-TOKEN-REQUEST", e))
    }

    pub fn from_der(bytes: &[u8]) -> PreauthResult<Self> {
        picky_asn1_der::from_bytes(bytes).map_err(|e| PreauthError::decode("PA-TOKEN-REQUEST", e))
    }

    /// Encrypts the request under the armor key and wraps it into a `TOKEN_REQUEST` entry.
    pub fn seal(&self, armor_key: &EncryptionKey) -> PreauthResult<PreauthDataEntry> {
        let encrypted = seal(self, armor_key, KeyUsage::PA_TOKEN)
            .map_err(|e| PreauthError::crypto("seal PA-TOKEN-REQUEST", e))?;

        let data = picky_asn1_der::to_vec(&encrypted).map_err(|e| custom_err!("EncryptedData", e))?;

        Ok(PreauthDataEntry::new(PaDataType::TOKEN_REQUEST, data))
    }
}
