use core::fmt;

use picky_asn1::wrapper::{ExplicitContextTag0, ExplicitContextTag1, OctetStringAsn1};
use picky_krb::data_types;
use rand::RngCore as _;
use subtle::ConstantTimeEq as _;
use zeroize::Zeroizing;

use crate::integer::{i32_to_integer, integer_to_i32};
use crate::{string_to_key, CryptoError, CryptoResult, EncryptionType};

/// Symmetric key along its encryption type. The key value is wiped on drop.
#[derive(Clone)]
pub struct EncryptionKey {
    etype: EncryptionType,
    value: Zeroizing<Vec<u8>>,
}

impl EncryptionKey {
    pub fn new(etype: EncryptionType, value: Vec<u8>) -> CryptoResult<Self> {
        let value = Zeroizing::new(value);

        etype.check_key_length(&value)?;

        Ok(Self { etype, value })
    }

    pub fn from_password(etype: EncryptionType, password: &str, salt: &str) -> CryptoResult<Self> {
        let value = string_to_key(etype, password.as_bytes(), salt.as_bytes())?;

        Ok(Self { etype, value })
    }

    pub fn random(etype: EncryptionType) -> Self {
        let mut value = Zeroizing::new(vec![0; etype.key_size()]);
        rand::rng().fill_bytes(value.as_mut_slice());

        Self { etype, value }
    }

    pub fn etype(&self) -> EncryptionType {
        self.etype
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn to_asn1(&self) -> data_types::EncryptionKey {
        data_types::EncryptionKey {
            key_type: ExplicitContextTag0::from(i32_to_integer(self.etype.etype())),
            key_value: ExplicitContextTag1::from(OctetStringAsn1::from(self.value.to_vec())),
        }
    }
}

impl TryFrom<&data_types::EncryptionKey> for EncryptionKey {
    type Error = CryptoError;

    fn try_from(key: &data_types::EncryptionKey) -> Result<Self, Self::Error> {
        let key_type = integer_to_i32(&key.key_type.0).ok_or(CryptoError::MalformedInteger)?;
        let etype = EncryptionType::from_etype(key_type)?;

        Self::new(etype, key.key_value.0.0.clone())
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.etype == other.etype && bool::from(self.value.as_slice().ct_eq(other.value.as_slice()))
    }
}

impl Eq for EncryptionKey {}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("etype", &self.etype)
            .field("value", &"<redacted>")
            .finish()
    }
}
