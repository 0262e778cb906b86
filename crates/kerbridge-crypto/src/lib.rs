#![doc = include_str!("../README.md")]

mod checksum;
mod etype;
pub mod integer;
mod key;
mod key_usage;
mod seal;

pub use checksum::{
    compute, verify, verify_for_integrity, ChecksumAlgorithm, ChecksumEngine, Crc32Checksum, HmacSha196Aes128Checksum,
    HmacSha196Aes256Checksum,
};
pub use etype::{decrypt, derive_subkey, encrypt, string_to_key, EncryptionType};
pub use key::EncryptionKey;
pub use key_usage::{KeyDerivationPurpose, KeyUsage};
pub use seal::{seal, unseal};

use picky_asn1_der::Asn1DerError;
use picky_krb::crypto::KerberosCryptoError;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("unsupported algorithm identifier: {0}")]
    UnsupportedAlgorithm(i32),
    #[error("invalid key length: {actual}, expected: {expected}")]
    KeyLength { actual: usize, expected: usize },
    #[error("integrity check failed: {0}")]
    Integrity(IntegrityFailure),
    #[error("encryption type mismatch: key is {key}, data is {data}")]
    EtypeMismatch { key: i32, data: i32 },
    #[error("integer field does not fit an Int32")]
    MalformedInteger,
    #[error("unkeyed checksum {0:?} cannot protect integrity")]
    UnkeyedChecksum(ChecksumAlgorithm),
    #[error("DER encoding failed")]
    Encode(#[source] Asn1DerError),
    #[error("DER decoding of the plaintext failed")]
    Decode(#[source] Asn1DerError),
    #[error("cipher failure")]
    Cipher(#[source] KerberosCryptoError),
}

impl CryptoError {
    /// Returns true when the failure means the data was tampered with or the wrong key was used.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::EtypeMismatch { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityFailure {
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("ciphertext is truncated")]
    Truncated,
    #[error("malformed ciphertext")]
    Malformed,
}

impl From<KerberosCryptoError> for CryptoError {
    fn from(error: KerberosCryptoError) -> Self {
        match error {
            KerberosCryptoError::IntegrityCheck => Self::Integrity(IntegrityFailure::ChecksumMismatch),
            KerberosCryptoError::CipherLength(..) => Self::Integrity(IntegrityFailure::Truncated),
            KerberosCryptoError::CipherUnpad(_) => Self::Integrity(IntegrityFailure::Malformed),
            KerberosCryptoError::KeyLength(actual, expected) => Self::KeyLength { actual, expected },
            other => Self::Cipher(other),
        }
    }
}
