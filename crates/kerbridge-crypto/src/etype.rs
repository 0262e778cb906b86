use core::fmt;

use picky_krb::constants::etypes::{AES128_CTS_HMAC_SHA1_96, AES256_CTS_HMAC_SHA1_96};
use picky_krb::crypto::aes::{derive_key, AesSize, AES128_KEY_SIZE, AES256_KEY_SIZE};
use picky_krb::crypto::CipherSuite;
use zeroize::Zeroizing;

use crate::{ChecksumAlgorithm, CryptoError, CryptoResult, KeyDerivationPurpose, KeyUsage};

/// Encryption types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionType {
    Aes128CtsHmacSha196,
    Aes256CtsHmacSha196,
}

impl EncryptionType {
    pub fn from_etype(etype: i32) -> CryptoResult<Self> {
        match usize::try_from(etype) {
            Ok(AES128_CTS_HMAC_SHA1_96) => Ok(Self::Aes128CtsHmacSha196),
            Ok(AES256_CTS_HMAC_SHA1_96) => Ok(Self::Aes256CtsHmacSha196),
            _ => Err(CryptoError::UnsupportedAlgorithm(etype)),
        }
    }

    pub fn etype(self) -> i32 {
        match self {
            Self::Aes128CtsHmacSha196 => 17,
            Self::Aes256CtsHmacSha196 => 18,
        }
    }

    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128CtsHmacSha196 => AES128_KEY_SIZE,
            Self::Aes256CtsHmacSha196 => AES256_KEY_SIZE,
        }
    }

    /// Checksum family associated to this encryption type.
    pub fn checksum_algorithm(self) -> ChecksumAlgorithm {
        match self {
            Self::Aes128CtsHmacSha196 => ChecksumAlgorithm::HmacSha196Aes128,
            Self::Aes256CtsHmacSha196 => ChecksumAlgorithm::HmacSha196Aes256,
        }
    }

    pub(crate) fn aes_size(self) -> AesSize {
        match self {
            Self::Aes128CtsHmacSha196 => AesSize::Aes128,
            Self::Aes256CtsHmacSha196 => AesSize::Aes256,
        }
    }

    fn suite(self) -> CipherSuite {
        match self {
            Self::Aes128CtsHmacSha196 => CipherSuite::Aes128CtsHmacSha196,
            Self::Aes256CtsHmacSha196 => CipherSuite::Aes256CtsHmacSha196,
        }
    }

    pub(crate) fn check_key_length(self, key: &[u8]) -> CryptoResult<()> {
        if key.len() != self.key_size() {
            return Err(CryptoError::KeyLength {
                actual: key.len(),
                expected: self.key_size(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128CtsHmacSha196 => write!(f, "aes128-cts-hmac-sha1-96"),
            Self::Aes256CtsHmacSha196 => write!(f, "aes256-cts-hmac-sha1-96"),
        }
    }
}

/// Encrypts `plaintext` with a fresh confounder under the usage-scoped Ke/Ki sub-keys.
pub fn encrypt(etype: EncryptionType, key: &[u8], usage: KeyUsage, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    etype.check_key_length(key)?;

    let ciphertext = etype.suite().cipher().encrypt(key, usage.value(), plaintext)?;

    Ok(ciphertext)
}

/// Decrypts and authenticates a ciphertext produced by [`encrypt`] with the same key and usage.
pub fn decrypt(etype: EncryptionType, key: &[u8], usage: KeyUsage, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    etype.check_key_length(key)?;

    let plaintext = etype.suite().cipher().decrypt(key, usage.value(), ciphertext)?;

    Ok(plaintext)
}

/// Derives the sub-key used for `purpose` under `usage`.
pub fn derive_subkey(
    etype: EncryptionType,
    key: &[u8],
    usage: KeyUsage,
    purpose: KeyDerivationPurpose,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    etype.check_key_length(key)?;

    let subkey = derive_key(key, &usage.derivation_constant(purpose), &etype.aes_size())?;

    Ok(Zeroizing::new(subkey))
}

/// String-to-key: PBKDF2-HMAC-SHA1 over the password and salt, then DK with "kerberos".
pub fn string_to_key(etype: EncryptionType, password: &[u8], salt: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let key = etype.suite().cipher().generate_key_from_password(password, salt)?;

    Ok(Zeroizing::new(key))
}
