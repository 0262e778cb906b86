use picky_krb::constants::cksum_types::{CRC32, HMAC_SHA1_96_AES128, HMAC_SHA1_96_AES256};
use picky_krb::crypto::ChecksumSuite;
use subtle::ConstantTimeEq as _;

use crate::{CryptoError, CryptoResult, EncryptionType, IntegrityFailure, KeyUsage};

/// Checksum families, selected by the explicit `cksumtype` carried with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// Legacy unkeyed CRC-32. Not collision-proof, never use it for integrity.
    Crc32,
    HmacSha196Aes128,
    HmacSha196Aes256,
}

impl ChecksumAlgorithm {
    pub fn from_cksum_type(cksum_type: i32) -> CryptoResult<Self> {
        match usize::try_from(cksum_type) {
            Ok(CRC32) => Ok(Self::Crc32),
            Ok(HMAC_SHA1_96_AES128) => Ok(Self::HmacSha196Aes128),
            Ok(HMAC_SHA1_96_AES256) => Ok(Self::HmacSha196Aes256),
            _ => Err(CryptoError::UnsupportedAlgorithm(cksum_type)),
        }
    }

    pub fn cksum_type(self) -> i32 {
        match self {
            Self::Crc32 => 1,
            Self::HmacSha196Aes128 => 15,
            Self::HmacSha196Aes256 => 16,
        }
    }

    pub fn engine(self) -> &'static dyn ChecksumEngine {
        match self {
            Self::Crc32 => &Crc32Checksum,
            Self::HmacSha196Aes128 => &HmacSha196Aes128Checksum,
            Self::HmacSha196Aes256 => &HmacSha196Aes256Checksum,
        }
    }
}

/// Uniform checksum capability.
///
/// Unkeyed engines accept and ignore the key and usage so that callers stay agnostic of the family.
pub trait ChecksumEngine: Send + Sync {
    fn algorithm(&self) -> ChecksumAlgorithm;

    fn is_keyed(&self) -> bool;

    /// Whether the checksum resists deliberate collisions.
    fn is_collision_proof(&self) -> bool;

    fn checksum_size(&self) -> usize;

    fn compute(&self, data: &[u8], key: &[u8], usage: KeyUsage) -> CryptoResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Checksum;

impl ChecksumEngine for Crc32Checksum {
    fn algorithm(&self) -> ChecksumAlgorithm {
        ChecksumAlgorithm::Crc32
    }

    fn is_keyed(&self) -> bool {
        false
    }

    fn is_collision_proof(&self) -> bool {
        false
    }

    fn checksum_size(&self) -> usize {
        4
    }

    fn compute(&self, data: &[u8], _key: &[u8], _usage: KeyUsage) -> CryptoResult<Vec<u8>> {
        Ok(crc32fast::hash(data).to_be_bytes().to_vec())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha196Aes128Checksum;

impl ChecksumEngine for HmacSha196Aes128Checksum {
    fn algorithm(&self) -> ChecksumAlgorithm {
        ChecksumAlgorithm::HmacSha196Aes128
    }

    fn is_keyed(&self) -> bool {
        true
    }

    fn is_collision_proof(&self) -> bool {
        true
    }

    fn checksum_size(&self) -> usize {
        12
    }

    fn compute(&self, data: &[u8], key: &[u8], usage: KeyUsage) -> CryptoResult<Vec<u8>> {
        hmac_sha1_96(EncryptionType::Aes128CtsHmacSha196, ChecksumSuite::HmacSha196Aes128, data, key, usage)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha196Aes256Checksum;

impl ChecksumEngine for HmacSha196Aes256Checksum {
    fn algorithm(&self) -> ChecksumAlgorithm {
        ChecksumAlgorithm::HmacSha196Aes256
    }

    fn is_keyed(&self) -> bool {
        true
    }

    fn is_collision_proof(&self) -> bool {
        true
    }

    fn checksum_size(&self) -> usize {
        12
    }

    fn compute(&self, data: &[u8], key: &[u8], usage: KeyUsage) -> CryptoResult<Vec<u8>> {
        hmac_sha1_96(EncryptionType::Aes256CtsHmacSha196, ChecksumSuite::HmacSha196Aes256, data, key, usage)
    }
}

// HMAC-SHA1 truncated to 96 bits under Kc = DK(key, usage | 0x99)
fn hmac_sha1_96(
    etype: EncryptionType,
    suite: ChecksumSuite,
    data: &[u8],
    key: &[u8],
    usage: KeyUsage,
) -> CryptoResult<Vec<u8>> {
    etype.check_key_length(key)?;

    let checksum = suite.hasher().checksum(key, usage.value(), data)?;

    Ok(checksum)
}

/// Computes the checksum of `data` with the given algorithm.
pub fn compute(algorithm: ChecksumAlgorithm, data: &[u8], key: &[u8], usage: KeyUsage) -> CryptoResult<Vec<u8>> {
    algorithm.engine().compute(data, key, usage)
}

/// Recomputes the checksum and compares it in constant time.
pub fn verify(
    algorithm: ChecksumAlgorithm,
    data: &[u8],
    key: &[u8],
    usage: KeyUsage,
    expected: &[u8],
) -> CryptoResult<()> {
    let computed = compute(algorithm, data, key, usage)?;

    if bool::from(computed.as_slice().ct_eq(expected)) {
        Ok(())
    } else {
        Err(CryptoError::Integrity(IntegrityFailure::ChecksumMismatch))
    }
}

/// Same as [`verify`], but refuses unkeyed algorithms.
pub fn verify_for_integrity(
    algorithm: ChecksumAlgorithm,
    data: &[u8],
    key: &[u8],
    usage: KeyUsage,
    expected: &[u8],
) -> CryptoResult<()> {
    if !algorithm.engine().is_keyed() {
        return Err(CryptoError::UnkeyedChecksum(algorithm));
    }

    verify(algorithm, data, key, usage, expected)
}
