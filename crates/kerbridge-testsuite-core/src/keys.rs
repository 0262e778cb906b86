use std::path::PathBuf;

use kerbridge_crypto::{EncryptionKey, EncryptionType};

pub const REALM: &str = "EXAMPLE.COM";

pub const ISSUER: &str = "idp.example.com";

pub const UNTRUSTED_ISSUER: &str = "rogue.example.net";

pub const RSA_PRIVATE_KEY: &str = include_str!("../test_data/keys/rsa_private.pem");

pub const RSA_PUBLIC_KEY: &str = include_str!("../test_data/keys/rsa_public.pem");

/// Public key that does not match [`RSA_PRIVATE_KEY`]
pub const OTHER_RSA_PUBLIC_KEY: &str = include_str!("../test_data/keys/rsa_public_other.pem");

/// P-256, PKCS#8
pub const EC_PRIVATE_KEY: &str = include_str!("../test_data/keys/ec_private.pem");

pub const EC_PUBLIC_KEY: &str = include_str!("../test_data/keys/ec_public.pem");

pub fn key_path(file_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("keys")
        .join(file_name)
}

pub fn armor_key() -> EncryptionKey {
    EncryptionKey::new(EncryptionType::Aes256CtsHmacSha196, (0u8..32).collect()).expect("AES256 key size")
}

pub fn other_armor_key() -> EncryptionKey {
    EncryptionKey::new(EncryptionType::Aes256CtsHmacSha196, (32u8..64).collect()).expect("AES256 key size")
}
