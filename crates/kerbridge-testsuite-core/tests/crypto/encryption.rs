use kerbridge_crypto::{
    decrypt, derive_subkey, encrypt, seal, unseal, CryptoError, EncryptionKey, EncryptionType, IntegrityFailure,
    KeyDerivationPurpose, KeyUsage,
};
use kerbridge_testsuite_core::{armor_key, other_armor_key};
use picky_asn1::wrapper::{IntegerAsn1, OctetStringAsn1};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(EncryptionType::Aes128CtsHmacSha196, "3892facdf64b383e0f9e8607b8de96e3")]
#[case(
    EncryptionType::Aes256CtsHmacSha196,
    "511ccb9e22d7d454919b07228c4cee55c6f8137d6c221534ed446aa2d7a4e864"
)]
fn string_to_key_vectors(#[case] etype: EncryptionType, #[case] expected: &str) {
    let key = EncryptionKey::from_password(etype, "password", "EXAMPLE.COMuser").unwrap();

    assert_eq!(key.etype(), etype);
    assert_eq!(hex::encode(key.value()), expected);
}

#[rstest]
#[case(EncryptionType::Aes128CtsHmacSha196)]
#[case(EncryptionType::Aes256CtsHmacSha196)]
fn encrypt_then_decrypt_under_same_usage(#[case] etype: EncryptionType) {
    let key = EncryptionKey::random(etype);
    let plaintext = b"pre-authentication payload";

    let ciphertext = encrypt(etype, key.value(), KeyUsage::PA_TOKEN, plaintext).unwrap();

    // confounder and truncated HMAC
    assert_eq!(ciphertext.len(), plaintext.len() + 16 + 12);
    assert_eq!(
        decrypt(etype, key.value(), KeyUsage::PA_TOKEN, &ciphertext).unwrap(),
        plaintext
    );
}

#[test]
fn encryption_is_randomized() {
    let key = armor_key();

    let first = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, b"same").unwrap();
    let second = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, b"same").unwrap();

    assert_ne!(first, second);
}

#[test]
fn decrypt_under_another_usage_fails_integrity() {
    let key = armor_key();
    let ciphertext = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, b"payload").unwrap();

    let error = decrypt(key.etype(), key.value(), KeyUsage::KEY_USAGE_FAST_ENC, &ciphertext).unwrap_err();

    assert!(matches!(
        error,
        CryptoError::Integrity(IntegrityFailure::ChecksumMismatch)
    ));
    assert!(error.is_integrity_failure());
}

#[test]
fn decrypt_with_another_key_fails_integrity() {
    let key = armor_key();
    let ciphertext = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, b"payload").unwrap();

    let error = decrypt(key.etype(), other_armor_key().value(), KeyUsage::PA_TOKEN, &ciphertext).unwrap_err();

    assert!(error.is_integrity_failure());
}

#[test]
fn flipped_ciphertext_bit_fails_integrity() {
    let key = armor_key();
    let mut ciphertext = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, b"payload").unwrap();
    ciphertext[20] ^= 0x01;

    let error = decrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, &ciphertext).unwrap_err();

    assert!(error.is_integrity_failure());
}

#[rstest]
#[case(0)]
#[case(12)]
#[case(27)]
fn truncated_ciphertext_is_reported(#[case] len: usize) {
    let key = armor_key();

    let error = decrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, &vec![0xA5; len]).unwrap_err();

    assert!(matches!(error, CryptoError::Integrity(IntegrityFailure::Truncated)));
}

#[test]
fn encrypt_rejects_wrong_key_length() {
    let error = encrypt(EncryptionType::Aes256CtsHmacSha196, &[0; 16], KeyUsage::PA_TOKEN, b"payload").unwrap_err();

    assert!(matches!(
        error,
        CryptoError::KeyLength {
            actual: 16,
            expected: 32
        }
    ));
}

#[test]
fn key_construction_checks_length() {
    assert!(EncryptionKey::new(EncryptionType::Aes128CtsHmacSha196, vec![0; 16]).is_ok());
    assert!(matches!(
        EncryptionKey::new(EncryptionType::Aes128CtsHmacSha196, vec![0; 32]),
        Err(CryptoError::KeyLength {
            actual: 32,
            expected: 16
        })
    ));
}

#[test]
fn key_debug_output_is_redacted() {
    let debug = format!("{:?}", armor_key());

    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("31"));
}

#[test]
fn key_asn1_conversion() {
    let key = armor_key();

    let asn1 = key.to_asn1();
    assert_eq!(asn1.key_type.0, IntegerAsn1(vec![18]));

    assert_eq!(EncryptionKey::try_from(&asn1).unwrap(), key);
}

#[rstest]
#[case(17, EncryptionType::Aes128CtsHmacSha196, 16)]
#[case(18, EncryptionType::Aes256CtsHmacSha196, 32)]
fn etype_from_wire_tag(#[case] tag: i32, #[case] expected: EncryptionType, #[case] key_size: usize) {
    let etype = EncryptionType::from_etype(tag).unwrap();

    assert_eq!(etype, expected);
    assert_eq!(etype.etype(), tag);
    assert_eq!(etype.key_size(), key_size);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(23)]
#[case(-1)]
fn unsupported_etype(#[case] tag: i32) {
    assert!(matches!(
        EncryptionType::from_etype(tag),
        Err(CryptoError::UnsupportedAlgorithm(value)) if value == tag
    ));
}

#[test]
fn checksum_sub_key_vector() {
    let key: Vec<u8> = (0..16).collect();

    let kc = derive_subkey(
        EncryptionType::Aes128CtsHmacSha196,
        &key,
        KeyUsage::PA_TOKEN,
        KeyDerivationPurpose::Checksum,
    )
    .unwrap();

    assert_eq!(hex::encode(kc.as_slice()), "12374019ceb0a9fc0ce6fb3b34bd2491");
}

#[test]
fn sub_keys_differ_per_purpose() {
    let key = armor_key();

    let derive = |purpose| derive_subkey(key.etype(), key.value(), KeyUsage::PA_TOKEN, purpose).unwrap();

    let kc = derive(KeyDerivationPurpose::Checksum);
    let ke = derive(KeyDerivationPurpose::Encryption);
    let ki = derive(KeyDerivationPurpose::Integrity);

    assert_ne!(kc, ke);
    assert_ne!(ke, ki);
    assert_ne!(kc, ki);
}

proptest! {
    #[test]
    fn sub_keys_differ_per_usage(a in 0..1024i32, b in 0..1024i32) {
        prop_assume!(a != b);

        let key = armor_key();

        let first = derive_subkey(key.etype(), key.value(), KeyUsage::new(a), KeyDerivationPurpose::Encryption).unwrap();
        let second = derive_subkey(key.etype(), key.value(), KeyUsage::new(b), KeyDerivationPurpose::Encryption).unwrap();

        prop_assert_ne!(first, second);
    }
}

#[test]
fn seal_then_unseal() {
    let value = OctetStringAsn1::from(b"sealed payload".to_vec());

    let sealed = seal(&value, &armor_key(), KeyUsage::PA_TOKEN).unwrap();
    assert_eq!(sealed.etype.0, IntegerAsn1(vec![18]));

    let unsealed: OctetStringAsn1 = unseal(&sealed, &armor_key(), KeyUsage::PA_TOKEN).unwrap();
    assert_eq!(unsealed, value);
}

#[test]
fn unseal_rejects_etype_mismatch() {
    let aes128 = EncryptionKey::random(EncryptionType::Aes128CtsHmacSha196);
    let sealed = seal(&OctetStringAsn1::from(vec![1, 2, 3]), &aes128, KeyUsage::PA_TOKEN).unwrap();

    let error = unseal::<OctetStringAsn1>(&sealed, &armor_key(), KeyUsage::PA_TOKEN).unwrap_err();

    assert!(matches!(error, CryptoError::EtypeMismatch { key: 18, data: 17 }));
    assert!(error.is_integrity_failure());
}

#[test]
fn unseal_rejects_unknown_etype() {
    let mut sealed = seal(&OctetStringAsn1::from(vec![1, 2, 3]), &armor_key(), KeyUsage::PA_TOKEN).unwrap();
    sealed.etype.0 = IntegerAsn1(vec![23]);

    let error = unseal::<OctetStringAsn1>(&sealed, &armor_key(), KeyUsage::PA_TOKEN).unwrap_err();

    assert!(matches!(error, CryptoError::UnsupportedAlgorithm(23)));
}

#[test]
fn unseal_reports_undecodable_plaintext() {
    let key = armor_key();

    // OCTET STRING header announcing five bytes, followed by only one.
    let truncated = encrypt(key.etype(), key.value(), KeyUsage::PA_TOKEN, &[0x04, 0x05, 0x01]).unwrap();

    let mut sealed = seal(&OctetStringAsn1::from(vec![1, 2, 3]), &key, KeyUsage::PA_TOKEN).unwrap();
    sealed.cipher.0 = OctetStringAsn1::from(truncated);

    let error = unseal::<OctetStringAsn1>(&sealed, &key, KeyUsage::PA_TOKEN).unwrap_err();

    assert!(matches!(error, CryptoError::Decode(_)));
    assert!(!error.is_integrity_failure());
}
