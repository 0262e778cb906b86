use kerbridge_crypto::{unseal, KeyUsage};
use kerbridge_preauth::token::{PaTokenRequest, TokenFormat};
use kerbridge_preauth::{PaDataType, PreauthErrorKind};
use kerbridge_testsuite_core::{armor_key, ISSUER};
use picky_krb::data_types::EncryptedData;

const MINIMAL_REQUEST: &[u8] = include_bytes!("../../test_data/fuzz_regression/pa_token_request_decode/minimal_request");

#[test]
fn decode_minimal_request() {
    let request = PaTokenRequest::from_der(MINIMAL_REQUEST).unwrap();

    assert_eq!(request.token_vendor(), "idp");
    assert_eq!(request.token_format(), Some(TokenFormat::Jwt.value()));
    assert_eq!(request.token_value(), b"abc");
    assert!(request.token_info.0.flags.0.is_none());

    assert_eq!(request.to_der().unwrap(), MINIMAL_REQUEST);
}

#[test]
fn build_request() {
    let request = PaTokenRequest::new("idp", TokenFormat::Jwt, b"abc".to_vec()).unwrap();

    assert_eq!(request.to_der().unwrap(), MINIMAL_REQUEST);
}

#[test]
fn token_vendor_is_a_general_string() {
    let der = PaTokenRequest::new("idp", TokenFormat::Jwt, Vec::new()).unwrap().to_der().unwrap();

    // [1] { GeneralString "idp" }
    let vendor = [0xa1, 0x05, 0x1b, 0x03, b'i', b'd', b'p'];
    assert!(der.windows(vendor.len()).any(|window| window == vendor));
}

#[test]
fn issuer_must_be_ia5() {
    let error = PaTokenRequest::new("idp.exämple.com", TokenFormat::Jwt, Vec::new()).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Reason(_)));
}

#[test]
fn truncated_request_is_a_decode_error() {
    let error = PaTokenRequest::from_der(&MINIMAL_REQUEST[..MINIMAL_REQUEST.len() - 1]).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Decode));
}

#[test]
fn sealed_request_is_a_token_request_entry() {
    let request = PaTokenRequest::new(ISSUER, TokenFormat::Jwt, b"header.payload.signature".to_vec()).unwrap();

    let entry = request.seal(&armor_key()).unwrap();
    assert_eq!(entry.pa_type(), PaDataType::TOKEN_REQUEST);

    let encrypted: EncryptedData = picky_asn1_der::from_bytes(entry.data()).unwrap();
    let unsealed: PaTokenRequest = unseal(&encrypted, &armor_key(), KeyUsage::PA_TOKEN).unwrap();

    assert_eq!(unsealed, request);
    assert_eq!(unsealed.token_vendor(), ISSUER);
}

#[test]
fn sealed_request_does_not_open_under_another_usage() {
    let request = PaTokenRequest::new(ISSUER, TokenFormat::Jwt, b"token".to_vec()).unwrap();
    let entry = request.seal(&armor_key()).unwrap();

    let encrypted: EncryptedData = picky_asn1_der::from_bytes(entry.data()).unwrap();
    let error = unseal::<PaTokenRequest>(&encrypted, &armor_key(), KeyUsage::KEY_USAGE_FAST_ENC).unwrap_err();

    assert!(error.is_integrity_failure());
}
