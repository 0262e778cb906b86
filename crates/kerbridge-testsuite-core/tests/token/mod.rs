mod asn1;

use std::sync::Arc;

use kerbridge_crypto::{EncryptionKey, EncryptionType};
use kerbridge_preauth::token::{PaTokenRequest, TokenError, TokenFormat, TokenPreauth, TokenProviderRegistry};
use kerbridge_preauth::{
    KdcConfig, KdcRequestContext, PaDataType, PreauthDataEntry, PreauthErrorExt as _, PreauthErrorKind,
    PreauthPlugin as _,
};
use kerbridge_testsuite_core::{
    armor_key, armored_context, as_req, mint_jwt, mint_jwt_with, now, other_armor_key, tgs_req,
    tgs_req_without_sname, token_config, token_entry, token_spec, EC_PRIVATE_KEY, ISSUER, UNTRUSTED_ISSUER,
};
use picky_asn1::wrapper::{ExplicitContextTag0, IntegerAsn1};
use picky_krb::constants::error_codes::{
    KDC_ERROR_CLIENT_NOT_TRUSTED, KDC_ERR_POLICY, KDC_ERR_PREAUTH_FAILED, KRB_AP_ERR_BAD_INTEGRITY,
};
use proptest::prelude::*;
use rstest::rstest;

const SERVICE_A: &[&str] = &["service-a", "host.example.com"];
const SERVICE_A_NAME: &str = "service-a/host.example.com@EXAMPLE.COM";
const SERVICE_B: &[&str] = &["service-b", "host.example.com"];

fn mechanism() -> TokenPreauth {
    TokenPreauth::new(Arc::new(TokenProviderRegistry::with_defaults()))
}

fn assert_untouched(ctx: &KdcRequestContext) {
    assert!(ctx.token().is_none());
    assert!(ctx.client_key().is_none());
    assert!(ctx.server_principal().is_none());
    assert!(!ctx.is_preauth_done());
}

#[test]
fn as_request_with_valid_token_is_accepted() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    assert!(mechanism().verify(&mut ctx, &entry).unwrap());

    let token = ctx.token().unwrap();
    assert_eq!(token.issuer(), ISSUER);
    assert_eq!(token.subject(), "alice@EXAMPLE.COM");
    assert_eq!(ctx.client_key(), Some(&armor_key()));
    assert_eq!(ctx.authenticated_by(), [TokenPreauth::NAME]);
    assert!(ctx.server_principal().is_none());
    assert!(ctx.warnings().is_empty());
}

#[test]
fn tgs_request_for_token_audience_is_accepted() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[SERVICE_A_NAME])), &armor_key());
    let mut ctx = armored_context(token_config(), tgs_req(SERVICE_A, &[]));

    assert!(mechanism().verify(&mut ctx, &entry).unwrap());

    let principal = ctx.server_principal().unwrap();
    assert_eq!(principal.name(), SERVICE_A_NAME);
    assert_eq!(principal.realm(), Some("EXAMPLE.COM"));
    assert!(ctx.token().unwrap().has_audience(SERVICE_A_NAME));
}

#[test]
fn tgs_request_outside_token_audience_is_rejected() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[SERVICE_A_NAME])), &armor_key());
    let mut ctx = armored_context(token_config(), tgs_req(SERVICE_B, &[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(
        error.kind(),
        PreauthErrorKind::AudienceMismatch { server_principal } if server_principal == "service-b/host.example.com@EXAMPLE.COM"
    ));
    assert_eq!(error.krb_error_code(), KDC_ERR_PREAUTH_FAILED);
    assert_untouched(&ctx);
}

#[test]
fn audience_is_matched_exactly() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&["service-a/host.example.com"])), &armor_key());
    let mut ctx = armored_context(token_config(), tgs_req(SERVICE_A, &[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::AudienceMismatch { .. }));
}

#[test]
fn tgs_request_without_server_principal_is_rejected() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[SERVICE_A_NAME])), &armor_key());
    let mut ctx = armored_context(token_config(), tgs_req_without_sname(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Decode));
    assert_eq!(error.context, "token preauth audience check");
    assert_untouched(&ctx);
}

proptest! {
    #[test]
    fn disabled_mechanism_denies_any_payload(payload in any::<Vec<u8>>(), pa_type in any::<i32>()) {
        let config = KdcConfig {
            allow_token_preauth: false,
            ..token_config()
        };
        let mut ctx = armored_context(config, as_req(&[]));
        let entry = PreauthDataEntry::new(PaDataType::new(pa_type), payload);

        let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

        prop_assert!(matches!(error.kind(), PreauthErrorKind::PolicyDenied));
        prop_assert_eq!(error.krb_error_code(), KDC_ERR_POLICY);
        prop_assert!(!ctx.is_preauth_done());
    }
}

#[test]
fn disabled_mechanism_denies_valid_token() {
    let config = KdcConfig {
        allow_token_preauth: false,
        ..token_config()
    };
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = armored_context(config, as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::PolicyDenied));
    assert_eq!(error.client_message(), "pre-authentication mechanism unavailable");
    assert_untouched(&ctx);
}

#[test]
fn untrusted_issuer_is_rejected_before_key_lookup() {
    let entry = token_entry(UNTRUSTED_ISSUER, mint_jwt(&token_spec(&[])), &armor_key());

    let mut config = token_config();
    config
        .verify_key_files
        .insert(UNTRUSTED_ISSUER.to_owned(), "/nonexistent/rogue.pem".into());

    let mut ctx = armored_context(config, as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(
        error.kind(),
        PreauthErrorKind::UntrustedIssuer { issuer } if issuer == UNTRUSTED_ISSUER
    ));
    assert_eq!(error.krb_error_code(), KDC_ERROR_CLIENT_NOT_TRUSTED);
    assert_eq!(error.client_message(), "pre-authentication failed");
    assert!(ctx.warnings().is_empty());
    assert_untouched(&ctx);
}

#[test]
fn issuer_comparison_is_exact() {
    let entry = token_entry("IDP.example.com", mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::UntrustedIssuer { .. }));
}

#[test]
fn envelope_sealed_with_another_armor_key_fails_integrity() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &other_armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Integrity(e) if e.is_integrity_failure()));
    assert_eq!(error.krb_error_code(), KRB_AP_ERR_BAD_INTEGRITY);
    assert_eq!(error.context, "token preauth decryption");
    assert_untouched(&ctx);
}

#[test]
fn envelope_with_unsupported_etype_is_reported() {
    let aes128 = EncryptionKey::random(EncryptionType::Aes128CtsHmacSha196);
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &aes128);
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    // an AES128 envelope does not match the AES256 armor key
    assert!(matches!(error.kind(), PreauthErrorKind::Integrity(_)));
    assert_untouched(&ctx);
}

#[test]
fn missing_armor_key_is_rejected() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = KdcRequestContext::for_as(Arc::new(token_config()), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::MissingArmorKey));
    assert_untouched(&ctx);
}

#[rstest]
#[case(PaDataType::PA_ENC_TIMESTAMP)]
#[case(PaDataType::TOKEN_CHALLENGE)]
#[case(PaDataType::new(4242))]
fn foreign_entry_type_is_declined(#[case] pa_type: PaDataType) {
    let sealed = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let entry = PreauthDataEntry::new(pa_type, sealed.data().to_vec());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    assert!(!mechanism().verify(&mut ctx, &entry).unwrap());
    assert_untouched(&ctx);
}

#[test]
fn malformed_envelope_is_a_decode_error() {
    let entry = PreauthDataEntry::new(PaDataType::TOKEN_REQUEST, vec![0x30, 0x03, 0x02, 0x01]);
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Decode));
    assert!(error.has_source());
}

#[test]
fn unknown_token_format_is_a_decode_error() {
    let mut request = PaTokenRequest::new(ISSUER, TokenFormat::Jwt, mint_jwt(&token_spec(&[]))).unwrap();
    request.token.0.token_format = ExplicitContextTag0::from(IntegerAsn1(vec![7]));
    let entry = request.seal(&armor_key()).unwrap();

    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::Decode));
    assert_untouched(&ctx);
}

#[test]
fn token_signed_by_unknown_key_is_rejected() {
    let entry = token_entry(ISSUER, mint_jwt_with(&token_spec(&[]), EC_PRIVATE_KEY), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(
        error.kind(),
        PreauthErrorKind::DecodeFailure(TokenError::Rejected(_))
    ));
    assert_eq!(error.krb_error_code(), KDC_ERR_PREAUTH_FAILED);
    assert_untouched(&ctx);
}

#[test]
fn expired_token_is_rejected() {
    let spec = token_spec(&[])
        .not_before(now() - 7200)
        .issued_at(now() - 7200)
        .expires_at(now() - 3600);
    let entry = token_entry(ISSUER, mint_jwt(&spec), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(
        error.kind(),
        PreauthErrorKind::DecodeFailure(TokenError::Rejected(_))
    ));
    assert_untouched(&ctx);
}

#[test]
fn garbage_token_is_rejected() {
    let entry = token_entry(ISSUER, b"not.a.jwt".to_vec(), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(error.kind(), PreauthErrorKind::DecodeFailure(_)));
    assert_untouched(&ctx);
}

#[test]
fn identical_entries_are_processed_identically() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[SERVICE_A_NAME])), &armor_key());

    let mut first = armored_context(token_config(), tgs_req(SERVICE_A, &[]));
    let mut second = armored_context(token_config(), tgs_req(SERVICE_A, &[]));

    assert!(mechanism().verify(&mut first, &entry).unwrap());
    assert!(mechanism().verify(&mut second, &entry).unwrap());

    assert_eq!(first.token(), second.token());
    assert_eq!(first.server_principal(), second.server_principal());
    assert_eq!(first.client_key(), second.client_key());
}

#[test]
fn replaying_entry_on_same_context_is_a_no_op() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));
    let mechanism = mechanism();

    assert!(mechanism.verify(&mut ctx, &entry).unwrap());
    let token = ctx.token().cloned();

    assert!(mechanism.verify(&mut ctx, &entry).unwrap());
    assert_eq!(ctx.token().cloned(), token);
    assert_eq!(ctx.authenticated_by(), [TokenPreauth::NAME]);
}

#[test]
fn conflicting_client_key_leaves_context_unchanged() {
    let entry = token_entry(ISSUER, mint_jwt(&token_spec(&[])), &armor_key());
    let mut ctx = armored_context(token_config(), as_req(&[]));
    ctx.set_client_key(other_armor_key()).unwrap();

    let error = mechanism().verify(&mut ctx, &entry).unwrap_err();

    assert!(matches!(
        error.kind(),
        PreauthErrorKind::ContextAnomaly { field: "client key" }
    ));
    assert_eq!(error.context, "token preauth commit");
    assert_eq!(ctx.client_key(), Some(&other_armor_key()));
    assert!(ctx.token().is_none());
    assert!(!ctx.is_preauth_done());
}

#[test]
fn ec_signed_token_is_accepted() {
    let mut config = token_config();
    config
        .verify_key_files
        .insert(ISSUER.to_owned(), kerbridge_testsuite_core::key_path("ec_public.pem"));

    let entry = token_entry(ISSUER, mint_jwt_with(&token_spec(&[]), EC_PRIVATE_KEY), &armor_key());
    let mut ctx = armored_context(config, as_req(&[]));

    assert!(mechanism().verify(&mut ctx, &entry).unwrap());
    assert_eq!(ctx.token().unwrap().issuer(), ISSUER);
}

#[test]
fn token_challenge_is_advertised_when_allowed() {
    let ctx = armored_context(token_config(), as_req(&[]));

    let padata = mechanism().provide_padata(&ctx);

    assert_eq!(padata, [PreauthDataEntry::new(PaDataType::TOKEN_CHALLENGE, Vec::new())]);
}

#[test]
fn nothing_is_advertised_when_disabled() {
    let config = KdcConfig {
        allow_token_preauth: false,
        ..token_config()
    };
    let ctx = armored_context(config, as_req(&[]));

    assert!(mechanism().provide_padata(&ctx).is_empty());
}

#[test]
fn mechanism_metadata() {
    let mechanism = mechanism();
    let meta = mechanism.meta();

    assert_eq!(meta.name(), "token");
    assert_eq!(meta.pa_types(), [PaDataType::TOKEN_REQUEST, PaDataType::TOKEN_CHALLENGE]);
    assert!(!meta.is_required());
}
