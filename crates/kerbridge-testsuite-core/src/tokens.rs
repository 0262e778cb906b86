use std::sync::Arc;

use kerbridge_crypto::{seal, EncryptionKey, KeyUsage};
use kerbridge_preauth::token::{AuthTokenSpec, PaTokenRequest, TokenEncoder as _, TokenFormat, JwtTokenEncoder};
use kerbridge_preauth::{KdcConfig, KdcRequest, KdcRequestContext, PaDataType, PreauthDataEntry};
use picky_asn1::date::Date;
use picky_asn1::wrapper::{ExplicitContextTag0, Optional};
use picky_krb::data_types::{KerberosTime, PaEncTsEnc};
use time::OffsetDateTime;

use crate::{armor_key, key_path, ISSUER, RSA_PRIVATE_KEY};

pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Claims of a token issued by [`ISSUER`] to alice, valid for one hour.
pub fn token_spec(audiences: &[&str]) -> AuthTokenSpec {
    let now = now();

    audiences.iter().fold(
        AuthTokenSpec::new(ISSUER, "alice@EXAMPLE.COM")
            .issued_at(now)
            .not_before(now)
            .expires_at(now + 3600),
        |spec, audience| spec.audience(*audience),
    )
}

pub fn mint_jwt_with(spec: &AuthTokenSpec, private_key_pem: &str) -> Vec<u8> {
    let mut encoder = JwtTokenEncoder::new();
    encoder.set_sign_key(private_key_pem.as_bytes()).expect("signing key");
    encoder.encode(spec).expect("token encoding")
}

/// Signs with [`RSA_PRIVATE_KEY`].
pub fn mint_jwt(spec: &AuthTokenSpec) -> Vec<u8> {
    mint_jwt_with(spec, RSA_PRIVATE_KEY)
}

/// `TOKEN_REQUEST` entry carrying `token`, sealed under `armor_key`.
pub fn token_entry(issuer: &str, token: Vec<u8>, armor_key: &EncryptionKey) -> PreauthDataEntry {
    PaTokenRequest::new(issuer, TokenFormat::Jwt, token)
        .expect("token request")
        .seal(armor_key)
        .expect("sealed token request")
}

/// Trusts [`ISSUER`] and maps it to the matching RSA public key.
pub fn token_config() -> KdcConfig {
    let mut config = KdcConfig {
        trusted_issuers: vec![ISSUER.to_owned()],
        ..KdcConfig::default()
    };

    config
        .verify_key_files
        .insert(ISSUER.to_owned(), key_path("rsa_public.pem"));

    config
}

/// Request context whose armor key is [`armor_key`].
pub fn armored_context(config: KdcConfig, request: impl Into<KdcRequest>) -> KdcRequestContext {
    let mut ctx = KdcRequestContext::new(Arc::new(config), request.into());
    ctx.set_armor_key(armor_key()).expect("first armor key");
    ctx
}

/// `PA_ENC_TIMESTAMP` entry for the given time, sealed under `client_key`.
pub fn enc_timestamp_entry(client_key: &EncryptionKey, at: OffsetDateTime) -> PreauthDataEntry {
    let date = Date::new(
        u16::try_from(at.year()).expect("four digit year"),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
    )
    .expect("valid date");

    let enc_ts = PaEncTsEnc {
        patimestamp: ExplicitContextTag0::from(KerberosTime::from(date)),
        pausec: Optional::from(None),
    };

    let encrypted = seal(&enc_ts, client_key, KeyUsage::AS_REQ_PA_ENC_TIMESTAMP).expect("sealed timestamp");

    PreauthDataEntry::new(
        PaDataType::PA_ENC_TIMESTAMP,
        picky_asn1_der::to_vec(&encrypted).expect("EncryptedData encoding"),
    )
}
