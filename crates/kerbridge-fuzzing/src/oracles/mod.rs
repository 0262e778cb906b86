//! Oracles.
//!
//! Oracles take a test case and determine whether we have a bug. For example,
//! one of the simplest oracles is to take a DER-encoded message as our input test case,
//! decode it, and (implicitly) check that no assertions failed or panics happened.
//! A more involved oracle drives the whole token pre-authentication mechanism with
//! attacker-controlled input and checks that a rejected entry never leaves a trace
//! in the request context.
//!
//! When an oracle finds a bug, it should report it to the fuzzing engine by
//! panicking.

use std::sync::Arc;

use kerbridge_crypto::{EncryptionKey, EncryptionType, KeyUsage};
use kerbridge_preauth::token::{PaTokenRequest, TokenPreauth, TokenProviderRegistry};
use kerbridge_preauth::{KdcConfig, KdcRequest, KdcRequestContext, PaDataType, PreauthDataEntry, PreauthPlugin as _};
use picky_krb::data_types::EncryptedData;

use crate::generators::TokenPreauthInput;

const ARMOR_KEY: [u8; 32] = [0x42; 32];

fn armor_key() -> EncryptionKey {
    EncryptionKey::new(EncryptionType::Aes256CtsHmacSha196, ARMOR_KEY.to_vec()).expect("armor key has the AES256 size")
}

pub fn kdc_request_decode(data: &[u8]) {
    if let Ok(request) = KdcRequest::decode(data) {
        let _ = request.preauth_entries();
        let _ = request.realm();

        if let KdcRequest::Tgs(tgs_request) = &request {
            let _ = tgs_request.server_principal();
        }
    }
}

pub fn pa_token_request_decode(data: &[u8]) {
    if let Ok(request) = PaTokenRequest::from_der(data) {
        let _ = request.token_vendor();
        let _ = request.token_format();

        let encoded = request.to_der().expect("decoded request re-encodes");
        let decoded = PaTokenRequest::from_der(&encoded).expect("re-encoded request decodes");

        assert_eq!(request, decoded);
    }
}

pub fn unseal_pa_token(data: &[u8]) {
    if let Ok(encrypted) = picky_asn1_der::from_bytes::<EncryptedData>(data) {
        let _ = kerbridge_crypto::unseal::<PaTokenRequest>(&encrypted, &armor_key(), KeyUsage::PA_TOKEN);
    }
}

pub fn token_preauth_verify(input: TokenPreauthInput<'_>) {
    let Ok(request) = KdcRequest::decode(input.request) else {
        return;
    };

    let config = KdcConfig {
        allow_token_preauth: input.allow_token_preauth,
        trusted_issuers: vec!["fuzz-issuer".to_owned()],
        ..KdcConfig::default()
    };

    let mut ctx = KdcRequestContext::new(Arc::new(config), request);

    if input.with_armor_key {
        ctx.set_armor_key(armor_key()).expect("first armor key write");
    }

    let mechanism = TokenPreauth::new(Arc::new(TokenProviderRegistry::with_defaults()));
    let entry = PreauthDataEntry::new(PaDataType::new(input.pa_type), input.payload.to_vec());

    match mechanism.verify(&mut ctx, &entry) {
        Ok(true) => assert!(ctx.token().is_some()),
        Ok(false) | Err(_) => {
            assert!(ctx.token().is_none());
            assert!(ctx.client_key().is_none());
            assert!(ctx.server_principal().is_none());
            assert!(!ctx.is_preauth_done());
        }
    }
}
