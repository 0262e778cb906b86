//! Fixtures shared by the integration tests: keys, KDC requests and sealed pre-authentication entries.

mod keys;
mod requests;
mod tokens;

pub use self::keys::{
    armor_key, key_path, other_armor_key, EC_PRIVATE_KEY, EC_PUBLIC_KEY, ISSUER, OTHER_RSA_PUBLIC_KEY,
    REALM, RSA_PRIVATE_KEY, RSA_PUBLIC_KEY, UNTRUSTED_ISSUER,
};
pub use self::requests::{as_req, principal, tgs_req, tgs_req_without_sname};
pub use self::tokens::{
    armored_context, enc_timestamp_entry, mint_jwt, mint_jwt_with, now, token_config, token_entry, token_spec,
};
