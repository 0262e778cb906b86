//! Test case generators.
//!
//! Test case generators take raw, unstructured input from a fuzzer
//! (e.g. libFuzzer) and translate that into a structured test case (e.g. a
//! KDC request carrying a pre-authentication entry).
//!
//! These are generally implementations of the `Arbitrary` trait, or some
//! wrapper over an external tool, such that the wrapper implements the
//! `Arbitrary` trait for the wrapped external tool.

#[derive(Arbitrary, Debug)]
pub struct TokenPreauthInput<'a> {
    /// Candidate AS-REQ or TGS-REQ
    pub request: &'a [u8],
    pub pa_type: i32,
    pub payload: &'a [u8],
    pub allow_token_preauth: bool,
    pub with_armor_key: bool,
}
