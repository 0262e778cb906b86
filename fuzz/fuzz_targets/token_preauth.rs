#![no_main]

use kerbridge_fuzzing::generators::TokenPreauthInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: TokenPreauthInput<'_>| {
    kerbridge_fuzzing::oracles::token_preauth_verify(input);
});
