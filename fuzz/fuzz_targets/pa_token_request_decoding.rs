#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    kerbridge_fuzzing::oracles::pa_token_request_decode(data);
});
