#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    kerbridge_fuzzing::oracles::kdc_request_decode(data);
});
