#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    kerbridge_fuzzing::oracles::unseal_pa_token(data);
});
