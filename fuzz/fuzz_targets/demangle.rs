#![no_main]

use libfuzzer_sys::fuzz_target;
use pesym::demangle;

fuzz_target!(|data: &[u8]| {
    let _ = demangle(data, true);
    let _ = demangle(data, false);
});
