#![no_main]

use libfuzzer_sys::fuzz_target;
use pesym::prelude::*;

fuzz_target!(|data: &[u8]| {
    if let Ok(file) = File::from_mem(data.to_vec()) {
        let options = WalkOptions {
            base_name_only: false,
        };
        let _ = walk_exports(file.layout(), &options);
        let _ = walk_imports(file.layout(), &options);
    }
});
