#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail, never panic.
    if let Ok(records) = tsbatch::batch::decode_blocks(data) {
        for record in records {
            let _ = record.num_rows();
        }
    }
});
