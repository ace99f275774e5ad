#![no_main]

use libfuzzer_sys::fuzz_target;
use tsbatch::buffer::IngestionBuffer;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let buffer = IngestionBuffer::new("db0", "rp0", "fuzz");
    for line in text.lines().take(64) {
        let _ = buffer.append_json(line);
    }

    // Whatever was accepted must snapshot into a rectangular batch.
    if let Ok(batch) = buffer.to_batch() {
        for (_, values) in batch.columns() {
            assert_eq!(values.len(), batch.row_count());
        }
        let _ = tsbatch::batch::encode_block(&batch);
    }
});
