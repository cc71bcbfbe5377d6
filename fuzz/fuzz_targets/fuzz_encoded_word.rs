#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio_mailutil::WordDecoder;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let decoder = WordDecoder::new();
        let _ = decoder.decode(s);
        let _ = decoder.decode_header(s);
    }
});
