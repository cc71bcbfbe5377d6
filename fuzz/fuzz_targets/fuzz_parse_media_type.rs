#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio_mailutil::{format_media_type, parse_media_type};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Whatever parses must survive a format/parse cycle
        if let Ok((essence, params)) = parse_media_type(s) {
            let formatted = format_media_type(&essence, &params);
            if !formatted.is_empty() {
                let _ = parse_media_type(&formatted);
            }
        }
    }
});
