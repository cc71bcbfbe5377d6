#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio_mailutil::parse_address_list;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(list) = parse_address_list(s) {
            for addr in list {
                let _ = addr.to_string();
            }
        }
    }
});
