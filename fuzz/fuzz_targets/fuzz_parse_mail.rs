#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio::runtime::Builder;
use tokio_mailutil::{Parser, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let rt = Builder::new_current_thread().build().unwrap();

    // Small limits keep each run cheap
    let config = ParserConfig::default()
        .with_max_header_bytes(64 * 1024)
        .with_max_part_bytes(1024 * 1024);

    rt.block_on(async {
        if let Ok(msg) = Parser::with_config(config).parse(data).await {
            let _ = msg.to_string();
            let _ = msg.header().get_decoded("Subject");
            let _ = msg.header().address_list("From");
        }
    });
});
