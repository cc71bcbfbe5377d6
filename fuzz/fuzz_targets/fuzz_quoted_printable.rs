#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio::io::AsyncReadExt;
use tokio::runtime::Builder;
use tokio_mailutil::quotedprintable::Reader;

fuzz_target!(|data: &[u8]| {
    let rt = Builder::new_current_thread().build().unwrap();

    rt.block_on(async {
        let mut output = Vec::new();
        // Decoding never grows the input, so 1MB is plenty
        let _ = Reader::new(data).take(1024 * 1024).read_to_end(&mut output).await;
    });
});
