#![no_main]

use libfuzzer_sys::fuzz_target;
use tokio::runtime::Builder;
use tokio_mailutil::multipart::Reader;

fuzz_target!(|data: &[u8]| {
    let rt = Builder::new_current_thread().build().unwrap();

    rt.block_on(async {
        let mut reader = Reader::new(data, "boundary");

        // Cap the part count
        for _ in 0..100 {
            match reader.next_part().await {
                Ok(Some(part)) => {
                    let _ = part.media_type();
                    let _ = part.transfer_encoding();
                }
                Ok(None) | Err(_) => break,
            }
        }
    });
});
