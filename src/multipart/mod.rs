//! Multipart MIME parsing (RFC 2046).

pub mod reader;

pub use reader::{Part, Reader};
