//! Quoted-printable decoding (RFC 2045).

pub mod reader;

pub use reader::Reader;
