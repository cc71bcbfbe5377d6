//! Async decoder for inbound mail, built on tokio.
//!
//! Turns a raw RFC 822 message into UTF-8 text ready for display or
//! indexing:
//! - Header block parsing with unfolding and RFC 2047 encoded-word decoding
//! - Media type parsing (RFC 2045, RFC 2231)
//! - Multipart walking (RFC 2046), including nested containers
//! - Base64 and quoted-printable transfer decoding
//! - Charset transcoding to UTF-8 for ISO-2022-JP, Shift_JIS and EUC-JP,
//!   with further charsets registrable at runtime
//!
//! A plain `text/*` message decodes to [`DecodedMessage::Plain`]; a
//! `multipart/*` message decodes to [`DecodedMessage::Structured`] holding
//! its `text/plain` and `text/html` alternatives.
//!
//! # Examples
//!
//! ```
//! use tokio_mailutil::parse_mail;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tokio_mailutil::Result<()> {
//! let raw = b"Subject: =?UTF-8?B?44GT44KT44Gr44Gh44Gv?=\r\n\
//! Content-Type: multipart/alternative; boundary=sep\r\n\
//! \r\n\
//! --sep\r\n\
//! Content-Type: text/plain; charset=utf-8\r\n\
//! \r\n\
//! hello\r\n\
//! --sep\r\n\
//! Content-Type: text/html; charset=utf-8\r\n\
//! Content-Transfer-Encoding: base64\r\n\
//! \r\n\
//! PHA+aGVsbG88L3A+\r\n\
//! --sep--\r\n";
//!
//! let msg = parse_mail(&raw[..]).await?;
//! assert_eq!(msg.header().get_decoded("Subject")?, "こんにちは");
//! assert_eq!(msg.text().map(|b| &b[..]), Some(&b"hello"[..]));
//! assert_eq!(msg.html().map(|b| &b[..]), Some(&b"<p>hello</p>"[..]));
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod charset;
pub mod config;
pub mod encoded_word;
pub mod error;
pub mod grammar;
pub mod header;
pub mod media_type;
pub mod message;
pub mod multipart;
pub mod parse;
pub mod quotedprintable;
pub mod transfer;

// Re-export commonly used types
pub use address::{parse_address_list, Address};
pub use charset::register_charset;
pub use config::ParserConfig;
pub use encoded_word::WordDecoder;
pub use error::{Error, Result};
pub use header::Header;
pub use media_type::{format_media_type, parse_media_type, MediaType};
pub use message::{DecodedMessage, PlainMessage, StructuredMessage};
pub use parse::{parse_mail, Parser};
pub use transfer::TransferEncoding;
