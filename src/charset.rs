//! Charset transcoding to UTF-8.
//!
//! The built-in table covers the legacy Japanese encodings found in inbound
//! mail: `iso-2022-jp`, `shift_jis` and `euc-jp`. More labels can be added
//! at runtime with [`register_charset`].
//!
//! Labels that are not in the table decode as the identity, so bodies
//! declared as `utf-8`, `us-ascii` or with no charset at all come back
//! byte-for-byte.

use crate::error::{Error, Result};
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::io::{AsyncRead, AsyncReadExt};

pub use encoding_rs::Encoding;

/// Maps lowercase charset labels to decoders, seeded with the built-ins.
static CHARSETS: Lazy<RwLock<HashMap<String, &'static Encoding>>> = Lazy::new(|| {
    let builtin = [
        ("iso-2022-jp", encoding_rs::ISO_2022_JP),
        ("shift_jis", encoding_rs::SHIFT_JIS),
        ("euc-jp", encoding_rs::EUC_JP),
    ];
    RwLock::new(
        builtin
            .into_iter()
            .map(|(label, enc)| (label.to_string(), enc))
            .collect(),
    )
});

fn normalize(label: &str) -> String {
    label.trim().to_ascii_lowercase()
}

/// Registers a decoder for a charset label, replacing any previous one.
///
/// Labels are matched case-insensitively.
///
/// # Examples
///
/// ```
/// use tokio_mailutil::charset::{self, register_charset};
///
/// register_charset("windows-1252", encoding_rs::WINDOWS_1252);
/// let text = charset::decode_bytes(b"caf\xe9", Some("Windows-1252")).unwrap();
/// assert_eq!(&text[..], "caf\u{e9}".as_bytes());
/// ```
pub fn register_charset(label: &str, encoding: &'static Encoding) {
    CHARSETS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(normalize(label), encoding);
}

/// Returns the decoder registered for a label, if any.
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    CHARSETS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&normalize(label))
        .copied()
}

/// Reads `r` to the end and transcodes it from `charset` to UTF-8.
///
/// `None` or an unregistered label returns the bytes unchanged.
pub async fn decode_text<R: AsyncRead + Unpin>(mut r: R, charset: Option<&str>) -> Result<Bytes> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf).await?;
    transcode(buf, charset)
}

/// Transcodes an in-memory buffer from `charset` to UTF-8.
pub fn decode_bytes(data: &[u8], charset: Option<&str>) -> Result<Bytes> {
    transcode(data.to_vec(), charset)
}

fn transcode(buf: Vec<u8>, charset: Option<&str>) -> Result<Bytes> {
    let Some(encoding) = charset.and_then(lookup) else {
        return Ok(Bytes::from(buf));
    };

    tracing::trace!(charset = encoding.name(), len = buf.len(), "transcoding to utf-8");
    match encoding.decode_without_bom_handling_and_without_replacement(&buf) {
        Some(text) => Ok(Bytes::from(text.into_owned())),
        None => Err(Error::Decode(format!(
            "invalid {} byte sequence",
            encoding.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "こんにちは" in each encoding.
    const SJIS: &[u8] = b"\x82\xb1\x82\xf1\x82\xc9\x82\xbf\x82\xcd";
    const EUC: &[u8] = b"\xa4\xb3\xa4\xf3\xa4\xcb\xa4\xc1\xa4\xcf";
    const JIS: &[u8] = b"\x1b$B$3$s$K$A$O\x1b(B";
    const HELLO: &str = "こんにちは";

    #[tokio::test]
    async fn test_decode_japanese() {
        assert_eq!(decode_text(SJIS, Some("shift_jis")).await.unwrap(), HELLO.as_bytes());
        assert_eq!(decode_text(EUC, Some("euc-jp")).await.unwrap(), HELLO.as_bytes());
        assert_eq!(decode_text(JIS, Some("iso-2022-jp")).await.unwrap(), HELLO.as_bytes());
    }

    #[tokio::test]
    async fn test_label_case_insensitive() {
        let lower = decode_text(SJIS, Some("shift_jis")).await.unwrap();
        let mixed = decode_text(SJIS, Some("Shift_JIS")).await.unwrap();
        let upper = decode_text(SJIS, Some(" SHIFT_JIS ")).await.unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn test_unknown_charset_is_identity() {
        let raw: &[u8] = b"\xff\xfe not utf-8 \x82";
        for label in [None, Some("utf-8"), Some("us-ascii"), Some("x-unknown"), Some("")] {
            assert_eq!(decode_text(raw, label).await.unwrap(), raw);
        }
    }

    #[test]
    fn test_invalid_bytes_fail() {
        let err = decode_bytes(b"\x82", Some("shift_jis")).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().contains("Shift_JIS"));
    }

    #[test]
    fn test_register_charset() {
        assert!(lookup("x-test-latin1").is_none());
        register_charset("X-Test-Latin1", encoding_rs::WINDOWS_1252);
        assert_eq!(lookup("x-test-latin1"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(&decode_bytes(b"na\xefve", Some("x-test-latin1")).unwrap()[..], "na\u{ef}ve".as_bytes());
    }
}
