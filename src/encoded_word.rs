//! RFC 2047 encoded-word decoding.
//!
//! Non-ASCII subjects and display names arrive as `=?charset?B?...?=` or
//! `=?charset?Q?...?=`. The payload is transcoded through the
//! [`charset`](crate::charset) table, so `iso-2022-jp` words come back as
//! UTF-8 the same way bodies do.

use crate::charset;
use crate::error::{Error, Result};
use crate::grammar::hex_byte;
use base64::{engine::general_purpose, Engine as _};

/// An RFC 2047 encoded-word decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordDecoder;

impl WordDecoder {
    /// Creates a new WordDecoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes a single RFC 2047 encoded-word.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::WordDecoder;
    ///
    /// let decoded = WordDecoder::new().decode("=?utf-8?q?caf=C3=A9?=").unwrap();
    /// assert_eq!(decoded, "caf\u{e9}");
    /// ```
    pub fn decode(&self, word: &str) -> Result<String> {
        match split_word(word) {
            Some((cs, enc, text, len)) if len == word.len() => decode_payload(cs, enc, text),
            _ => Err(Error::Decode(format!("not an encoded word: {word:?}"))),
        }
    }

    /// Decodes all encoded-words of the given string.
    ///
    /// Whitespace between two adjacent encoded-words is dropped. Text that
    /// only looks like an encoded-word is kept as it is; a well-formed word
    /// whose payload cannot be decoded is an error.
    pub fn decode_header(&self, header: &str) -> Result<String> {
        let mut out = String::with_capacity(header.len());
        let mut rest = header;
        let mut prev_was_word = false;

        while let Some(start) = rest.find("=?") {
            let (before, candidate) = rest.split_at(start);
            let Some((cs, enc, text, len)) = split_word(candidate) else {
                out.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
                prev_was_word = false;
                continue;
            };

            if !(prev_was_word && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&decode_payload(cs, enc, text)?);
            rest = &candidate[len..];
            prev_was_word = true;
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Splits `=?charset?enc?text?=` at the start of `s`.
///
/// Returns the charset, the encoding letter, the encoded text and the total
/// length of the word.
fn split_word(s: &str) -> Option<(&str, u8, &str, usize)> {
    let inner = s.strip_prefix("=?")?;
    let q1 = inner.find('?')?;
    let cs = &inner[..q1];
    if cs.is_empty() || cs.contains(char::is_whitespace) {
        return None;
    }

    let after = inner[q1 + 1..].as_bytes();
    if after.len() < 2 || after[1] != b'?' {
        return None;
    }
    let enc = after[0].to_ascii_uppercase();
    if enc != b'B' && enc != b'Q' {
        return None;
    }

    let text_start = q1 + 3;
    let body = &inner[text_start..];
    let end = body.find("?=")?;
    let text = &body[..end];
    if text.contains(char::is_whitespace) {
        return None;
    }
    Some((cs, enc, text, 2 + text_start + end + 2))
}

fn decode_payload(cs: &str, enc: u8, text: &str) -> Result<String> {
    // RFC 2231 allows a language suffix: "utf-8*en".
    let cs = cs.split('*').next().unwrap_or(cs);
    let raw = if enc == b'B' {
        general_purpose::STANDARD
            .decode(text)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(text))?
    } else {
        decode_q(text)?
    };
    let decoded = charset::decode_bytes(&raw, Some(cs))?;
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

/// Decodes the RFC 2047 "Q" encoding.
fn decode_q(s: &str) -> Result<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let byte = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| hex_byte(hex[0], hex[1]))
                    .ok_or_else(|| Error::Decode(format!("invalid Q escape in {s:?}")))?;
                out.push(byte);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_b_iso_2022_jp() {
        let decoded = WordDecoder::new()
            .decode("=?ISO-2022-JP?B?GyRCJDMkcyRLJEEkTxsoQg==?=")
            .unwrap();
        assert_eq!(decoded, "こんにちは");
    }

    #[test]
    fn test_decode_q() {
        let decoded = WordDecoder::new()
            .decode("=?iso-8859-1?q?this=20is_some=20text?=")
            .unwrap();
        assert_eq!(decoded, "this is some text");
    }

    #[test]
    fn test_decode_b_without_padding() {
        assert_eq!(WordDecoder::new().decode("=?UTF-8?B?SGk?=").unwrap(), "Hi");
    }

    #[test]
    fn test_decode_rejects_non_words() {
        let decoder = WordDecoder::new();
        assert!(decoder.decode("plain").is_err());
        assert!(decoder.decode("=?UTF-8?X?abc?=").is_err());
        assert!(decoder.decode("=?UTF-8?Q?a?= trailing").is_err());
        assert!(decoder.decode("=?UTF-8?Q?bad=Z?=").is_err());
        assert!(decoder.decode("=?UTF-8?Q?sign=+A?=").is_err());
        assert!(decoder.decode("=?UTF-8?Q?sign=-1?=").is_err());
    }

    #[test]
    fn test_decode_header_mixed() {
        let decoder = WordDecoder::new();
        assert_eq!(
            decoder.decode_header("Re: =?UTF-8?Q?caf=C3=A9?= menu").unwrap(),
            "Re: caf\u{e9} menu"
        );
        assert_eq!(
            decoder.decode_header("=?UTF-8?Q?a?= \r\n =?UTF-8?Q?b?=").unwrap(),
            "ab"
        );
        assert_eq!(
            decoder.decode_header("=?UTF-8?Q?a?= b =?UTF-8?Q?c?=").unwrap(),
            "a b c"
        );
    }

    #[test]
    fn test_decode_header_keeps_lookalikes() {
        let decoder = WordDecoder::new();
        assert_eq!(decoder.decode_header("=?bogus").unwrap(), "=?bogus");
        assert_eq!(decoder.decode_header("1 =? 2").unwrap(), "1 =? 2");
        assert_eq!(decoder.decode_header("plain subject").unwrap(), "plain subject");
    }

    #[test]
    fn test_decode_header_language_suffix() {
        assert_eq!(
            WordDecoder::new().decode_header("=?US-ASCII*EN?Q?Keith_Moore?=").unwrap(),
            "Keith Moore"
        );
    }

    #[test]
    fn test_decode_header_bad_payload_fails() {
        assert!(WordDecoder::new().decode_header("=?shift_jis?B?gg==?=").is_err());
    }
}
