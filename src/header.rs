//! Message and part header blocks.

use crate::address::{parse_address_list, Address};
use crate::config::ParserConfig;
use crate::encoded_word::WordDecoder;
use crate::error::{Error, Result};
use crate::grammar::{is_blank_line, is_ftext, is_lwsp, trim_line_ending};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// An ordered collection of header fields.
///
/// Field names keep the case they were sent with; lookups ignore case.
/// Repeated fields are kept in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    fields: Vec<(String, String)>,
}

impl Header {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the first value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of a field, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Reports whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields, counting repeats.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reports whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the first value of a field with RFC 2047 encoded words decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::Header;
    ///
    /// let mut header = Header::new();
    /// header.add("Subject", "=?UTF-8?B?44GT44KT44Gr44Gh44Gv?=");
    /// assert_eq!(header.get_decoded("subject").unwrap(), "こんにちは");
    /// ```
    pub fn get_decoded(&self, name: &str) -> Result<String> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::MissingHeader(name.to_string()))?;
        WordDecoder::new().decode_header(value)
    }

    /// Parses the first value of a field as an RFC 5322 address list.
    ///
    /// A failure here only concerns this field; the rest of the header stays
    /// usable.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::Header;
    ///
    /// let mut header = Header::new();
    /// header.add("From", "\"Taro Yamada\" <taro@example.jp>, hanako@example.jp");
    /// let from = header.address_list("from").unwrap();
    /// assert_eq!(from.len(), 2);
    /// assert_eq!(from[0].address(), "taro@example.jp");
    /// assert_eq!(from[1].to_string(), "<hanako@example.jp>");
    /// ```
    pub fn address_list(&self, name: &str) -> Result<Vec<Address>> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::MissingHeader(name.to_string()))?;
        parse_address_list(value)
    }
}

/// Reads a header block up to and including the blank separator line.
///
/// Folded lines are unfolded into a single space. The input must contain the
/// separator; running out of input first is a malformed message.
pub(crate) async fn read_header<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    config: &ParserConfig,
) -> Result<Header> {
    let mut header = Header::new();
    let mut total_size = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        // One byte past the limit is enough to tell the block is too large.
        let remaining = config.max_header_bytes.saturating_sub(total_size);
        let n = (&mut *reader)
            .take((remaining as u64).saturating_add(1))
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            return Err(Error::MalformedMessage(
                "missing header/body separator".to_string(),
            ));
        }

        total_size += n;
        if total_size > config.max_header_bytes {
            tracing::warn!(limit = config.max_header_bytes, "header block exceeds size limit");
            return Err(Error::MessageTooLarge);
        }

        if is_blank_line(&line) {
            return Ok(header);
        }

        if !line.ends_with(b"\n") {
            return Err(Error::MalformedMessage(
                "missing header/body separator".to_string(),
            ));
        }

        let content = trim_line_ending(&line);
        if is_lwsp(content[0]) {
            let Some((_, value)) = header.fields.last_mut() else {
                return Err(Error::MalformedMessage(
                    "continuation line before first header field".to_string(),
                ));
            };
            let more = String::from_utf8_lossy(content);
            let more = more.trim();
            if !more.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(more);
            }
            continue;
        }

        let (name, value) = parse_field(content)?;
        if header.len() >= config.max_headers {
            tracing::warn!(limit = config.max_headers, "header block exceeds field limit");
            return Err(Error::MessageTooLarge);
        }
        header.add(name, value);
    }
}

/// Splits `Name: value` into its parts.
fn parse_field(line: &[u8]) -> Result<(String, String)> {
    let malformed = || {
        Error::MalformedMessage(format!(
            "malformed header line {:?}",
            String::from_utf8_lossy(line)
        ))
    };

    let colon = line.iter().position(|&b| b == b':').ok_or_else(malformed)?;
    let mut name = &line[..colon];
    while let Some((&last, rest)) = name.split_last() {
        if !is_lwsp(last) {
            break;
        }
        name = rest;
    }
    if name.is_empty() || !name.iter().all(|&b| is_ftext(b)) {
        return Err(malformed());
    }

    let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
    Ok((String::from_utf8_lossy(name).into_owned(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn read(data: &[u8]) -> Result<Header> {
        let mut reader = BufReader::new(data);
        read_header(&mut reader, &ParserConfig::default()).await
    }

    #[tokio::test]
    async fn test_read_header() {
        let header = read(b"Content-Type: text/plain\r\nSubject: hi\r\n\r\nbody").await.unwrap();
        assert_eq!(header.get("content-type"), Some("text/plain"));
        assert_eq!(header.get("SUBJECT"), Some("hi"));
        assert_eq!(header.len(), 2);
    }

    #[tokio::test]
    async fn test_read_header_leaves_body() {
        let mut reader = BufReader::new(&b"A: 1\n\nthe body"[..]);
        read_header(&mut reader, &ParserConfig::default()).await.unwrap();
        let mut body = String::new();
        reader.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "the body");
    }

    #[tokio::test]
    async fn test_folded_lines() {
        let header = read(b"Content-Type: text/plain;\r\n\tcharset=\"iso-2022-jp\"\r\nTo: a@example.com,\r\n  b@example.com\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(header.get("Content-Type"), Some("text/plain; charset=\"iso-2022-jp\""));
        assert_eq!(header.get("to"), Some("a@example.com, b@example.com"));
    }

    #[tokio::test]
    async fn test_repeated_fields_keep_order() {
        let header = read(b"Received: one\r\nX-A: a\r\nreceived: two\r\n\r\n").await.unwrap();
        assert_eq!(header.get("Received"), Some("one"));
        assert_eq!(header.get_all("RECEIVED"), vec!["one", "two"]);
        let names: Vec<_> = header.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Received", "X-A", "received"]);
    }

    #[tokio::test]
    async fn test_missing_separator() {
        assert!(matches!(read(b"Subject: hi\r\n").await, Err(Error::MalformedMessage(_))));
        assert!(matches!(read(b"Subject: hi").await, Err(Error::MalformedMessage(_))));
        assert!(matches!(read(b"").await, Err(Error::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn test_malformed_lines() {
        assert!(matches!(read(b"no colon here\r\n\r\n").await, Err(Error::MalformedMessage(_))));
        assert!(matches!(read(b": empty name\r\n\r\n").await, Err(Error::MalformedMessage(_))));
        assert!(matches!(read(b" leading fold\r\n\r\n").await, Err(Error::MalformedMessage(_))));
        assert!(matches!(read(b"Bad Name: x\r\n\r\n").await, Err(Error::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn test_whitespace_before_colon() {
        let header = read(b"Subject : spaced\r\n\r\n").await.unwrap();
        assert_eq!(header.get("subject"), Some("spaced"));
    }

    #[tokio::test]
    async fn test_limits() {
        let config = ParserConfig::default().with_max_headers(2);
        let mut reader = BufReader::new(&b"A: 1\r\nB: 2\r\nC: 3\r\n\r\n"[..]);
        let err = read_header(&mut reader, &config).await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge));

        let config = ParserConfig::default().with_max_header_bytes(8);
        let mut reader = BufReader::new(&b"Subject: too long\r\n\r\n"[..]);
        let err = read_header(&mut reader, &config).await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge));
    }

    #[tokio::test]
    async fn test_unterminated_line_stops_at_limit() {
        // An endless line without a newline must not be buffered whole.
        let config = ParserConfig::default().with_max_header_bytes(1024);
        let mut reader = BufReader::new(tokio::io::repeat(b'a'));
        let err = read_header(&mut reader, &config).await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge));
    }

    #[test]
    fn test_get_decoded_and_missing() {
        let mut header = Header::new();
        header.add("Subject", "=?ISO-2022-JP?B?GyRCJDMkcyRLJEEkTxsoQg==?=");
        assert_eq!(header.get_decoded("subject").unwrap(), "こんにちは");
        assert!(matches!(header.get_decoded("x-none"), Err(Error::MissingHeader(_))));
        assert!(matches!(header.address_list("from"), Err(Error::MissingHeader(_))));
    }
}
