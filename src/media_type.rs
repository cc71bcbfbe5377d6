//! Media type parsing and formatting.
//!
//! Implements RFC 2045 `Content-Type` values, including quoted-string
//! parameters and RFC 2231 extended and continued parameters.

use crate::charset;
use crate::error::{Error, Result};
use crate::grammar::{hex_byte, is_token, is_tspecial};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const UPPER_HEX: &[u8] = b"0123456789ABCDEF";

/// A parsed media type such as `text/plain; charset=iso-2022-jp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: HashMap<String, String>,
}

impl MediaType {
    /// Parses a `Content-Type` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::MediaType;
    ///
    /// let mt = MediaType::parse("Multipart/Mixed; boundary=\"frontier\"").unwrap();
    /// assert_eq!(mt.essence(), "multipart/mixed");
    /// assert!(mt.is_multipart());
    /// assert_eq!(mt.boundary(), Some("frontier"));
    /// ```
    pub fn parse(v: &str) -> Result<Self> {
        let (essence, params) = parse_media_type(v)?;
        Ok(Self { essence, params })
    }

    /// The lowercased `type/subtype`.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// The primary type, e.g. `text`.
    pub fn type_(&self) -> &str {
        self.essence.split_once('/').map_or(&*self.essence, |(t, _)| t)
    }

    /// The subtype, e.g. `plain`.
    pub fn subtype(&self) -> &str {
        self.essence.split_once('/').map_or("", |(_, s)| s)
    }

    /// Reports whether this is a `multipart/*` type.
    pub fn is_multipart(&self) -> bool {
        self.type_() == "multipart"
    }

    /// Reports whether this is a `text/*` type.
    pub fn is_text(&self) -> bool {
        self.type_() == "text"
    }

    /// Looks up a parameter; names are case-insensitive.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// All parameters, keyed by lowercased name.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The `charset` parameter, if any.
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// The `boundary` parameter, if present and non-empty.
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary").filter(|b| !b.is_empty())
    }
}

impl Default for MediaType {
    /// `text/plain`, the RFC 2045 default for a missing `Content-Type`.
    fn default() -> Self {
        Self {
            essence: "text/plain".to_string(),
            params: HashMap::new(),
        }
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_media_type(&self.essence, &self.params))
    }
}

/// Parses a media type value and any optional parameters.
///
/// Returns the media type converted to lowercase and a map of parameters
/// keyed by lowercased name.
///
/// # Examples
///
/// ```
/// use tokio_mailutil::parse_media_type;
///
/// let (media_type, params) = parse_media_type("text/html; charset=utf-8").unwrap();
/// assert_eq!(media_type, "text/html");
/// assert_eq!(params.get("charset"), Some(&"utf-8".to_string()));
/// ```
pub fn parse_media_type(v: &str) -> Result<(String, HashMap<String, String>)> {
    let (base, rest) = v.split_once(';').unwrap_or((v, ""));
    let mediatype = base.trim().to_ascii_lowercase();

    match mediatype.split_once('/') {
        Some((major, sub)) if is_token(major) && is_token(sub) => {}
        Some(_) => {
            return Err(Error::MalformedContentType(format!(
                "invalid media type {mediatype:?}"
            )))
        }
        None => return Err(Error::MalformedContentType("no media type".to_string())),
    }

    let raw = parse_raw_params(rest)?;
    Ok((mediatype, resolve_params(raw)))
}

/// Splits the parameter section into (lowercased name, value) pairs.
fn parse_raw_params(mut rest: &str) -> Result<HashMap<String, String>> {
    let mut raw = HashMap::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
        if rest.is_empty() {
            break;
        }

        let Some(eq) = rest.find('=') else {
            return Err(Error::MalformedContentType(format!(
                "parameter without value: {:?}",
                rest.split(';').next().unwrap_or(rest).trim()
            )));
        };
        let key = rest[..eq].trim().to_ascii_lowercase();
        if !is_param_name(&key) {
            return Err(Error::MalformedContentType(format!(
                "invalid parameter name {key:?}"
            )));
        }

        rest = rest[eq + 1..].trim_start();
        let (value, remainder) = if rest.starts_with('"') {
            consume_quoted(rest)?
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end].trim();
            if value.is_empty() {
                return Err(Error::MalformedContentType(format!(
                    "empty value for parameter {key:?}"
                )));
            }
            (value.to_string(), &rest[end..])
        };
        rest = remainder;

        if raw.insert(key.clone(), value).is_some() {
            return Err(Error::MalformedContentType(format!(
                "duplicate parameter {key:?}"
            )));
        }
    }

    Ok(raw)
}

/// Parameter names may carry RFC 2231 `*` and `*N` suffixes.
fn is_param_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c > ' ' && c < '\x7f' && (c == '*' || !is_tspecial(c)))
}

/// Consumes a quoted-string, returning the unescaped value and the remainder.
fn consume_quoted(s: &str) -> Result<(String, &str)> {
    let mut out = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            '\r' | '\n' => break,
            c => out.push(c),
        }
    }
    Err(Error::MalformedContentType(
        "unterminated quoted-string".to_string(),
    ))
}

/// Folds RFC 2231 `name*`, `name*0`, `name*1*` pieces into plain parameters.
fn resolve_params(raw: HashMap<String, String>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let bases: Vec<String> = raw
        .keys()
        .map(|k| k.split('*').next().unwrap_or(k).to_string())
        .collect();

    for base in bases {
        if params.contains_key(&base) {
            continue;
        }
        if let Some(v) = raw.get(&base) {
            params.insert(base, v.clone());
            continue;
        }
        if let Some(v) = raw.get(&format!("{base}*")) {
            if let Some(decoded) = decode_extended(v) {
                params.insert(base, decoded);
            }
            continue;
        }

        let mut value = String::new();
        let mut charset = None;
        let mut encoded = Vec::new();
        for n in 0.. {
            if let Some(piece) = raw.get(&format!("{base}*{n}")) {
                flush_encoded(&mut value, &mut encoded, charset.as_deref());
                value.push_str(piece);
            } else if let Some(piece) = raw.get(&format!("{base}*{n}*")) {
                let piece = if n == 0 {
                    let Some((cs, data)) = split_extended(piece) else { break };
                    charset = Some(cs.to_string());
                    data
                } else {
                    piece.as_str()
                };
                let Some(bytes) = percent_decode(piece) else { break };
                encoded.extend_from_slice(&bytes);
            } else {
                break;
            }
        }
        flush_encoded(&mut value, &mut encoded, charset.as_deref());
        if !value.is_empty() {
            params.insert(base, value);
        }
    }

    params
}

fn flush_encoded(value: &mut String, encoded: &mut Vec<u8>, charset: Option<&str>) {
    if encoded.is_empty() {
        return;
    }
    let bytes = std::mem::take(encoded);
    match charset::decode_bytes(&bytes, charset) {
        Ok(text) => value.push_str(&String::from_utf8_lossy(&text)),
        Err(_) => value.push_str(&String::from_utf8_lossy(&bytes)),
    }
}

/// Splits `charset'language'data` into charset and data.
fn split_extended(v: &str) -> Option<(&str, &str)> {
    let mut parts = v.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    Some((charset, parts.next()?))
}

/// Decodes a complete RFC 2231 extended value.
fn decode_extended(v: &str) -> Option<String> {
    let (cs, data) = split_extended(v)?;
    let bytes = percent_decode(data)?;
    let cs = (!cs.is_empty()).then_some(cs);
    let text = charset::decode_bytes(&bytes, cs).ok()?;
    String::from_utf8(text.to_vec()).ok()
}

fn percent_decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            out.push(hex_byte(hex[0], hex[1])?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// Serializes a media type and parameters as a header value.
///
/// The type and parameter names are written in lower-case and parameters
/// are sorted by name.
///
/// # Examples
///
/// ```
/// use tokio_mailutil::format_media_type;
/// use std::collections::HashMap;
///
/// let mut params = HashMap::new();
/// params.insert("charset".to_string(), "utf-8".to_string());
/// let formatted = format_media_type("text/html", &params);
/// assert_eq!(formatted, "text/html; charset=utf-8");
/// ```
pub fn format_media_type(t: &str, params: &HashMap<String, String>) -> String {
    let mut result = String::new();

    match t.split_once('/') {
        Some((major, sub)) if is_token(major) && is_token(sub) => {
            result.push_str(&major.to_ascii_lowercase());
            result.push('/');
            result.push_str(&sub.to_ascii_lowercase());
        }
        _ => return String::new(),
    }

    let mut keys: Vec<_> = params.keys().collect();
    keys.sort();

    for key in keys {
        let value = &params[key];

        if !is_token(key) {
            return String::new();
        }

        result.push_str("; ");
        result.push_str(&key.to_ascii_lowercase());

        if needs_encoding(value) {
            result.push_str("*=utf-8''");
            for &b in value.as_bytes() {
                if b <= b' ' || b >= 0x7F || b == b'*' || b == b'\'' || b == b'%' || is_tspecial(b as char) {
                    result.push('%');
                    result.push(UPPER_HEX[(b >> 4) as usize] as char);
                    result.push(UPPER_HEX[(b & 0x0F) as usize] as char);
                } else {
                    result.push(b as char);
                }
            }
        } else if is_token(value) {
            result.push('=');
            result.push_str(value);
        } else {
            result.push_str("=\"");
            for ch in value.chars() {
                if ch == '"' || ch == '\\' {
                    result.push('\\');
                }
                result.push(ch);
            }
            result.push('"');
        }
    }

    result
}

fn needs_encoding(s: &str) -> bool {
    s.chars().any(|ch| (ch < ' ' || ch > '~') && ch != '\t')
}
