//! Lexical helpers shared by the header, media type and multipart parsers.
//!
//! Token rules follow RFC 2045; field-name rules follow RFC 5322.

/// Reports whether the character is in 'tspecials' as defined by RFC 2045.
///
/// tspecials := "(" / ")" / "<" / ">" / "@" / "," / ";" / ":" / "\" / <"> / "/" / "[" / "]" / "?" / "="
pub fn is_tspecial(c: char) -> bool {
    matches!(c, '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=')
}

/// Reports whether the character is in 'token' as defined by RFC 2045.
///
/// token := 1*<any (US-ASCII) CHAR except SPACE, CTLs, or tspecials>
pub fn is_token_char(c: char) -> bool {
    c > '\x20' && c < '\x7f' && !is_tspecial(c)
}

/// Reports whether the string is a non-empty RFC 2045 token.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Reports whether the byte may appear in a header field name.
///
/// ftext := %d33-57 / %d59-126 (printable US-ASCII except ":")
pub fn is_ftext(b: u8) -> bool {
    (33..=126).contains(&b) && b != b':'
}

/// Reports whether the byte is linear whitespace (space or tab).
pub fn is_lwsp(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Skips leading space and tab bytes.
pub fn skip_lwsp(b: &[u8]) -> &[u8] {
    let start = b.iter().position(|&c| !is_lwsp(c)).unwrap_or(b.len());
    &b[start..]
}

/// Strips one trailing "\r\n" or "\n".
pub fn trim_line_ending(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))
        .unwrap_or(line)
}

/// Reports whether the line is exactly a line ending.
pub fn is_blank_line(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

/// Decodes one hex digit of either case.
pub fn hex_digit(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

/// Decodes the two hex digits of a `=XX` or `%XX` escape.
pub fn hex_byte(high: u8, low: u8) -> Option<u8> {
    Some((hex_digit(high)? << 4) | hex_digit(low)?)
}
