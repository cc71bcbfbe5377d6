//! RFC 5322 address lists (`From`, `To`, `Cc`, ...).
//!
//! Accepts `"Display Name" <local@domain>`, `Name <local@domain>` and bare
//! `local@domain` entries, skips parenthesized comments and flattens
//! `group: a@b, c@d;` syntax. Display names have RFC 2047 encoded words
//! decoded.

use crate::encoded_word::WordDecoder;
use crate::error::{Error, Result};
use std::fmt;

/// A single mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    name: Option<String>,
    local_part: String,
    domain: String,
}

impl Address {
    /// Creates an address from its parts.
    pub fn new(
        name: Option<impl Into<String>>,
        local_part: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.map(Into::into).filter(|n: &String| !n.is_empty()),
            local_part: local_part.into(),
            domain: domain.into(),
        }
    }

    /// The decoded display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The part before `@`.
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The part after `@`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The bare `local@domain` form.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            if name.chars().all(|c| c == ' ' || is_atext(c)) {
                write!(f, "{name} ")?;
            } else {
                f.write_str("\"")?;
                for c in name.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\" ")?;
            }
        }
        write!(f, "<{}>", self.address())
    }
}

/// Parses a comma-separated list of mailboxes and groups.
///
/// An empty value is an error; a list made only of empty groups (such as
/// `undisclosed-recipients:;`) yields no addresses.
pub fn parse_address_list(value: &str) -> Result<Vec<Address>> {
    let mut p = AddressParser {
        src: value,
        pos: 0,
    };
    let mut out = Vec::new();

    p.skip_cfws()?;
    if p.at_end() {
        return Err(Error::InvalidAddress("no address".to_string()));
    }

    loop {
        p.skip_cfws()?;
        match p.peek() {
            None => break,
            Some(',') => {
                p.pos += 1;
                continue;
            }
            Some(_) => {}
        }
        p.parse_entry(&mut out)?;
        p.skip_cfws()?;
        match p.peek() {
            None => break,
            Some(',') => p.pos += 1,
            Some(c) => return Err(p.error(&format!("unexpected {c:?}"))),
        }
    }

    Ok(out)
}

/// RFC 5322 atext; UTF-8 is allowed per RFC 6532.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

struct AddressParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> AddressParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, msg: &str) -> Error {
        Error::InvalidAddress(format!("{msg} at offset {} in {:?}", self.pos, self.src))
    }

    /// Skips whitespace and (nested) comments.
    fn skip_cfws(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += c.len_utf8(),
                Some('(') => {
                    let mut depth = 0usize;
                    let mut chars = self.rest().char_indices();
                    let mut end = None;
                    while let Some((i, c)) = chars.next() {
                        match c {
                            '\\' => {
                                chars.next();
                            }
                            '(' => depth += 1,
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    end = Some(i + 1);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    match end {
                        Some(len) => self.pos += len,
                        None => return Err(self.error("unterminated comment")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consumes a quoted-string, returning its unescaped content.
    fn quoted_string(&mut self) -> Result<String> {
        let mut out = String::new();
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.error("unterminated quoted-string"))
    }

    /// Consumes a run of atext and dots.
    fn dot_atom(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(is_atext(c) || c == '.'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Reads display-name words until something that is not a word.
    fn phrase(&mut self) -> Result<Vec<String>> {
        let mut words = Vec::new();
        loop {
            self.skip_cfws()?;
            match self.peek() {
                Some('"') => words.push(self.quoted_string()?),
                Some(c) if is_atext(c) || c == '.' => words.push(self.dot_atom().to_string()),
                _ => return Ok(words),
            }
        }
    }

    fn parse_entry(&mut self, out: &mut Vec<Address>) -> Result<()> {
        let start = self.pos;
        let words = self.phrase()?;

        match self.peek() {
            Some(':') if !words.is_empty() => {
                self.pos += 1;
                loop {
                    self.skip_cfws()?;
                    match self.peek() {
                        Some(';') => {
                            self.pos += 1;
                            return Ok(());
                        }
                        Some(',') => self.pos += 1,
                        None => return Err(self.error("unterminated group")),
                        Some(_) => out.push(self.mailbox()?),
                    }
                }
            }
            _ => {
                self.pos = start;
                out.push(self.mailbox()?);
                Ok(())
            }
        }
    }

    fn mailbox(&mut self) -> Result<Address> {
        let start = self.pos;
        let words = self.phrase()?;

        if self.peek() == Some('<') {
            self.pos += 1;
            self.skip_cfws()?;
            let (local, domain) = self.addr_spec()?;
            self.skip_cfws()?;
            if self.peek() != Some('>') {
                return Err(self.error("expected '>'"));
            }
            self.pos += 1;
            let name = display_name(&words);
            return Ok(Address::new(name, local, domain));
        }

        self.pos = start;
        self.skip_cfws()?;
        let (local, domain) = self.addr_spec()?;
        Ok(Address::new(None::<String>, local, domain))
    }

    fn addr_spec(&mut self) -> Result<(String, String)> {
        let local = if self.peek() == Some('"') {
            self.quoted_string()?
        } else {
            self.dot_atom().to_string()
        };
        if local.is_empty() {
            return Err(self.error("missing local part"));
        }

        self.skip_cfws()?;
        if self.peek() != Some('@') {
            return Err(self.error("missing '@'"));
        }
        self.pos += 1;
        self.skip_cfws()?;

        let domain = if self.peek() == Some('[') {
            let rest = self.rest();
            let Some(end) = rest.find(']') else {
                return Err(self.error("unterminated domain literal"));
            };
            self.pos += end + 1;
            rest[..=end].to_string()
        } else {
            self.dot_atom().to_string()
        };
        if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
            return Err(self.error("invalid domain"));
        }

        Ok((local, domain))
    }
}

fn display_name(words: &[String]) -> Option<String> {
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    Some(
        WordDecoder::new()
            .decode_header(&joined)
            .unwrap_or(joined),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_named() {
        let list = parse_address_list(
            "alice@example.com, \"Bob Smith\" <bob@example.com>, Carol Jones <carol@example.org>",
        )
        .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name(), None);
        assert_eq!(list[0].address(), "alice@example.com");
        assert_eq!(list[1].name(), Some("Bob Smith"));
        assert_eq!(list[1].local_part(), "bob");
        assert_eq!(list[1].domain(), "example.com");
        assert_eq!(list[2].name(), Some("Carol Jones"));
    }

    #[test]
    fn test_encoded_display_name() {
        let list =
            parse_address_list("=?ISO-2022-JP?B?GyRCJDMkcyRLJEEkTxsoQg==?= <user@example.jp>").unwrap();
        assert_eq!(list[0].name(), Some("こんにちは"));
        assert_eq!(list[0].address(), "user@example.jp");
    }

    #[test]
    fn test_comments_and_groups() {
        let list = parse_address_list(
            "Team: a@example.com (first), b@example.com;, c@example.com (Carol)",
        )
        .unwrap();
        let addrs: Vec<_> = list.iter().map(Address::address).collect();
        assert_eq!(addrs, vec!["a@example.com", "b@example.com", "c@example.com"]);

        assert!(parse_address_list("undisclosed-recipients:;").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_local_and_literal_domain() {
        let list = parse_address_list("\"john doe\"@[192.0.2.1]").unwrap();
        assert_eq!(list[0].local_part(), "john doe");
        assert_eq!(list[0].domain(), "[192.0.2.1]");
    }

    #[test]
    fn test_display() {
        let list = parse_address_list("\"Smith, John\" <john@example.com>, x@example.com").unwrap();
        assert_eq!(list[0].to_string(), "\"Smith, John\" <john@example.com>");
        assert_eq!(list[1].to_string(), "<x@example.com>");
        let plain = Address::new(Some("John Smith"), "john", "example.com");
        assert_eq!(plain.to_string(), "John Smith <john@example.com>");
    }

    #[test]
    fn test_invalid() {
        for bad in ["", "   ", "no-at-sign", "<a@b", "a@", "@example.com", "a@b c@d", "(open"] {
            assert!(
                matches!(parse_address_list(bad), Err(Error::InvalidAddress(_))),
                "{bad:?} should fail"
            );
        }
    }
}
