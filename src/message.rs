//! Decoded message values.
//!
//! Every payload here has already been transfer-decoded and transcoded to
//! UTF-8 (or passed through unchanged when its charset was not one the
//! transcoder knows). Values are immutable once built.

use crate::header::Header;
use bytes::Bytes;
use std::fmt;

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    /// A single `text/*` body.
    Plain(PlainMessage),
    /// A `multipart/*` message with optional text and HTML alternatives.
    Structured(StructuredMessage),
}

impl DecodedMessage {
    /// The top-level header.
    pub fn header(&self) -> &Header {
        match self {
            Self::Plain(m) => m.header(),
            Self::Structured(m) => m.header(),
        }
    }

    /// The primary readable content: the body of a plain message, or the
    /// `text/plain` part of a structured one.
    pub fn text(&self) -> Option<&Bytes> {
        match self {
            Self::Plain(m) => Some(m.text()),
            Self::Structured(m) => m.text(),
        }
    }

    /// The `text/html` part, for structured messages that have one.
    pub fn html(&self) -> Option<&Bytes> {
        match self {
            Self::Plain(_) => None,
            Self::Structured(m) => m.html(),
        }
    }

    /// Returns the plain variant, if this is one.
    pub fn as_plain(&self) -> Option<&PlainMessage> {
        match self {
            Self::Plain(m) => Some(m),
            Self::Structured(_) => None,
        }
    }

    /// Returns the structured variant, if this is one.
    pub fn as_structured(&self) -> Option<&StructuredMessage> {
        match self {
            Self::Plain(_) => None,
            Self::Structured(m) => Some(m),
        }
    }
}

impl fmt::Display for DecodedMessage {
    /// Writes the primary text, lossily for invalid UTF-8; empty if absent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(m) => fmt::Display::fmt(m, f),
            Self::Structured(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// A single-part text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMessage {
    header: Header,
    text: Bytes,
}

impl PlainMessage {
    /// Builds a plain message from a header and decoded text.
    pub fn new(header: Header, text: Bytes) -> Self {
        Self { header, text }
    }

    /// The message header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The decoded body.
    pub fn text(&self) -> &Bytes {
        &self.text
    }
}

impl fmt::Display for PlainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.text))
    }
}

/// A multipart message reduced to its readable alternatives.
///
/// A missing part is `None`; a part that was present but empty is
/// `Some` of an empty buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    header: Header,
    text: Option<Bytes>,
    html: Option<Bytes>,
}

impl StructuredMessage {
    /// Builds a structured message from a header and decoded parts.
    pub fn new(header: Header, text: Option<Bytes>, html: Option<Bytes>) -> Self {
        Self { header, text, html }
    }

    /// The message header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Reports whether a `text/plain` part was found.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Reports whether a `text/html` part was found.
    pub fn has_html(&self) -> bool {
        self.html.is_some()
    }

    /// The decoded `text/plain` part.
    pub fn text(&self) -> Option<&Bytes> {
        self.text.as_ref()
    }

    /// The decoded `text/html` part.
    pub fn html(&self) -> Option<&Bytes> {
        self.html.as_ref()
    }
}

impl fmt::Display for StructuredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(&String::from_utf8_lossy(text)),
            None => Ok(()),
        }
    }
}
