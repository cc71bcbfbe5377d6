//! Message parsing entry point.
//!
//! A parse is one pass over the input: read the header block, dispatch on
//! the top-level `Content-Type`, then either transcode the single body or
//! walk the multipart tree, pushing every `text/plain` and `text/html` part
//! through transfer decoding and charset transcoding.

use crate::charset;
use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::header::{read_header, Header};
use crate::media_type::MediaType;
use crate::message::{DecodedMessage, PlainMessage, StructuredMessage};
use crate::multipart::{self, Part};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Parses a raw RFC 822 message with the default limits.
///
/// # Examples
///
/// ```
/// use tokio_mailutil::{parse_mail, DecodedMessage};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tokio_mailutil::Result<()> {
/// let raw = b"From: Taro <taro@example.jp>\r\n\
/// Subject: greeting\r\n\
/// Content-Type: text/plain; charset=iso-2022-jp\r\n\
/// \r\n\
/// \x1b$B$3$s$K$A$O\x1b(B";
///
/// let msg = parse_mail(&raw[..]).await?;
/// assert!(matches!(msg, DecodedMessage::Plain(_)));
/// assert_eq!(msg.to_string(), "こんにちは");
/// assert_eq!(msg.header().get("Subject"), Some("greeting"));
/// # Ok(())
/// # }
/// ```
pub async fn parse_mail<R: AsyncRead + Unpin>(r: R) -> Result<DecodedMessage> {
    Parser::new().parse(r).await
}

/// A message parser with configurable limits.
///
/// Parsers hold no per-message state, so one value can serve any number of
/// concurrent parses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    config: ParserConfig,
}

/// The readable alternatives collected while walking a multipart tree.
#[derive(Debug, Default)]
struct Alternatives {
    text: Option<Bytes>,
    html: Option<Bytes>,
}

impl Parser {
    /// Creates a parser with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with the given limits.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The limits in effect.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a raw RFC 822 message.
    ///
    /// A message without `Content-Type` is treated as `text/plain`.
    pub async fn parse<R: AsyncRead + Unpin>(&self, r: R) -> Result<DecodedMessage> {
        let mut reader = BufReader::new(r);
        let header = read_header(&mut reader, &self.config).await?;

        let media_type = match header.get("Content-Type") {
            Some(v) => MediaType::parse(v)?,
            None => MediaType::default(),
        };
        tracing::debug!(mediatype = media_type.essence(), "dispatching message");

        if media_type.is_multipart() {
            let boundary = media_type.boundary().ok_or(Error::MissingBoundary)?;
            let msg = self.build_structured(header, reader, boundary).await?;
            Ok(DecodedMessage::Structured(msg))
        } else if media_type.is_text() {
            let msg = self.build_plain(header, reader, media_type.charset()).await?;
            Ok(DecodedMessage::Plain(msg))
        } else {
            Err(Error::UnsupportedMediaType {
                mediatype: media_type.essence().to_string(),
            })
        }
    }

    /// Transcodes the whole body; the top level carries no transfer decoding.
    async fn build_plain<R: AsyncRead + Unpin>(
        &self,
        header: Header,
        mut body: R,
        charset: Option<&str>,
    ) -> Result<PlainMessage> {
        let limit = self.config.max_part_bytes;
        let mut raw = Vec::new();
        (&mut body)
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut raw)
            .await?;
        if raw.len() > limit {
            tracing::warn!(limit, "message body exceeds size limit");
            return Err(Error::MessageTooLarge);
        }

        let text = charset::decode_text(&raw[..], charset).await?;
        Ok(PlainMessage::new(header, text))
    }

    /// Walks the multipart tree depth-first in document order.
    ///
    /// Nested containers are followed with an explicit stack. A later
    /// `text/plain` or `text/html` part replaces an earlier one.
    async fn build_structured<R: AsyncRead + Unpin>(
        &self,
        header: Header,
        body: R,
        boundary: &str,
    ) -> Result<StructuredMessage> {
        if self.config.max_depth == 0 {
            return Err(nesting_error(self.config.max_depth));
        }

        let mut found = Alternatives::default();
        let mut top = multipart::Reader::with_config(body, boundary, self.config);
        let mut nested: Vec<multipart::Reader<Part>> = Vec::new();

        loop {
            let next = match nested.last_mut() {
                Some(inner) => inner.next_part().await?,
                None => top.next_part().await?,
            };
            let Some(part) = next else {
                if nested.pop().is_none() {
                    break;
                }
                continue;
            };

            let media_type = part.media_type()?;
            match media_type.essence() {
                "text/plain" => {
                    if found.text.is_some() {
                        tracing::debug!("later text/plain part replaces an earlier one");
                    }
                    found.text = Some(decode_part(part, &media_type).await?);
                }
                "text/html" => {
                    if found.html.is_some() {
                        tracing::debug!("later text/html part replaces an earlier one");
                    }
                    found.html = Some(decode_part(part, &media_type).await?);
                }
                _ if media_type.is_multipart() => {
                    let depth = nested.len() + 2;
                    if depth > self.config.max_depth {
                        return Err(nesting_error(self.config.max_depth));
                    }
                    let inner = media_type.boundary().ok_or(Error::MissingBoundary)?;
                    tracing::trace!(depth, mediatype = media_type.essence(), "entering nested multipart");
                    nested.push(multipart::Reader::with_config(part, inner, self.config));
                }
                other => tracing::debug!(mediatype = other, "skipping non-text part"),
            }
        }

        Ok(StructuredMessage::new(header, found.text, found.html))
    }
}

fn nesting_error(max_depth: usize) -> Error {
    Error::Multipart(format!("multipart nesting deeper than {max_depth}"))
}

/// Strips the part's transfer encoding, then transcodes with its charset.
async fn decode_part(part: Part, media_type: &MediaType) -> Result<Bytes> {
    let encoding = part.transfer_encoding()?;
    tracing::trace!(
        mediatype = media_type.essence(),
        encoding = encoding.as_str(),
        charset = media_type.charset(),
        "decoding part"
    );
    let decoded = encoding.decode(part).await?;
    charset::decode_text(&decoded[..], media_type.charset()).await
}
