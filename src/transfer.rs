//! Content-Transfer-Encoding decoding (RFC 2045 section 6).

use crate::error::{Error, Result};
use crate::quotedprintable;
use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A supported `Content-Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// `7bit`, the RFC 2045 default when the header is absent.
    #[default]
    SevenBit,
    /// `8bit`.
    EightBit,
    /// `binary`.
    Binary,
    /// `base64`.
    Base64,
    /// `quoted-printable`.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Interprets an optional header value; absent or empty means `7bit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::TransferEncoding;
    ///
    /// assert_eq!(TransferEncoding::from_header(None).unwrap(), TransferEncoding::SevenBit);
    /// assert_eq!(
    ///     TransferEncoding::from_header(Some(" Base64 ")).unwrap(),
    ///     TransferEncoding::Base64
    /// );
    /// assert!(TransferEncoding::from_header(Some("x-uuencode")).is_err());
    /// ```
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        match value {
            Some(v) if !v.trim().is_empty() => v.parse(),
            _ => Ok(Self::SevenBit),
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }

    /// Reports whether the body bytes are used as they are.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::SevenBit | Self::EightBit | Self::Binary)
    }

    /// Reads `r` to the end and strips this transfer encoding.
    pub async fn decode<R: AsyncRead + Unpin>(self, mut r: R) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => {
                r.read_to_end(&mut out).await?;
            }
            Self::QuotedPrintable => {
                quotedprintable::Reader::new(r).read_to_end(&mut out).await?;
            }
            Self::Base64 => {
                let mut raw = Vec::new();
                r.read_to_end(&mut raw).await?;
                raw.retain(|b| !b.is_ascii_whitespace());
                out = general_purpose::STANDARD
                    .decode(&raw)
                    .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(&raw))?;
            }
        }
        Ok(out)
    }
}

impl FromStr for TransferEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.split(';').next().unwrap_or(s).trim();
        match name.to_ascii_lowercase().as_str() {
            "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            "binary" => Ok(Self::Binary),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            _ => Err(Error::UnsupportedTransferEncoding {
                encoding: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
