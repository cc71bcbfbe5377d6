//! Error types for the mail decoder.

use std::io;
use thiserror::Error;

/// The main error type for mail decoding.
///
/// Every variant aborts the parse it came from; no partially decoded
/// message is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The header block could not be parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A `Content-Type` value is present but not a valid media type.
    #[error("malformed content type: {0}")]
    MalformedContentType(String),

    /// A multipart media type was declared without a boundary parameter.
    #[error("multipart content type has no boundary")]
    MissingBoundary,

    /// The top-level media type is neither `text/*` nor `multipart/*`.
    #[error("Unsupported Media Type: {mediatype}")]
    UnsupportedMediaType {
        /// The lowercased `type/subtype` that was rejected.
        mediatype: String,
    },

    /// A part declared a `Content-Transfer-Encoding` outside the supported set.
    #[error("Unsupported Content Transfer Encoding: {encoding}")]
    UnsupportedTransferEncoding {
        /// The encoding as it was declared.
        encoding: String,
    },

    /// Payload bytes are not valid for their transfer encoding or charset.
    #[error("decode error: {0}")]
    Decode(String),

    /// The multipart structure is broken.
    #[error("multipart error: {0}")]
    Multipart(String),

    /// A configured size or count limit was exceeded.
    #[error("message too large")]
    MessageTooLarge,

    /// An address-list header could not be parsed.
    #[error("invalid address list: {0}")]
    InvalidAddress(String),

    /// A requested header field is not present.
    #[error("missing header: {0}")]
    MissingHeader(String),
}

/// Specialized Result type for mail decoding.
pub type Result<T> = std::result::Result<T, Error>;

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Decode(format!("base64: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedMediaType {
            mediatype: "application/pdf".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported Media Type: application/pdf");

        let err = Error::UnsupportedTransferEncoding {
            encoding: "x-uuencode".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported Content Transfer Encoding: x-uuencode"
        );

        assert_eq!(
            Error::MissingBoundary.to_string(),
            "multipart content type has no boundary"
        );
        assert_eq!(Error::MessageTooLarge.to_string(), "message too large");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("stream ended"));
    }

    #[test]
    fn test_base64_error_conversion() {
        let err: Error = base64::DecodeError::InvalidLength.into();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().starts_with("decode error: base64"));
    }
}
