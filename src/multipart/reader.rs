//! Multipart MIME reader.
//!
//! Implements RFC 2046 multipart parsing with async I/O. Each part's body is
//! read into memory up to the next boundary line; the line break before a
//! boundary belongs to the boundary and is not part of the body.

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::grammar::{skip_lwsp, trim_line_ending};
use crate::header::{read_header, Header};
use crate::media_type::MediaType;
use crate::transfer::TransferEncoding;
use bytes::{Buf, Bytes};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, ReadBuf};

const PEEK_BUFFER_SIZE: usize = 4096;

/// Room for a delimiter line's transport padding past the boundary itself.
const DELIMITER_SLACK: usize = 256;

/// What a line means relative to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// `--boundary`: another part follows.
    Delimiter,
    /// `--boundary--`: no more parts.
    Close,
    /// Any other line.
    None,
}

/// A multipart MIME reader.
pub struct Reader<R> {
    buf_reader: BufReader<R>,
    dash_boundary: Vec<u8>,
    pending: Option<Vec<u8>>,
    parts_read: usize,
    done: bool,
    config: ParserConfig,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    /// Creates a new multipart reader with the given boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::multipart::Reader;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> tokio_mailutil::Result<()> {
    /// let data = b"--frontier\r\nContent-Type: text/plain\r\n\r\nhi\r\n--frontier--\r\n";
    /// let mut reader = Reader::new(&data[..], "frontier");
    /// let part = reader.next_part().await?.unwrap();
    /// assert_eq!(part.body(), b"hi");
    /// assert!(reader.next_part().await?.is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(r: R, boundary: &str) -> Self {
        Self::with_config(r, boundary, ParserConfig::default())
    }

    /// Creates a reader that enforces the given limits.
    pub fn with_config(r: R, boundary: &str, config: ParserConfig) -> Self {
        Self {
            buf_reader: BufReader::with_capacity(PEEK_BUFFER_SIZE, r),
            dash_boundary: format!("--{boundary}").into_bytes(),
            pending: None,
            parts_read: 0,
            done: false,
            config,
        }
    }

    /// Returns the next part in the multipart body.
    ///
    /// Returns `None` once the closing boundary has been read. Input that
    /// ends before the closing boundary is an `UnexpectedEof` error.
    pub async fn next_part(&mut self) -> Result<Option<Part>> {
        if self.dash_boundary.len() <= 2 {
            return Err(Error::Multipart("boundary is empty".to_string()));
        }
        if self.done {
            return Ok(None);
        }

        let mut preamble = 0;
        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => {
                    let limit = self.config.max_part_bytes.saturating_sub(preamble);
                    self.read_line(limit).await?
                }
            };

            match self.classify(&line) {
                Boundary::Close => {
                    self.done = true;
                    return Ok(None);
                }
                Boundary::Delimiter => {
                    let header = read_header(&mut self.buf_reader, &self.config).await?;
                    let body = self.read_body().await?;
                    self.parts_read += 1;
                    tracing::trace!(part = self.parts_read, len = body.len(), "read multipart part");
                    return Ok(Some(Part { header, body }));
                }
                Boundary::None if self.parts_read == 0 => {
                    preamble += line.len();
                    if preamble > self.config.max_part_bytes {
                        return Err(Error::MessageTooLarge);
                    }
                }
                Boundary::None => {
                    return Err(Error::Multipart(format!(
                        "unexpected line between parts: {:?}",
                        String::from_utf8_lossy(&line)
                    )));
                }
            }
        }
    }

    /// Reads one line of at most `limit` bytes, plus room for a delimiter.
    async fn read_line(&mut self, limit: usize) -> Result<Vec<u8>> {
        let limit = limit.saturating_add(self.dash_boundary.len() + DELIMITER_SLACK);
        let mut line = Vec::new();
        let n = (&mut self.buf_reader)
            .take((limit as u64).saturating_add(1))
            .read_until(b'\n', &mut line)
            .await?;
        if n > limit {
            tracing::warn!(limit = self.config.max_part_bytes, "multipart line exceeds size limit");
            return Err(Error::MessageTooLarge);
        }
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "multipart body ended before the closing boundary",
            )));
        }
        Ok(line)
    }

    /// Reads body lines until a boundary line, which is kept for the next call.
    async fn read_body(&mut self) -> Result<Bytes> {
        let mut data = Vec::new();
        loop {
            let line = self
                .read_line(self.config.max_part_bytes.saturating_sub(data.len()))
                .await?;
            if self.classify(&line) != Boundary::None {
                self.pending = Some(line);
                break;
            }
            data.extend_from_slice(&line);
            if data.len() > self.config.max_part_bytes {
                tracing::warn!(limit = self.config.max_part_bytes, "multipart part exceeds size limit");
                return Err(Error::MessageTooLarge);
            }
        }

        let body_len = trim_line_ending(&data).len();
        data.truncate(body_len);
        Ok(Bytes::from(data))
    }

    fn classify(&self, line: &[u8]) -> Boundary {
        let Some(rest) = line.strip_prefix(&self.dash_boundary[..]) else {
            return Boundary::None;
        };
        if let Some(after) = rest.strip_prefix(b"--") {
            if is_line_end(skip_lwsp(after)) {
                return Boundary::Close;
            }
        }
        if is_line_end(skip_lwsp(rest)) {
            return Boundary::Delimiter;
        }
        Boundary::None
    }
}

fn is_line_end(b: &[u8]) -> bool {
    b.is_empty() || b == b"\r\n" || b == b"\n"
}

/// A single part in a multipart body.
///
/// The body is held in memory and can be read once through `AsyncRead`.
#[derive(Debug, Clone)]
pub struct Part {
    /// The MIME headers of this part.
    pub header: Header,
    body: Bytes,
}

impl Part {
    /// The part's media type; a missing `Content-Type` means `text/plain`.
    pub fn media_type(&self) -> Result<MediaType> {
        match self.header.get("Content-Type") {
            Some(v) => MediaType::parse(v),
            None => Ok(MediaType::default()),
        }
    }

    /// The part's `Content-Transfer-Encoding`.
    pub fn transfer_encoding(&self) -> Result<TransferEncoding> {
        TransferEncoding::from_header(self.header.get("Content-Transfer-Encoding"))
    }

    /// The unread remainder of the raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl AsyncRead for Part {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = self.body.len().min(buf.remaining());
        buf.put_slice(&self.body[..n]);
        self.body.advance(n);
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_multipart_reader() {
        let data = b"--boundary\r\n\
Content-Type: text/plain\r\n\
\r\n\
Hello World\r\n\
--boundary\r\n\
Content-Type: text/html\r\n\
\r\n\
<html>test</html>\r\n\
--boundary--\r\n";

        let mut reader = Reader::new(&data[..], "boundary");

        let mut part1 = reader.next_part().await.unwrap().unwrap();
        assert_eq!(part1.header.get("content-type"), Some("text/plain"));
        let mut body1 = String::new();
        part1.read_to_string(&mut body1).await.unwrap();
        assert_eq!(body1, "Hello World");

        let part2 = reader.next_part().await.unwrap().unwrap();
        assert_eq!(part2.media_type().unwrap().essence(), "text/html");
        assert_eq!(part2.body(), b"<html>test</html>");

        assert!(reader.next_part().await.unwrap().is_none());
        assert!(reader.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_preamble_epilogue_and_bare_lf() {
        let data = b"This is a preamble.\n\
--b\n\
\n\
first\n\
line two\n\
--b--\n\
epilogue --b\n";

        let mut reader = Reader::new(&data[..], "b");
        let part = reader.next_part().await.unwrap().unwrap();
        assert!(part.header.is_empty());
        assert_eq!(part.media_type().unwrap().essence(), "text/plain");
        assert_eq!(part.transfer_encoding().unwrap(), TransferEncoding::SevenBit);
        assert_eq!(part.body(), b"first\nline two");
        assert!(reader.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_boundary_prefix_is_not_a_delimiter() {
        let data = b"--abc\r\n\r\n--abcd is body text\r\n--abc--";
        let mut reader = Reader::new(&data[..], "abc");
        let part = reader.next_part().await.unwrap().unwrap();
        assert_eq!(part.body(), b"--abcd is body text");
        assert!(reader.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_body_and_transport_padding() {
        let data = b"--b  \r\n\r\n\r\n--b-- \r\n";
        let mut reader = Reader::new(&data[..], "b");
        let part = reader.next_part().await.unwrap().unwrap();
        assert!(part.body().is_empty());
        assert!(reader.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_close_boundary() {
        let data = b"--b\r\n\r\nunterminated\r\n";
        let mut reader = Reader::new(&data[..], "b");
        match reader.next_part().await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut reader = Reader::new(&b"no boundaries at all\r\n"[..], "b");
        assert!(matches!(reader.next_part().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_empty_boundary() {
        let mut reader = Reader::new(&b"--\r\n"[..], "");
        assert!(matches!(reader.next_part().await, Err(Error::Multipart(_))));
    }

    #[tokio::test]
    async fn test_part_size_limit() {
        let data = b"--b\r\n\r\n0123456789\r\n0123456789\r\n--b--\r\n";
        let config = ParserConfig::default().with_max_part_bytes(16);
        let mut reader = Reader::with_config(&data[..], "b", config);
        assert!(matches!(reader.next_part().await, Err(Error::MessageTooLarge)));
    }

    #[tokio::test]
    async fn test_unterminated_line_stops_at_limit() {
        let config = ParserConfig::default().with_max_part_bytes(1024);

        // Neither stream ever yields a newline.
        let body = AsyncReadExt::chain(&b"--b\r\n\r\n"[..], tokio::io::repeat(b'x'));
        let mut reader = Reader::with_config(body, "b", config);
        assert!(matches!(reader.next_part().await, Err(Error::MessageTooLarge)));

        let mut reader = Reader::with_config(tokio::io::repeat(b'x'), "b", config);
        assert!(matches!(reader.next_part().await, Err(Error::MessageTooLarge)));
    }
}
