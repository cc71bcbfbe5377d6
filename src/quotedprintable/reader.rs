//! Quoted-printable reader.
//!
//! Implements RFC 2045 quoted-printable decoding with async I/O. Decoding is
//! lenient: an `=` that does not start a valid escape or soft line break is
//! kept as a literal byte, which is what most mail clients do with damaged
//! input.

use crate::grammar::hex_byte;
use pin_project::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncBufRead, AsyncRead, BufReader, ReadBuf};

/// A quoted-printable decoder.
///
/// Implements `AsyncRead` to decode quoted-printable data on the fly, one
/// input line at a time.
#[pin_project]
pub struct Reader<R> {
    #[pin]
    inner: BufReader<R>,
    raw: Vec<u8>,
    decoded: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: AsyncRead> Reader<R> {
    /// Creates a new quoted-printable reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_mailutil::quotedprintable::Reader;
    /// use tokio::io::AsyncReadExt;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> std::io::Result<()> {
    /// let data = b"Caf=C3=A9 au=\r\n lait";
    /// let mut reader = Reader::new(&data[..]);
    /// let mut output = String::new();
    /// reader.read_to_string(&mut output).await?;
    /// assert_eq!(output, "Caf\u{e9} au lait");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            raw: Vec::new(),
            decoded: Vec::new(),
            pos: 0,
            eof: false,
        }
    }
}

impl<R: AsyncRead> AsyncRead for Reader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut this = self.project();

        loop {
            if *this.pos < this.decoded.len() {
                let available = &this.decoded[*this.pos..];
                let n = available.len().min(buf.remaining());
                buf.put_slice(&available[..n]);
                *this.pos += n;
                return Poll::Ready(Ok(()));
            }

            if *this.eof {
                return Poll::Ready(Ok(()));
            }

            // Accumulate one raw line; partial data survives a Pending.
            loop {
                let chunk = ready!(this.inner.as_mut().poll_fill_buf(cx))?;
                if chunk.is_empty() {
                    *this.eof = true;
                    break;
                }
                if let Some(pos) = chunk.iter().position(|&b| b == b'\n') {
                    this.raw.extend_from_slice(&chunk[..=pos]);
                    this.inner.as_mut().consume(pos + 1);
                    break;
                }
                let len = chunk.len();
                this.raw.extend_from_slice(chunk);
                this.inner.as_mut().consume(len);
            }

            this.decoded.clear();
            *this.pos = 0;
            decode_line(&this.raw[..], &mut *this.decoded);
            this.raw.clear();
        }
    }
}

/// Decodes a single line of quoted-printable data into `out`.
fn decode_line(line: &[u8], out: &mut Vec<u8>) {
    let has_lf = line.ends_with(b"\n");
    let has_crlf = line.ends_with(b"\r\n");

    // Transport may add trailing whitespace; it is never part of the data.
    let mut trimmed = line;
    while let Some((&last, rest)) = trimmed.split_last() {
        if matches!(last, b'\n' | b'\r' | b' ' | b'\t') {
            trimmed = rest;
        } else {
            break;
        }
    }

    let is_soft_break = trimmed.ends_with(b"=");
    if is_soft_break {
        trimmed = &trimmed[..trimmed.len() - 1];
    }

    let mut i = 0;
    while i < trimmed.len() {
        if trimmed[i] == b'=' && i + 2 < trimmed.len() {
            if let Some(byte) = hex_byte(trimmed[i + 1], trimmed[i + 2]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(trimmed[i]);
        i += 1;
    }

    if !is_soft_break && has_lf {
        if has_crlf {
            out.extend_from_slice(b"\r\n");
        } else {
            out.push(b'\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn decode(data: &[u8]) -> Vec<u8> {
        let mut reader = Reader::new(data);
        let mut output = Vec::new();
        reader.read_to_end(&mut output).await.unwrap();
        output
    }

    #[tokio::test]
    async fn test_decode_plain_text() {
        assert_eq!(decode(b"Hello World").await, b"Hello World");
    }

    #[tokio::test]
    async fn test_decode_escapes() {
        assert_eq!(decode(b"Hello=20World").await, b"Hello World");
        assert_eq!(decode(b"=48=65=6C=6c=6F").await, b"Hello");
    }

    #[tokio::test]
    async fn test_decode_soft_line_break() {
        assert_eq!(decode(b"Hello=\r\nWorld").await, b"HelloWorld");
        assert_eq!(decode(b"Hello=  \nWorld").await, b"HelloWorld");
    }

    #[tokio::test]
    async fn test_decode_hard_line_breaks_preserved() {
        assert_eq!(decode(b"Line1\r\nLine2\r\n").await, b"Line1\r\nLine2\r\n");
        assert_eq!(decode(b"Line1   \nLine2").await, b"Line1\nLine2");
    }

    #[tokio::test]
    async fn test_decode_malformed_escape_is_literal() {
        assert_eq!(decode(b"a=ZZb").await, b"a=ZZb");
        assert_eq!(decode(b"100=% sure=4").await, b"100=% sure=4");
    }

    #[tokio::test]
    async fn test_decode_shift_jis_bytes() {
        // Escapes yield raw charset bytes; transcoding happens later.
        assert_eq!(decode(b"=82=B1=82=F1").await, b"\x82\xb1\x82\xf1");
    }

    #[tokio::test]
    async fn test_small_read_buffer() {
        let mut reader = Reader::new(&b"=41=42=43\r\nDEF"[..]);
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = reader.read(&mut byte).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&byte[..n]);
        }
        assert_eq!(out, b"ABC\r\nDEF");
    }
}
