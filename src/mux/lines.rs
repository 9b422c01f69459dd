//! Newline-delimited input shared by the stdin and controller readers.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Longest accepted line, terminator excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Reads `\n`-terminated lines of arbitrary bytes.
///
/// A trailing `\r` is dropped and bytes that are not UTF-8 are replaced
/// with U+FFFD, so garbage reaches the elevator as an unknown command
/// instead of failing the read. A line longer than the limit is an
/// `InvalidData` error.
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    limit: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_LINE_LEN)
    }

    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            limit,
        }
    }

    /// Next line, or `None` at end of input. A final line without a
    /// terminator is still returned.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break;
            }

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            let content = if done { used - 1 } else { used };
            // One extra byte for a `\r` that is stripped below.
            if self.buf.len() + content > self.limit + 1 {
                return Err(too_long(self.limit));
            }

            self.buf.extend_from_slice(&available[..content]);
            self.inner.consume(used);
            if done {
                break;
            }
        }

        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        if self.buf.len() > self.limit {
            return Err(too_long(self.limit));
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

fn too_long(limit: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line longer than {limit} bytes"),
    )
}
