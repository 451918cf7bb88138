use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::error::StorageError;
use super::traits::BoxReader;

/// Raised through `io::Error` when a stream is shorter or longer than declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "declared {} bytes, stream delivered {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for SizeMismatch {}

/// Reader adapter that fails unless the wrapped stream yields exactly `expected` bytes.
///
/// Overlong streams fail as soon as the excess is observed; short streams fail
/// at end of input.
pub struct ExactSizeReader<R> {
    inner: R,
    expected: u64,
    read: u64,
}

impl<R> ExactSizeReader<R> {
    pub fn new(inner: R, expected: u64) -> Self {
        Self {
            inner,
            expected,
            read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    fn mismatch(&self) -> io::Error {
        io::Error::other(SizeMismatch {
            expected: self.expected,
            actual: self.read,
        })
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ExactSizeReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let had_room = buf.remaining() > 0;
        let before = buf.filled().len();

        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;

        let n = (buf.filled().len() - before) as u64;
        this.read += n;

        if this.read > this.expected || (had_room && n == 0 && this.read < this.expected) {
            return Poll::Ready(Err(this.mismatch()));
        }
        Poll::Ready(Ok(()))
    }
}

/// Copy exactly `size` bytes from `reader` into `writer`.
pub async fn copy_exact<W>(reader: BoxReader<'_>, writer: &mut W, size: u64) -> Result<u64, StorageError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut reader = ExactSizeReader::new(reader, size);
    let copied = tokio::io::copy(&mut reader, writer).await?;
    Ok(copied)
}
