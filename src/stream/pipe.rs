//! In-memory byte pipe with half-close semantics
//!
//! Dropping or shutting down the writer gives the reader end-of-input once
//! buffered bytes are drained. Dropping the reader makes every pending and
//! later write fail with `BrokenPipe`, so a producer never blocks on a
//! consumer that has gone away.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// Create a pipe buffering at most `capacity` bytes
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (writer, reader) = tokio::io::duplex(capacity.max(1));
    (PipeWriter(writer), PipeReader(reader))
}

/// Write end of a [`pipe`]
#[derive(Debug)]
pub struct PipeWriter(DuplexStream);

/// Read end of a [`pipe`]
#[derive(Debug)]
pub struct PipeReader(DuplexStream);

impl AsyncWrite for PipeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

impl AsyncRead for PipeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}
