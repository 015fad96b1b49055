// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ingest Pipe - bounded byte conduit for streamed uploads
//!
//! Connects the Store receive loop (writer) to the deals module's store call
//! (reader) so the module can consume a payload while it is still arriving.
//!
//! - `write` suspends while `capacity` chunks are already queued, so the
//!   payload is never buffered in full.
//! - `close` ends the stream once queued chunks are drained.
//! - `close_with_error` fails every pending and later read with that error,
//!   discarding queued chunks.
//! - Both closes consume the writer, so a pipe is closed exactly once.
//!   Dropping an unclosed writer closes it with a `BrokenPipe` error: a reader
//!   never mistakes an abandoned upload for a complete one.

use bytes::Bytes;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::{mpsc, oneshot};

/// Create a pipe that queues at most `capacity` chunks (minimum 1) ahead of
/// the reader.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (chunk_tx, chunk_rx) = mpsc::channel(capacity.max(1));
    let (failure_tx, failure_rx) = oneshot::channel();

    let writer = PipeWriter {
        chunks: chunk_tx,
        failure: Some(failure_tx),
    };
    let reader = PipeReader {
        chunks: chunk_rx,
        failure: Some(failure_rx),
        failed: None,
        pending: Bytes::new(),
    };
    (writer, reader)
}

/// Write side of the ingest pipe.
pub struct PipeWriter {
    chunks: mpsc::Sender<Bytes>,
    // None once the pipe has been closed
    failure: Option<oneshot::Sender<io::Error>>,
}

impl PipeWriter {
    /// Append `chunk`, waiting while the reader is behind.
    ///
    /// Fails with `BrokenPipe` once the reader has been dropped.
    pub async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.chunks.send(chunk).await.map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "ingest pipe reader is gone")
        })
    }

    /// Signal end of stream. The reader sees EOF after draining queued chunks.
    pub fn close(mut self) {
        // Dropping the failure sender unsent marks the close as clean
        self.failure.take();
    }

    /// Fail all pending and future reads with `err`.
    pub fn close_with_error(mut self, err: io::Error) {
        if let Some(failure) = self.failure.take() {
            let _ = failure.send(err);
        }
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        // Runs before `chunks` is dropped, so the reader sees the failure
        // no later than the end of the chunk channel.
        if let Some(failure) = self.failure.take() {
            let _ = failure.send(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "ingest pipe writer dropped before close",
            ));
        }
    }
}

/// Read side of the ingest pipe.
pub struct PipeReader {
    chunks: mpsc::Receiver<Bytes>,
    failure: Option<oneshot::Receiver<io::Error>>,
    failed: Option<(io::ErrorKind, String)>,
    // Remainder of the chunk currently being read
    pending: Bytes,
}

impl PipeReader {
    /// Returns the close error once the writer has failed the pipe. Repeats on
    /// every later call.
    fn poll_failure(&mut self, cx: &mut Context<'_>) -> Option<io::Error> {
        if let Some(failure) = self.failure.as_mut() {
            match Pin::new(failure).poll(cx) {
                Poll::Ready(Ok(err)) => {
                    self.failure = None;
                    self.failed = Some((err.kind(), err.to_string()));
                }
                // Closed cleanly
                Poll::Ready(Err(_)) => self.failure = None,
                Poll::Pending => {}
            }
        }
        self.failed
            .as_ref()
            .map(|(kind, message)| io::Error::new(*kind, message.clone()))
    }
}

impl AsyncRead for PipeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if let Some(err) = this.poll_failure(cx) {
            return Poll::Ready(Err(err));
        }
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        while this.pending.is_empty() {
            match ready!(this.chunks.poll_recv(cx)) {
                Some(chunk) => this.pending = chunk,
                None => {
                    // The writer is gone; an error close was sent before that
                    if let Some(err) = this.poll_failure(cx) {
                        return Poll::Ready(Err(err));
                    }
                    return Poll::Ready(Ok(()));
                }
            }
        }

        let n = this.pending.len().min(buf.remaining());
        buf.put_slice(&this.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_reader_sees_concatenation_in_write_order() {
        let (mut writer, mut reader) = pipe(1);

        let consumer = tokio::spawn(async move {
            let mut received = Vec::new();
            reader.read_to_end(&mut received).await.map(|_| received)
        });

        for chunk in [&b"alpha-"[..], b"", b"beta-", b"gamma"] {
            writer.write(Bytes::copy_from_slice(chunk)).await.unwrap();
        }
        writer.close();

        let received = consumer.await.unwrap().unwrap();
        assert_eq!(received, b"alpha-beta-gamma");
    }

    #[tokio::test]
    async fn test_small_reads_split_chunks() {
        let (mut writer, mut reader) = pipe(2);
        writer.write(Bytes::from_static(b"abcdef")).await.unwrap();
        writer.close();

        let mut buf = [0u8; 4];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abcd");
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ef");
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_waits_for_reader() {
        let (mut writer, mut reader) = pipe(1);
        writer.write(Bytes::from_static(b"first")).await.unwrap();

        // Queue is full until the reader takes the first chunk
        let blocked = timeout(
            Duration::from_millis(50),
            writer.write(Bytes::from_static(b"second")),
        )
        .await;
        assert!(blocked.is_err());

        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"first");

        timeout(
            Duration::from_secs(1),
            writer.write(Bytes::from_static(b"second")),
        )
        .await
        .expect("write should proceed once the reader drained")
        .unwrap();
        writer.close();

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"second");
    }

    #[tokio::test]
    async fn test_close_with_error_fails_pending_and_future_reads() {
        let (mut writer, mut reader) = pipe(4);
        writer.write(Bytes::from_static(b"queued")).await.unwrap();
        writer.close_with_error(io::Error::new(io::ErrorKind::ConnectionReset, "client went away"));

        let mut buf = [0u8; 16];
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert!(err.to_string().contains("client went away"));

        let again = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(again.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn test_close_with_error_wakes_blocked_reader() {
        let (writer, mut reader) = pipe(1);

        let consumer = tokio::spawn(async move {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await
        });
        tokio::task::yield_now().await;

        writer.close_with_error(io::Error::new(io::ErrorKind::Other, "receive failed"));
        let result = timeout(Duration::from_secs(1), consumer)
            .await
            .expect("reader should be woken")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dropped_writer_is_not_a_clean_eof() {
        let (mut writer, mut reader) = pipe(1);
        writer.write(Bytes::from_static(b"partial")).await.unwrap();
        drop(writer);

        let mut received = Vec::new();
        let err = reader.read_to_end(&mut received).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_write_after_reader_dropped_fails() {
        let (mut writer, reader) = pipe(1);
        drop(reader);

        let err = writer.write(Bytes::from_static(b"orphan")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
