//! # Stream Bridge
//!
//! A bounded, in-memory hand-off channel for byte chunks, connecting a
//! producer that reads from one network service to a consumer that writes to
//! another. The channel capacity bounds memory use regardless of transfer
//! size: when the consumer is slower than the producer, `write` suspends
//! until a slot frees up, pacing the producer to the consumer's rate.
//!
//! A producer-side failure is delivered in-band with [`BridgeWriter::abort`],
//! so the consumer observes an error instead of a silently truncated stream.

use bytes::Bytes;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

/// Default channel capacity (chunks, not bytes).
pub const DEFAULT_CAPACITY: usize = 32;

/// Errors crossing the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The reading half was dropped before the transfer completed.
    #[error("bridge closed: reader dropped before the transfer completed")]
    Closed,

    /// Failure propagated from the producer side.
    #[error("source error: {0}")]
    Source(String),
}

impl BridgeError {
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}

impl From<BridgeError> for std::io::Error {
    fn from(err: BridgeError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}

/// Create a bounded bridge with the given chunk capacity.
///
/// Dropping the [`BridgeWriter`] without calling `abort` signals a clean end
/// of stream to the reader.
pub fn bounded(capacity: usize) -> (BridgeWriter, BridgeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        BridgeWriter { tx },
        BridgeReader {
            rx,
            current: None,
            position: 0,
            bytes_read: 0,
        },
    )
}

/// Producer half of the bridge.
pub struct BridgeWriter {
    tx: mpsc::Sender<Result<Bytes, BridgeError>>,
}

impl BridgeWriter {
    /// Send a chunk to the reader, waiting for channel capacity.
    ///
    /// Empty chunks are dropped without occupying a slot.
    pub async fn write(&self, chunk: Bytes) -> Result<(), BridgeError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx.send(Ok(chunk)).await.map_err(|_| BridgeError::Closed)
    }

    /// Deliver a producer-side failure to the reader and close the bridge.
    ///
    /// The reader's next poll yields the error, aborting whatever transfer it
    /// was feeding. If the reader is already gone the error is discarded.
    pub async fn abort(self, error: BridgeError) {
        let _ = self.tx.send(Err(error)).await;
    }
}

/// Consumer half of the bridge.
///
/// Usable either as a [`futures::Stream`] of chunks or as a
/// [`tokio::io::AsyncRead`], whichever fits the consuming API.
pub struct BridgeReader {
    rx: mpsc::Receiver<Result<Bytes, BridgeError>>,
    current: Option<Bytes>,
    position: usize,
    bytes_read: u64,
}

impl BridgeReader {
    /// Total bytes delivered to the consumer so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl futures::Stream for BridgeReader {
    type Item = Result<Bytes, BridgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.bytes_read += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl tokio::io::AsyncRead for BridgeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        loop {
            // Drain the chunk in hand before polling for the next one.
            if let Some(chunk) = &self.current {
                if self.position < chunk.len() {
                    let n = std::cmp::min(buf.remaining(), chunk.len() - self.position);
                    buf.put_slice(&chunk[self.position..self.position + n]);
                    self.position += n;
                    self.bytes_read += n as u64;
                    return Poll::Ready(Ok(()));
                }
                self.current = None;
                self.position = 0;
            }

            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    self.current = Some(chunk);
                    self.position = 0;
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Err(e.into())),
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
