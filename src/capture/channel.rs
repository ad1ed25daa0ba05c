//! Bounded hand-off between request handlers and the log consumer.
//!
//! # Responsibilities
//! - Carry captured requests from many producers to one consumer
//! - Apply backpressure when the consumer falls behind
//! - Close once every producer is gone, after the buffer drains
//!
//! # Design Decisions
//! - `publish` waits for space; records are never dropped on overflow
//! - FIFO in publish order, no priorities
//! - Backed by a tokio bounded mpsc channel

use std::time::Instant;

use tokio::sync::mpsc;

use crate::capture::CapturedRequest;
use crate::observability::metrics;

/// Default number of records buffered between handlers and the consumer.
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Error returned when publishing after the consumer has gone away.
#[derive(Debug, thiserror::Error)]
#[error("capture channel is closed")]
pub struct PublishError(pub Box<CapturedRequest>);

/// Create a capture channel holding at most `capacity` records.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (CaptureSender, CaptureReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CaptureSender { tx }, CaptureReceiver { rx })
}

/// Producer side, cloned into every request handler.
#[derive(Debug, Clone)]
pub struct CaptureSender {
    tx: mpsc::Sender<CapturedRequest>,
}

impl CaptureSender {
    /// Hand a record to the consumer, waiting while the channel is full.
    pub async fn publish(&self, record: CapturedRequest) -> Result<(), PublishError> {
        let started = Instant::now();
        self.tx
            .send(record)
            .await
            .map_err(|rejected| PublishError(Box::new(rejected.0)))?;
        metrics::record_capture_wait(started);
        Ok(())
    }

    /// Configured capacity of the channel.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer side, owned by the log consumer.
#[derive(Debug)]
pub struct CaptureReceiver {
    rx: mpsc::Receiver<CapturedRequest>,
}

impl CaptureReceiver {
    /// Next record, or `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<CapturedRequest> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for use off the async runtime.
    pub fn blocking_recv(&mut self) -> Option<CapturedRequest> {
        self.rx.blocking_recv()
    }

    /// Refuse further publishes. Buffered records can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(path: &str) -> CapturedRequest {
        CapturedRequest {
            method: "GET".into(),
            path: path.into(),
            query: Default::default(),
            proto: "HTTP/1.1".into(),
            host: "localhost".into(),
            headers: Default::default(),
            body: None,
            at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_blocks_when_full_until_a_record_is_taken() {
        let (sender, mut receiver) = channel(2);
        sender.publish(record("/1")).await.unwrap();
        sender.publish(record("/2")).await.unwrap();
        assert_eq!(sender.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(100), sender.publish(record("/3"))).await;
        assert!(blocked.is_err(), "third publish should wait for space");

        let producer = {
            let sender = sender.clone();
            tokio::spawn(async move { sender.publish(record("/3")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        assert_eq!(receiver.recv().await.unwrap().path, "/1");
        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("publish should complete once space frees up")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let (sender, mut receiver) = channel(8);
        for i in 0..5 {
            sender.publish(record(&format!("/{i}"))).await.unwrap();
        }
        drop(sender);

        let mut paths = Vec::new();
        while let Some(record) = receiver.recv().await {
            paths.push(record.path);
        }
        assert_eq!(paths, vec!["/0", "/1", "/2", "/3", "/4"]);
    }

    #[tokio::test]
    async fn publish_fails_after_receiver_closes() {
        let (sender, mut receiver) = channel(4);
        receiver.close();

        let error = sender.publish(record("/late")).await.unwrap_err();
        assert_eq!(error.0.path, "/late");
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (sender, _receiver) = channel(0);
        assert_eq!(sender.capacity(), 1);
        assert_eq!(DEFAULT_BUFFER_SIZE, 128);
    }
}
