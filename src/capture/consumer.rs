//! Log consumer draining the capture channel.
//!
//! # Responsibilities
//! - Pop records one at a time and hand them to a renderer
//! - Keep going when a single record fails to render
//! - Stop only once the channel is closed and drained
//!
//! # Design Decisions
//! - Runs on a dedicated blocking thread so slow sinks never stall request tasks
//! - Owns its renderer; no shared output state

use tokio::task::JoinHandle;

use crate::capture::channel::CaptureReceiver;
use crate::capture::render::Render;
use crate::observability::metrics;

/// Counts reported by a finished consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerSummary {
    pub rendered: u64,
    pub failed: u64,
}

/// Drains a [`CaptureReceiver`] into a renderer.
pub struct LogConsumer<R> {
    receiver: CaptureReceiver,
    renderer: R,
}

impl<R: Render> LogConsumer<R> {
    pub fn new(receiver: CaptureReceiver, renderer: R) -> Self {
        Self { receiver, renderer }
    }

    /// Render records until the channel is closed and empty.
    ///
    /// Blocks the calling thread; must not be called from async context.
    pub fn run(mut self) -> ConsumerSummary {
        let mut summary = ConsumerSummary::default();

        while let Some(record) = self.receiver.blocking_recv() {
            match self.renderer.render(&record) {
                Ok(()) => {
                    summary.rendered += 1;
                    metrics::record_rendered();
                }
                Err(error) => {
                    summary.failed += 1;
                    metrics::record_render_failure();
                    tracing::error!(
                        error = %error,
                        method = %record.method,
                        path = %record.path,
                        "Failed to render captured request"
                    );
                }
            }
        }

        tracing::debug!(
            rendered = summary.rendered,
            failed = summary.failed,
            "Capture channel drained"
        );
        summary
    }

    /// Run the consumer on the blocking thread pool.
    pub fn spawn(self) -> JoinHandle<ConsumerSummary>
    where
        R: 'static,
    {
        tokio::task::spawn_blocking(move || self.run())
    }
}
