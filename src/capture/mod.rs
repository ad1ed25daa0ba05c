//! Request capture pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request (request handler task)
//!     → request.rs (read body once, build CapturedRequest)
//!     → channel.rs (bounded publish, waits when full)
//!
//! Log consumer (dedicated blocking thread)
//!     → channel.rs (pop in publish order)
//!     → render.rs (JSON line or text block)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Capture never fails a request; only backpressure can delay it
//! - One consumer owns the output sink for the server's lifetime
//! - Shutdown drops every sender, the consumer drains and exits

pub mod channel;
pub mod consumer;
pub mod render;
pub mod request;

pub use channel::{channel, CaptureReceiver, CaptureSender, PublishError, DEFAULT_BUFFER_SIZE};
pub use consumer::{ConsumerSummary, LogConsumer};
pub use render::{renderer_for, JsonRenderer, LogFormat, Render, RenderError, TextRenderer};
pub use request::{normalize, CapturedRequest, QueryValues};
