//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → capture::normalize (build the record, publish it)
//!     → routing::RuleSet::resolve (pick the canned response)
//!     → response.rs (headers, status, body)
//!     → Send to client
//! ```

pub mod headers;
pub mod response;
pub mod server;

pub use headers::{parse_headers, HeaderValues};
pub use server::HttpServer;
