//! Network layer.
//!
//! Listeners are plain `tokio::net::TcpListener`s bound in `lifecycle::startup`;
//! this module only provides the optional TLS configuration.

pub mod tls;

pub use tls::{self_signed_config, TlsError};
