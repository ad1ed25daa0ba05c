//! Configuration schema definitions.
//!
//! This module defines the server configuration and the responses file
//! format. All types derive Serde traits for deserialization from config
//! files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capture::{LogFormat, DEFAULT_BUFFER_SIZE};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Capture pipeline settings.
    pub capture: CaptureConfig,

    /// Output format and diagnostic log level.
    pub log: LogConfig,

    /// Canned response, or the responses file replacing it.
    pub response: ResponseSettings,

    /// Prometheus metrics settings.
    pub metrics: MetricsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "localhost:8080"). Host names are resolved.
    pub bind_address: String,

    /// Serve TLS with a freshly generated self-signed certificate.
    pub tls_self_signed: bool,

    /// Subject alternative names for the self-signed certificate.
    pub tls_names: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:8080".to_string(),
            tls_self_signed: false,
            tls_names: vec!["httplog".to_string(), "localhost".to_string()],
        }
    }
}

/// Capture pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Records buffered before request handlers start waiting.
    pub buffer_size: usize,

    /// Maximum body bytes kept per record (unlimited when unset).
    pub max_body_bytes: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_body_bytes: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// How captured requests are written to stdout.
    pub format: LogFormat,

    /// Diagnostic log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

/// Canned response settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseSettings {
    /// Status sent for every request.
    pub status: u16,

    /// Body sent for every request.
    pub body: Option<String>,

    /// Headers sent for every request, as `KEY=VALUE` strings.
    pub headers: Vec<String>,

    /// Responses file; replaces `status` and `body` when set.
    pub file: Option<PathBuf>,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            status: 200,
            body: None,
            headers: Vec::new(),
            file: None,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A responses file: routed canned responses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponsesFile {
    /// Responses in evaluation order.
    pub responses: Vec<ResponseConfig>,

    /// Headers sent with every response.
    pub headers: HeaderConfig,

    /// Sent when no response path matches.
    pub not_found: Option<ResponseConfig>,

    /// Sent when a path matches but no response accepts the method.
    pub method_not_allowed: Option<ResponseConfig>,
}

/// A single configured response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Method to match; any method when unset.
    pub method: Option<String>,

    /// Path pattern. Placeholders like `{id}` are accepted and ignored.
    pub path: String,

    /// Status code; 0 means 200.
    pub status: u16,

    /// Headers for this response only.
    pub headers: HeaderConfig,

    /// Literal body.
    pub body: Option<String>,

    /// File streamed as the body when `body` is unset.
    pub file: Option<PathBuf>,
}

/// Header name to one or more values.
pub type HeaderConfig = BTreeMap<String, HeaderValueConfig>;

/// A header value written either as a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderValueConfig {
    One(String),
    Many(Vec<String>),
}

impl HeaderValueConfig {
    pub fn values(&self) -> &[String] {
        match self {
            HeaderValueConfig::One(value) => std::slice::from_ref(value),
            HeaderValueConfig::Many(values) => values,
        }
    }
}

impl From<Vec<String>> for HeaderValueConfig {
    fn from(values: Vec<String>) -> Self {
        HeaderValueConfig::Many(values)
    }
}
