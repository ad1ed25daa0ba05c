//! httplog (v1)
//!
//! Accepts any HTTP request, writes a normalized record of it to stdout and
//! answers with a canned response.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ capture::normalize ──▶ capture channel ──▶ log consumer ──▶ stdout
//!                          │                                   (bounded, blocks
//!                          ▼                                    when full)
//!                     routing::RuleSet
//!                          │
//!     Client Response      ▼
//!     ◀────────────── http::response (global headers, rule headers, status, body)
//! ```
//!
//! Diagnostics go to stderr, so stdout can be piped straight into other tools.

use std::path::PathBuf;

use clap::Parser;

use httplog::capture::LogFormat;
use httplog::config::{load_config, validate_config, ConfigError, ServerConfig};
use httplog::lifecycle::{signals, startup, Shutdown};
use httplog::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "httplog")]
#[command(version, about = "Log every HTTP request and answer with a canned response", long_about = None)]
struct Cli {
    /// Server config file (TOML). Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, value_name = "HOST:PORT")]
    listen: Option<String>,

    /// Body sent with every response.
    #[arg(short, long)]
    response: Option<String>,

    /// Status code sent with every response.
    #[arg(long, value_name = "CODE")]
    response_code: Option<u16>,

    /// Header sent with every response; repeatable.
    #[arg(short = 'H', long = "header", value_name = "KEY=VALUE")]
    headers: Vec<String>,

    /// Responses file (YAML, or TOML by extension) with routed responses.
    #[arg(long, value_name = "FILE")]
    responses: Option<PathBuf>,

    /// Write captured requests as JSON lines.
    #[arg(long)]
    json: bool,

    /// Serve TLS with a generated self-signed certificate.
    #[arg(long)]
    tls_self_cert: bool,

    /// Captured requests buffered before requests start waiting.
    #[arg(long, value_name = "N")]
    buffer_size: Option<usize>,

    /// Maximum body bytes kept per captured request.
    #[arg(long, value_name = "BYTES")]
    max_body_bytes: Option<usize>,

    /// Diagnostic log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Expose Prometheus metrics on this address.
    #[arg(long, value_name = "HOST:PORT")]
    metrics: Option<String>,
}

impl Cli {
    /// Overlay command line values onto `config`.
    fn apply(self, config: &mut ServerConfig) {
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if self.tls_self_cert {
            config.listener.tls_self_signed = true;
        }
        if let Some(body) = self.response {
            config.response.body = Some(body);
        }
        if let Some(status) = self.response_code {
            config.response.status = status;
        }
        config.response.headers.extend(self.headers);
        if let Some(file) = self.responses {
            config.response.file = Some(file);
        }
        if self.json {
            config.log.format = LogFormat::Json;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(size) = self.buffer_size {
            config.capture.buffer_size = size;
        }
        if let Some(limit) = self.max_body_bytes {
            config.capture.max_body_bytes = Some(limit);
        }
        if let Some(address) = self.metrics {
            config.metrics.enabled = true;
            config.metrics.address = address;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.log.level.to_ascii_lowercase());

    tracing::info!("httplog v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls_self_signed,
        buffer_size = config.capture.buffer_size,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let summary = startup::run(config, shutdown).await?;

    tracing::info!(
        rendered = summary.rendered,
        failed = summary.failed,
        "Shutdown complete"
    );
    Ok(())
}
