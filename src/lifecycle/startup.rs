//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the rule set from flags or a responses file
//! - Initialize metrics and TLS
//! - Start the log consumer, then bind and serve
//! - Wait for the consumer to drain before reporting completion
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener starts last (traffic only when ready)

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::capture::{self, renderer_for, ConsumerSummary, LogConsumer};
use crate::config::{load_responses, ConfigError, ServerConfig};
use crate::http::{parse_headers, HttpServer};
use crate::lifecycle::Shutdown;
use crate::net::{self_signed_config, TlsError};
use crate::observability::metrics;
use crate::routing::{RuleSet, RuleSetError};

/// Fatal error before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rules(#[from] RuleSetError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("log consumer panicked: {0}")]
    Consumer(#[from] tokio::task::JoinError),
}

/// Build the rule set: the responses file when configured, otherwise a
/// single catch-all rule from the flat response settings.
pub fn load_rules(config: &ServerConfig) -> Result<RuleSet, StartupError> {
    let settings = &config.response;

    let Some(path) = &settings.file else {
        let headers = parse_headers(&settings.headers);
        return Ok(RuleSet::canned(settings.status, settings.body.clone(), &headers)?);
    };

    if !settings.headers.is_empty() || settings.body.is_some() {
        tracing::warn!(
            file = %path.display(),
            "Responses file set; flat response body and headers are ignored"
        );
    }

    let file = load_responses(path)?;
    let rules = RuleSet::compile(&file)?;
    tracing::info!(
        file = %path.display(),
        routes = rules.routes().len(),
        "Loaded responses file"
    );
    Ok(rules)
}

/// Run the server described by `config` until `shutdown` triggers.
///
/// Captured requests are written to stdout.
pub async fn run(config: ServerConfig, shutdown: Shutdown) -> Result<ConsumerSummary, StartupError> {
    if config.metrics.enabled {
        let addr: SocketAddr = config
            .metrics
            .address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.metrics.address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    serve(&config, listener, std::io::stdout(), shutdown.subscribe()).await
}

/// Serve on an already bound listener, rendering captured requests to `out`.
///
/// Returns once the server has stopped and every buffered record has been
/// handed to the renderer.
pub async fn serve<W>(
    config: &ServerConfig,
    listener: TcpListener,
    out: W,
    shutdown: broadcast::Receiver<()>,
) -> Result<ConsumerSummary, StartupError>
where
    W: Write + Send + 'static,
{
    let rules = Arc::new(load_rules(config)?);

    let tls = if config.listener.tls_self_signed {
        Some(self_signed_config(&config.listener.tls_names).await?)
    } else {
        None
    };

    let (sender, receiver) = capture::channel(config.capture.buffer_size);
    let consumer = LogConsumer::new(receiver, renderer_for(config.log.format, out)).spawn();
    tracing::info!(
        buffer_size = sender.capacity(),
        format = ?config.log.format,
        "Log consumer started"
    );

    let mut server = HttpServer::new(config, rules, sender);
    if let Some(tls) = tls {
        server = server.with_tls(tls);
    }

    let served = server.run(listener, shutdown).await;

    // The server owned the last sender; the consumer now sees a closed
    // channel and exits after draining what is buffered.
    let summary = consumer.await?;
    tracing::info!(
        rendered = summary.rendered,
        failed = summary.failed,
        "Captured requests flushed"
    );

    served?;
    Ok(summary)
}
