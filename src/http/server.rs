//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (tracing with request IDs)
//! - Capture every request, publish it, then answer from the rule set
//! - Serve plain TCP or TLS, with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::capture::{self, CaptureSender};
use crate::config::ServerConfig;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::RuleSet;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleSet>,
    pub capture: CaptureSender,
    pub max_body_bytes: Option<usize>,
}

/// HTTP server answering every request with a canned response.
pub struct HttpServer {
    router: Router,
    tls: Option<RustlsConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given rules and capture channel.
    pub fn new(config: &ServerConfig, rules: Arc<RuleSet>, capture: CaptureSender) -> Self {
        let state = AppState {
            rules,
            capture,
            max_body_bytes: config.capture.max_body_bytes,
        };

        Self {
            router: build_router(state),
            tls: None,
        }
    }

    /// Serve TLS with the given rustls configuration.
    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Run the server until `shutdown` fires and in-flight requests finish.
    ///
    /// The router, and with it every capture sender it holds, is dropped
    /// before this returns.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.tls.is_some(),
            "HTTP server starting"
        );

        match self.tls {
            None => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                        tracing::info!("Shutdown signal received, draining connections");
                    })
                    .await?;
            }
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let signal = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Shutdown signal received, draining connections");
                    signal.graceful_shutdown(None::<Duration>);
                });

                axum_server::from_tcp_rustls(listener.into_std()?, tls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(capture_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
}

/// Catch-all handler.
/// Captures the request, publishes it, and answers from the rule set.
async fn capture_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let record = capture::normalize(&parts, body, state.max_body_bytes).await;
    let path = record.path.clone();

    // Hyper drops this future when the client disconnects. The publish runs
    // as its own task so a record waiting on a full channel still lands.
    let sender = state.capture.clone();
    let publish = tokio::spawn(async move { sender.publish(record).await });
    match publish.await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::warn!(error = %error, path = %path, "Captured request was not logged");
        }
        Err(error) => {
            tracing::error!(error = %error, path = %path, "Capture publish task failed");
        }
    }

    let resolution = state.rules.resolve(parts.method.as_str(), &path);
    tracing::debug!(
        path = %path,
        outcome = resolution.kind(),
        status = resolution.response().status.as_u16(),
        "Resolved canned response"
    );

    let response = response::emit(state.rules.global_headers(), resolution.response()).await;
    metrics::record_request(parts.method.as_str(), response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HeaderValueConfig, ResponseConfig, ResponsesFile};
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    fn rules() -> Arc<RuleSet> {
        let mut file = ResponsesFile {
            responses: vec![
                ResponseConfig {
                    method: Some("GET".into()),
                    path: "/a".into(),
                    body: Some("get a".into()),
                    ..Default::default()
                },
                ResponseConfig {
                    method: Some("POST".into()),
                    path: "/a".into(),
                    status: 201,
                    ..Default::default()
                },
            ],
            method_not_allowed: Some(ResponseConfig {
                status: 405,
                ..Default::default()
            }),
            not_found: Some(ResponseConfig {
                status: 404,
                body: Some("nope".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        file.headers
            .insert("X-Server".into(), HeaderValueConfig::One("httplog".into()));
        Arc::new(RuleSet::compile(&file).unwrap())
    }

    fn router(capture: CaptureSender) -> Router {
        build_router(AppState {
            rules: rules(),
            capture,
            max_body_bytes: None,
        })
    }

    #[tokio::test]
    async fn answers_from_rules_and_captures_request() {
        let (sender, mut receiver) = capture::channel(4);
        let app = router(sender);

        let response = app
            .oneshot(
                http::Request::builder()
                    .method("POST")
                    .uri("/a?x=1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"n":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-server").unwrap(), "httplog");

        let record = receiver.recv().await.unwrap();
        assert_eq!(record.method, "POST");
        assert_eq!(record.path, "/a");
        assert_eq!(record.query["x"], vec!["1"]);
        assert_eq!(record.body.as_deref(), Some(r#"{"n":1}"#));
    }

    #[tokio::test]
    async fn unsupported_method_on_known_path_is_not_not_found() {
        let (sender, _receiver) = capture::channel(4);
        let response = router(sender)
            .oneshot(http::Request::builder().method("PUT").uri("/a").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_path_gets_not_found_response() {
        let (sender, _receiver) = capture::channel(4);
        let response = router(sender)
            .oneshot(http::Request::builder().uri("/zzz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"nope");
    }

    #[tokio::test]
    async fn closed_channel_does_not_fail_the_response() {
        let (sender, receiver) = capture::channel(4);
        drop(receiver);

        let response = router(sender)
            .oneshot(http::Request::builder().uri("/a").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"get a");
    }

    fn filler(path: &str) -> capture::CapturedRequest {
        capture::CapturedRequest {
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

    /// Serve the test router on a real socket.
    async fn spawn_server(capture: CaptureSender) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(capture);
        tokio::spawn(async move { axum::serve(listener, app).await });
        addr
    }

    #[tokio::test]
    async fn client_disconnect_while_channel_is_full_keeps_the_record() {
        let (sender, mut receiver) = capture::channel(1);
        sender.publish(filler("/filler")).await.unwrap();
        let addr = spawn_server(sender).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /after-body HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\n\r\nhi")
            .await
            .unwrap();
        // Let the handler read the body and start waiting on the full channel.
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(stream);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(receiver.recv().await.unwrap().path, "/filler");
        let record = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("record for /after-body was lost")
            .unwrap();
        assert_eq!(record.path, "/after-body");
        assert_eq!(record.body.as_deref(), Some("aGk="));
    }

    #[tokio::test]
    async fn client_disconnect_mid_body_captures_what_was_read() {
        let (sender, mut receiver) = capture::channel(4);
        let addr = spawn_server(sender).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /partial HTTP/1.1\r\nHost: localhost\r\nContent-Length: 10\r\n\r\nabcd")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(stream);

        let record = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("partial request was not captured")
            .unwrap();
        assert_eq!(record.path, "/partial");
        assert_eq!(record.body.as_deref(), Some("YWJjZA=="));
    }
}
