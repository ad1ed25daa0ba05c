//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use httplog::capture::ConsumerSummary;
use httplog::config::ServerConfig;
use httplog::lifecycle::{startup, Shutdown, StartupError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// In-memory sink standing in for stdout.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Captured records, one parsed JSON value per line.
    #[allow(dead_code)]
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A running server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub output: SharedBuffer,
    shutdown: Shutdown,
    handle: JoinHandle<Result<ConsumerSummary, StartupError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait until every captured record is written.
    pub async fn stop(self) -> ConsumerSummary {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap()
    }
}

/// Start a server for `config` on 127.0.0.1 with an in-memory log sink.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let output = SharedBuffer::default();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let sink = output.clone();

    let handle = tokio::spawn(async move { startup::serve(&config, listener, sink, receiver).await });

    TestServer {
        addr,
        output,
        shutdown,
        handle,
    }
}

/// Client that never reuses connections, so shutdown is not held up by idle sockets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
