//! httplog: a diagnostic HTTP endpoint that logs every request it receives
//! and answers with configurable canned responses.

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use capture::CapturedRequest;
pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RuleSet;
