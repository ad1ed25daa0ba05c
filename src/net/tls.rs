//! TLS configuration.
//!
//! Certificates are generated in memory at startup and never written to disk.

use axum_server::tls_rustls::RustlsConfig;
use rcgen::{generate_simple_self_signed, CertifiedKey};

/// Error building the TLS configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to generate self-signed certificate: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("failed to build rustls config: {0}")]
    Config(#[from] std::io::Error),
}

/// Build a rustls config around a fresh self-signed certificate for `names`.
pub async fn self_signed_config(names: &[String]) -> Result<RustlsConfig, TlsError> {
    let CertifiedKey { cert, signing_key } = generate_simple_self_signed(names.to_vec())?;
    tracing::info!(names = ?names, "Generated self-signed certificate");

    let config = RustlsConfig::from_pem(cert.pem().into_bytes(), signing_key.serialize_pem().into_bytes()).await?;
    Ok(config)
}
