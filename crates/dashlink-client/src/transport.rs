//! TLS transport to the app server
//!
//! Establishes the encrypted stream the session engine runs over. The
//! engine itself is transport-agnostic (anything `AsyncRead + AsyncWrite`
//! works, see [`crate::AppClient::connect_with`]); this module provides
//! the production path.

use tokio::net::TcpStream;
use tokio_native_tls::native_tls;
use tokio_native_tls::{TlsConnector, TlsStream};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Open a TLS connection to the configured app server.
///
/// Honors `accept_invalid_certs` (private servers present self-signed
/// certificates) and bounds the TCP connect plus TLS handshake by
/// `connect_timeout`.
pub async fn connect(config: &ClientConfig) -> Result<TlsStream<TcpStream>, ClientError> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    let connector = TlsConnector::from(connector);

    let address = config.address();
    tracing::debug!(%address, "connecting to app server");

    let handshake = async {
        let tcp = TcpStream::connect(&address).await?;
        let tls = connector.connect(&config.host, tcp).await?;
        Ok::<_, ClientError>(tls)
    };

    let stream = tokio::time::timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| {
            ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connecting to {address} timed out"),
            ))
        })??;

    tracing::debug!(%address, "TLS handshake complete");
    Ok(stream)
}
