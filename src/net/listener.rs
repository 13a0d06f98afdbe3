//! TCP listener binding.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Address did not parse.
    #[error("invalid bind address `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener on `bind_address`.
pub async fn bind(bind_address: &str) -> Result<TcpListener, ListenerError> {
    let address: SocketAddr = bind_address.parse().map_err(|source| ListenerError::Address {
        address: bind_address.to_string(),
        source,
    })?;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ListenerError::Bind { address, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { address, source })?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn rejects_garbage_address() {
        assert!(matches!(
            bind("localhost-ish").await,
            Err(ListenerError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn port_in_use() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap().to_string();
        assert!(matches!(bind(&taken).await, Err(ListenerError::Bind { .. })));
    }
}
