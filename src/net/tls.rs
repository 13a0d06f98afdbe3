//! TLS configuration and certificate loading.

use std::fs;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Error type for TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {}", .0.display())]
    NoCertificate(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("malformed PEM in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rejected TLS configuration: {0}")]
    Config(#[source] std::io::Error),
}

fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load TLS configuration from certificate and key files.
///
/// The PEM files are checked up front so a bad deployment fails at startup.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path)?;
    let key_pem = read(key_path)?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Malformed {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate(cert_path.to_path_buf()));
    }

    let key = rustls_pemfile::private_key(&mut key_pem.as_slice()).map_err(|source| {
        TlsError::Malformed {
            path: key_path.to_path_buf(),
            source,
        }
    })?;
    if key.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    tracing::debug!(
        cert = %cert_path.display(),
        certificates = certs.len(),
        "TLS material loaded"
    );

    RustlsConfig::from_pem(cert_pem, key_pem)
        .await
        .map_err(TlsError::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pem_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn missing_certificate_file() {
        let key = pem_file("");
        let result = load_tls_config(Path::new("/no/such/cert.pem"), key.path()).await;
        assert!(matches!(result, Err(TlsError::Read { .. })));
    }

    #[tokio::test]
    async fn empty_certificate_file() {
        let cert = pem_file("not a certificate\n");
        let key = pem_file("");
        let result = load_tls_config(cert.path(), key.path()).await;
        assert!(matches!(result, Err(TlsError::NoCertificate(_))));
    }
}
