//! TLS certificate bundling and configuration loading.
//!
//! The encrypted listener needs a single PEM file holding the leaf
//! certificate followed by its CA chain. [`build_bundle`] materializes that
//! file in the working directory; [`load_tls_config`] turns it and the
//! private key into a rustls configuration.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

use crate::error::ServerError;

/// File name of the materialized chain inside the working directory.
pub const BUNDLE_FILE_NAME: &str = "tlsCertBundle";

/// A certificate chain ready to be served.
///
/// `owned` is true only when the file was written by [`build_bundle`]; a
/// bundle that is just the configured leaf path must never be deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    path: PathBuf,
    owned: bool,
}

impl CertificateBundle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

/// Concatenate `leaf` and `ca_paths` (in order) into `<dest_dir>/tlsCertBundle`.
///
/// With no CA paths the leaf path is returned as-is and nothing is read or
/// written. Otherwise every input is read before anything is written, and the
/// result lands through a temp file renamed over the destination, so a failed
/// build never leaves a partial file or clobbers a previous bundle.
pub fn build_bundle<P: AsRef<Path>>(
    leaf: &Path,
    ca_paths: &[P],
    dest_dir: &Path,
) -> Result<CertificateBundle, ServerError> {
    if ca_paths.is_empty() {
        tracing::debug!(leaf = %leaf.display(), "No CA paths configured, serving leaf as-is");
        return Ok(CertificateBundle {
            path: leaf.to_path_buf(),
            owned: false,
        });
    }

    let mut data = Vec::new();
    for path in std::iter::once(leaf).chain(ca_paths.iter().map(|p| p.as_ref())) {
        let bytes = fs::read(path).map_err(|source| ServerError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read certificate");
        data.extend_from_slice(&bytes);
    }

    let dest_dir = fs::canonicalize(dest_dir).map_err(|source| ServerError::BundleWrite {
        path: dest_dir.join(BUNDLE_FILE_NAME),
        source,
    })?;
    let bundle_path = dest_dir.join(BUNDLE_FILE_NAME);

    write_owner_only(&dest_dir, &bundle_path, &data).map_err(|source| {
        ServerError::BundleWrite {
            path: bundle_path.clone(),
            source,
        }
    })?;

    metrics::counter!("muxd_bundle_builds_total").increment(1);
    tracing::info!(
        path = %bundle_path.display(),
        certificates = ca_paths.len() + 1,
        bytes = data.len(),
        "Certificate bundle written"
    );

    Ok(CertificateBundle {
        path: bundle_path,
        owned: true,
    })
}

/// Temp files from `tempfile` are created with mode 0600, and the rename keeps it.
fn write_owner_only(dir: &Path, dest: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Load TLS configuration from the bundle and private key.
pub async fn load_tls_config(
    bundle: &CertificateBundle,
    key_path: &Path,
) -> Result<RustlsConfig, ServerError> {
    install_crypto_provider();

    if !key_path.exists() {
        return Err(ServerError::FileUnreadable {
            path: key_path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "private key file not found"),
        });
    }

    let pem = fs::read(bundle.path()).map_err(|source| ServerError::FileUnreadable {
        path: bundle.path().to_path_buf(),
        source,
    })?;
    let count = count_certificates(&pem).map_err(|source| ServerError::TlsConfig {
        path: bundle.path().to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %bundle.path().display(), certificates = count, "Parsed certificate chain");

    RustlsConfig::from_pem_file(bundle.path(), key_path)
        .await
        .map_err(|source| ServerError::TlsConfig {
            path: bundle.path().to_path_buf(),
            source,
        })
}

/// Number of PEM certificates in `pem`; an empty chain is an error.
pub fn count_certificates(pem: &[u8]) -> io::Result<usize> {
    let certs = rustls_pemfile::certs(&mut &pem[..]).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "no PEM certificates found",
        ));
    }
    Ok(certs.len())
}

/// rustls needs a process-wide provider when more than one backend is compiled in.
fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
