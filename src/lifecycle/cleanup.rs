//! Removal of the transient certificate bundle.
//!
//! The encrypted listener unit holds an [`ArtifactGuard`] for its bundle.
//! The guard is dropped when the unit's serve loop returns (or the task is
//! aborted), so the file goes away however the listener stopped. Bundles
//! that merely point at the configured leaf certificate are never deleted.

use std::fs;
use std::io;

use crate::error::ServerError;
use crate::net::tls::CertificateBundle;

/// Delete `bundle` if this process wrote it.
///
/// Returns `Ok(true)` when a file was removed, `Ok(false)` when there was
/// nothing to do (not owned, or already gone).
pub fn remove_bundle(bundle: &CertificateBundle) -> Result<bool, ServerError> {
    if !bundle.is_owned() {
        return Ok(false);
    }

    match fs::remove_file(bundle.path()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ServerError::CleanupFailure {
            path: bundle.path().to_path_buf(),
            source,
        }),
    }
}

/// Removes its bundle on drop.
#[derive(Debug)]
pub struct ArtifactGuard {
    bundle: CertificateBundle,
}

impl ArtifactGuard {
    pub fn new(bundle: CertificateBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &CertificateBundle {
        &self.bundle
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        match remove_bundle(&self.bundle) {
            Ok(true) => {
                tracing::info!(path = %self.bundle.path().display(), "Removed certificate bundle");
            }
            Ok(false) => {
                tracing::debug!(path = %self.bundle.path().display(), "No bundle to remove");
            }
            Err(e) => {
                tracing::error!(error_kind = e.kind(), error = %e, "Certificate bundle left behind");
            }
        }
    }
}
