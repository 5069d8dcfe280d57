use crate::{ClientError, RemoteStore};
use forge_core::prelude::{Manifest, ManifestEntry, ManifestError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub path: String,
    pub hash: String,
    pub reason: String,
}

/// Outcome of an upload run. `uploaded + failed + skipped` equals the number
/// of manifest entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bytes_uploaded: u64,
    pub failures: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.uploaded + self.failed + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} failed, {} skipped",
            self.uploaded, self.failed, self.skipped
        )
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// Every queued entry was attempted and at least one failed.
    #[error("{} files failed to upload", .0.failed)]
    Incomplete(UploadReport),
}

impl UploadError {
    /// The report of a completed run, if the run got that far.
    pub fn report(&self) -> Option<&UploadReport> {
        match self {
            UploadError::Incomplete(report) => Some(report),
            _ => None,
        }
    }
}

/// Running totals of a transfer phase, rendered as `[files/total] percent`
/// of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub files: usize,
    pub total_files: usize,
    pub bytes: u64,
    pub total_bytes: u64,
}

impl TransferProgress {
    pub fn new(total_files: usize, total_bytes: u64) -> Self {
        Self {
            files: 0,
            total_files,
            bytes: 0,
            total_bytes,
        }
    }

    /// Counts one finished file, successful or not.
    pub fn advance(&mut self, size: u64) {
        self.files += 1;
        self.bytes += size;
    }

    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.bytes as f64 * 100.0 / self.total_bytes as f64
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {:.1}%",
            self.files,
            self.total_files,
            self.percent()
        )
    }
}

/// Pushes manifest entries that the store does not hold yet.
///
/// Requests are issued one at a time in manifest order.
pub struct Uploader<S: RemoteStore> {
    store: S,
    assets_dir: PathBuf,
}

impl<S: RemoteStore> Uploader<S> {
    pub fn new(store: S, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            assets_dir: assets_dir.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn upload_manifest_file(
        &self,
        manifest_path: &Path,
        force: bool,
    ) -> Result<UploadReport, UploadError> {
        let manifest = Manifest::load(manifest_path)?;
        self.upload(&manifest, force).await
    }

    /// Entries that need transmitting and the number already present.
    ///
    /// A failed probe queues the entry anyway.
    pub async fn plan<'m>(
        &self,
        manifest: &'m Manifest,
        force: bool,
    ) -> (Vec<&'m ManifestEntry>, usize) {
        if force {
            info!("Force mode: uploading all {} files", manifest.len());
            return (manifest.iter().collect(), 0);
        }

        info!("Checking {} files...", manifest.len());

        let mut queued = Vec::new();
        let mut skipped = 0;
        for entry in manifest {
            match self.store.exists(&entry.hash).await {
                Ok(true) => skipped += 1,
                Ok(false) => queued.push(entry),
                Err(e) => {
                    warn!("Failed to check {}: {e}", entry.path);
                    queued.push(entry);
                }
            }
        }

        let queued_size: u64 = queued.iter().map(|e| e.size).sum();
        info!(
            "{skipped} files already exist, {} need uploading ({:.2} MB)",
            queued.len(),
            queued_size as f64 / (1024.0 * 1024.0)
        );

        (queued, skipped)
    }

    pub async fn upload(
        &self,
        manifest: &Manifest,
        force: bool,
    ) -> Result<UploadReport, UploadError> {
        let (queued, skipped) = self.plan(manifest, force).await;

        let mut report = UploadReport {
            skipped,
            ..Default::default()
        };

        if queued.is_empty() {
            info!("Nothing to upload.");
            return Ok(report);
        }

        let queued_size = queued.iter().map(|e| e.size).sum();
        let mut progress = TransferProgress::new(queued.len(), queued_size);

        for entry in &queued {
            let path = entry.local_path(&self.assets_dir);
            let result = self.store.put_file(&entry.hash, &path).await;
            progress.advance(entry.size);
            match result {
                Ok(()) => {
                    info!("{progress} {}", entry.path);
                    report.uploaded += 1;
                    report.bytes_uploaded += entry.size;
                }
                Err(e) => {
                    error!("Failed to upload {}: {e}", entry.path);
                    report.failed += 1;
                    report.failures.push(FailedUpload {
                        path: entry.path.clone(),
                        hash: entry.hash.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("Upload complete: {report}");

        if report.failed > 0 {
            return Err(UploadError::Incomplete(report));
        }

        Ok(report)
    }
}
