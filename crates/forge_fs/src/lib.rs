//! # Forge FileSystem Storage
//!
//! A local filesystem backend for the forge blob store.
//!
//! This crate implements the [`StorageBackend`] trait, storing each blob as
//! `<root>/<hash>`.
//!
//! ## Features
//!
//! * **Atomic Writes**: Each writer streams into its own temporary file, which is
//!   moved into place only if no blob exists under that hash yet.
//!
//! ## Usage
//!
//! ```no_run
//! use forge_fs::FileSystemStorage;
//!
//! let storage = FileSystemStorage::new("./forge_data");
//! ```

use bytes::Bytes;
use forge_core::prelude::*;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::spawn_blocking;
use tracing::{debug, instrument};

/// Creates a temp file next to `path`, private to one writer.
async fn temp_file_for(path: &Path) -> Result<(fs::File, TempPath), StorageError> {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    fs::create_dir_all(&dir).await?;

    let prefix = path
        .file_name()
        .map(|name| format!("{}.", name.to_string_lossy()))
        .unwrap_or_default();
    let named = spawn_blocking(move || {
        Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
    })
    .await
    .map_err(std::io::Error::other)??;

    let (file, temp_path) = named.into_parts();
    Ok((fs::File::from_std(file), temp_path))
}

/// Moves a finished temp file to `path`. Returns `false` and discards the
/// temp file if `path` already exists.
async fn persist(temp_path: TempPath, path: &Path) -> Result<bool, StorageError> {
    let target = path.to_path_buf();
    let result = spawn_blocking(move || temp_path.persist_noclobber(&target))
        .await
        .map_err(std::io::Error::other)?;

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StorageError::Io(e.error)),
    }
}

#[derive(Clone, Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { root: path.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn get_path(&self, hash: &str) -> Result<PathBuf, StorageError> {
        if !is_content_hash(hash) {
            return Err(StorageError::InvalidKey(hash.to_string()));
        }
        Ok(self.root.join(hash))
    }
}

impl StorageBackend for FileSystemStorage {
    #[instrument(skip(self, stream), fields(root = %self.root.display()))]
    async fn write_stream(&self, hash: &str, mut stream: ByteStream) -> Result<bool, StorageError> {
        let path = self.get_path(hash)?;
        if fs::try_exists(&path).await? {
            debug!("Blob already exists");
            return Ok(false);
        }

        // Dropping `temp_path` on an early return removes the partial file.
        let (mut file, temp_path) = temp_file_for(&path).await?;
        while let Some(res) = stream.next().await {
            let chunk = res?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        let created = persist(temp_path, &path).await?;
        if !created {
            debug!("Blob was stored by a concurrent writer");
        }
        Ok(created)
    }

    async fn read_blob(&self, hash: &str) -> Result<Bytes, StorageError> {
        let path = self.get_path(hash)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn blob_size(&self, hash: &str) -> Result<Option<u64>, StorageError> {
        let path = self.get_path(hash)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
