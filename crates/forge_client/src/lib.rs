//! # Forge Client
//!
//! Talks to the blob store and pushes the assets of a manifest to it.
//!
//! ```no_run
//! use forge_client::{HttpStore, StoreConfig, Uploader};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), forge_client::UploadError> {
//! let store = HttpStore::new(StoreConfig {
//!     auth_key: std::env::var("FORGE_AUTH_KEY_SECRET").ok(),
//!     ..Default::default()
//! })?;
//! let report = Uploader::new(store, "game/bin/data/core")
//!     .upload_manifest_file(Path::new("game/bin/manifest.json"), false)
//!     .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use reqwest::StatusCode;
use thiserror::Error;

mod store;
mod upload;

pub use store::{DEFAULT_ENDPOINT, HttpStore, RemoteStore, StoreConfig};
pub use upload::{FailedUpload, TransferProgress, UploadError, UploadReport, Uploader};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned error {0}: {1}")]
    ServerError(StatusCode, String),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("{} environment variable is not set", forge_core::AUTH_KEY_ENV)]
    MissingCredential,
}

pub type Result<T> = std::result::Result<T, ClientError>;
