use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0:?}")]
    InvalidKey(String),

    #[error("Integrity check failed. Expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing auth key")]
    MissingKey,

    #[error("Invalid auth key")]
    InvalidKey,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found at {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate manifest path: {0}")]
    DuplicatePath(String),

    #[error("Invalid hash {hash:?} for {path}")]
    InvalidHash { path: String, hash: String },

    #[error("Invalid manifest path: {0:?}")]
    InvalidPath(String),
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to compute hash for {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No </head> or </body> tag to inject the manifest before")]
    NoInsertionPoint,
}
