use crate::{ClientError, Result};
use forge_core::AUTH_KEY_HEADER;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// The content-addressed store assets are uploaded to.
pub trait RemoteStore: Send + Sync {
    /// Existence probe. `Ok(true)` if a blob is stored under `hash`.
    fn exists(&self, hash: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Transmits the file at `path` as the blob for `hash`.
    fn put_file(&self, hash: &str, path: &Path) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. "http://localhost:8787".
    pub endpoint: String,
    /// Shared secret sent with every write.
    pub auth_key: Option<String>,
    /// Per-request timeout.
    ///
    /// Defaults to 5 minutes.
    pub timeout: Duration,
}

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8787";

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_key: None,
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`RemoteStore`] speaking the blob store HTTP protocol:
/// `HEAD /{hash}` to probe, `PUT /{hash}` to upload.
#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    client: Client,
    auth_key: String,
}

impl HttpStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let auth_key = config
            .auth_key
            .filter(|key| !key.is_empty())
            .ok_or(ClientError::MissingCredential)?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            client,
            auth_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn blob_url(&self, hash: &str) -> String {
        format!("{}/{hash}", self.base_url)
    }

    pub async fn download(&self, hash: &str) -> Result<Vec<u8>> {
        let response = self.client.get(self.blob_url(hash)).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status, text));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

impl RemoteStore for HttpStore {
    async fn exists(&self, hash: &str) -> Result<bool> {
        let response = self.client.head(self.blob_url(hash)).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ClientError::UnexpectedStatus(status)),
        }
    }

    async fn put_file(&self, hash: &str, path: &Path) -> Result<()> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        debug!(hash, len, "uploading blob");

        let response = self
            .client
            .put(self.blob_url(hash))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .header(AUTH_KEY_HEADER, &self.auth_key)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status, text));
        }

        Ok(())
    }
}
