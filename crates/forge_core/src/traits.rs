use crate::error::*;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Content-addressed blob storage behind the blob store server.
pub trait StorageBackend: Send + Sync + 'static + Clone {
    /// Stores the stream under `hash`. Returns `false` if the blob already
    /// existed, in which case it is left untouched.
    ///
    /// An error item in the stream aborts the write and nothing is stored.
    fn write_stream(
        &self,
        hash: &str,
        stream: ByteStream,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    fn read_blob(&self, hash: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;

    /// Size of the stored blob, `None` if absent.
    fn blob_size(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<Option<u64>, StorageError>> + Send;

    fn exists(&self, hash: &str) -> impl Future<Output = Result<bool, StorageError>> + Send {
        async move { Ok(self.blob_size(hash).await?.is_some()) }
    }
}

/// Authorizes writes to the blob store.
pub trait AuthProvider: Send + Sync + 'static + Clone {
    fn verify(&self, key: Option<&str>) -> impl Future<Output = Result<(), AuthError>> + Send;
}
