use crate::auth::AuthorizedWriter;
use crate::state::AppState;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use forge_core::prelude::*;
use futures::{StreamExt, TryStreamExt, future, stream};
use std::io::ErrorKind;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0
            .downcast_ref::<StorageError>()
            .map(|storage_err| match storage_err {
                StorageError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "Object Not Found".to_string())
                }
                StorageError::InvalidKey(_) | StorageError::Integrity { .. } => {
                    (StatusCode::BAD_REQUEST, storage_err.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, storage_err.to_string()),
            })
            .unwrap_or_else(|| {
                self.0
                    .downcast_ref::<AuthError>()
                    .map(|_| (StatusCode::FORBIDDEN, "Forbidden".to_string()))
                    .unwrap_or((
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Internal Server Error: {}", self.0),
                    ))
            })
            .into_response()
    }
}

fn check_key(hash: &str) -> Result<(), ApiError> {
    if is_content_hash(hash) {
        Ok(())
    } else {
        Err(ApiError::from(StorageError::InvalidKey(hash.to_string())))
    }
}

/// HEAD /{hash}
pub async fn head_blob<S: StorageBackend, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    check_key(&hash)?;

    Ok(match state.storage.blob_size(&hash).await? {
        Some(size) => {
            (StatusCode::OK, [(header::CONTENT_LENGTH, size.to_string())]).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// GET /{hash}
pub async fn get_blob<S: StorageBackend, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_key(&hash)?;
    let data = state.storage.read_blob(&hash).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// PUT /{hash}
///
/// Streams the body to storage. The digest is checked before the stream
/// ends, so a mismatching body is never stored. An existing blob is kept as
/// is.
pub async fn put_blob<S: StorageBackend, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    _writer: AuthorizedWriter,
    Path(hash): Path<String>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    check_key(&hash)?;

    let hasher = Arc::new(Mutex::new(ContentHasher::new()));
    let hasher_writer = hasher.clone();
    let hasher_check = hasher.clone();
    let expected = hash.clone();

    let body = request
        .into_body()
        .into_data_stream()
        .map_err(std::io::Error::other)
        .map_ok(move |chunk| {
            if let Ok(mut h) = hasher_writer.lock() {
                h.update(&chunk);
            }
            chunk
        });
    // Yields a trailing error, and so aborts the write, on a digest mismatch.
    let verify = stream::once(async move {
        let actual = hasher_check.lock().map(|h| h.finish()).unwrap_or_default();
        let mismatch = std::io::Error::new(ErrorKind::InvalidData, "content hash mismatch");
        (actual != expected).then_some(Err::<Bytes, _>(mismatch))
    })
    .filter_map(future::ready);

    let created = match state.storage.write_stream(&hash, Box::pin(body.chain(verify))).await {
        Ok(created) => created,
        Err(StorageError::Io(e)) if e.kind() == ErrorKind::InvalidData => {
            let actual = hasher.lock().map(|h| h.finish()).unwrap_or_default();
            error!("Hash mismatch for upload {hash}. Calculated: {actual}. Rejected.");
            return Err(ApiError::from(StorageError::Integrity {
                expected: hash,
                actual,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let status = if created {
        let size = hasher.lock().map(|h| h.len()).unwrap_or_default();
        info!("Stored blob {hash} ({size} bytes)");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, "OK"))
}
