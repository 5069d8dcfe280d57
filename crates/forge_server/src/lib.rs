use axum::{Router, routing::get};
use forge_core::traits::{AuthProvider, StorageBackend};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

mod api;

pub mod auth;
pub mod dev;
pub mod state;

use state::AppState;

/// The builder for the blob store.
///
/// Serves `HEAD`, `GET` and `PUT` on `/{hash}`; writes need the shared
/// secret in the `X-Custom-Auth-Key` header.
#[derive(Clone, Debug, Default)]
pub struct BlobStoreServer {
    config: BlobStoreConfig,
}

#[derive(Clone, Debug, Default)]
pub struct BlobStoreConfig {
    /// Maximum accepted upload size in bytes.
    ///
    /// Defaults to no limit.
    pub max_upload_size: Option<usize>,
}

impl BlobStoreServer {
    pub fn new(config: BlobStoreConfig) -> Self {
        Self { config }
    }

    pub fn build<S: StorageBackend, A: AuthProvider>(self, storage: S, auth: A) -> Router {
        let state = AppState { storage, auth };

        let router: Router<AppState<S, A>> = Router::new()
            .route("/health", get(|| async { "OK" }))
            .route(
                "/{hash}",
                get(api::get_blob)
                    .head(api::head_blob)
                    .put(api::put_blob),
            );

        let router = match self.config.max_upload_size {
            Some(limit) => router.layer(RequestBodyLimitLayer::new(limit)),
            None => router,
        };

        router
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

pub mod prelude {
    pub use crate::auth::*;
    pub use crate::dev::DevServer;
    pub use crate::state::*;
    pub use crate::{BlobStoreConfig, BlobStoreServer};
}
