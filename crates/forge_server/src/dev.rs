//! Static file server for local development builds.

use axum::{
    Router,
    extract::Request,
    http::{Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::io;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Serves a directory with permissive CORS so a web build running on another
/// origin can fetch its assets.
#[derive(Clone, Debug)]
pub struct DevServer {
    root: PathBuf,
}

impl DevServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fails if the root directory does not exist.
    pub fn build(self) -> io::Result<Router> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory does not exist: {}", self.root.display()),
            ));
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::RANGE])
            .expose_headers([header::CONTENT_LENGTH, header::CONTENT_RANGE]);

        Ok(Router::new()
            .fallback_service(ServeDir::new(self.root))
            .layer(middleware::from_fn(answer_options))
            .layer(cors)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ))
    }
}

/// Plain `OPTIONS` requests (not CORS preflights) get an empty 200.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
