use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use forge_core::AUTH_KEY_HEADER;
use forge_core::prelude::*;
use tracing::warn;

/// Marks a request whose auth key was accepted by the [`AuthProvider`].
#[derive(Clone, Debug)]
pub struct AuthorizedWriter;

impl<S, A> FromRequestParts<AppState<S, A>> for AuthorizedWriter
where
    S: StorageBackend,
    A: AuthProvider,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, A>,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTH_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match state.auth.verify(key).await {
            Ok(()) => Ok(AuthorizedWriter),
            Err(_) => Err((StatusCode::FORBIDDEN, "Forbidden")),
        }
    }
}

/// Accepts writes carrying one pre-shared secret.
#[derive(Clone)]
pub struct SharedSecretAuth {
    secret: String,
}

impl SharedSecretAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if secret.is_empty() {
            warn!("Empty shared secret. All writes will be rejected!");
        }
        Self { secret }
    }
}

impl AuthProvider for SharedSecretAuth {
    async fn verify(&self, key: Option<&str>) -> Result<(), AuthError> {
        let key = key.ok_or(AuthError::MissingKey)?;
        if self.secret.is_empty() || key != self.secret {
            return Err(AuthError::InvalidKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn checks_the_shared_secret() {
        let auth = SharedSecretAuth::new("s3cret");

        assert!(auth.verify(Some("s3cret")).await.is_ok());
        assert!(matches!(
            auth.verify(Some("guess")).await,
            Err(AuthError::InvalidKey)
        ));
        assert!(matches!(auth.verify(None).await, Err(AuthError::MissingKey)));
    }

    #[tokio::test]
    async fn empty_secret_rejects_everything() {
        let auth = SharedSecretAuth::new("");

        assert!(auth.verify(Some("")).await.is_err());
    }
}
