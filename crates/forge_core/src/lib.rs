//! # Forge Core
//!
//! Shared building blocks of the forge asset pipeline: the manifest model,
//! content hashing, manifest generation and HTML injection, plus the traits
//! implemented by blob store backends.

pub mod error;
pub mod generator;
pub mod hash;
pub mod inject;
pub mod manifest;
pub mod traits;

mod atomic;

pub use atomic::atomic_write;

/// Header carrying the shared secret on blob store writes.
pub const AUTH_KEY_HEADER: &str = "x-custom-auth-key";

/// Environment variable holding the blob store secret.
pub const AUTH_KEY_ENV: &str = "FORGE_AUTH_KEY_SECRET";

pub mod prelude {
    pub use super::error::*;
    pub use super::generator::*;
    pub use super::hash::*;
    pub use super::inject::*;
    pub use super::manifest::*;
    pub use super::traits::*;
}
