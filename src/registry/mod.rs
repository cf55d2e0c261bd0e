// ABOUTME: Registry HTTP API v2 client for manifest delete and digest lookup.
// ABOUTME: Implements the bearer-token challenge/response handshake on 401.

mod challenge;
mod client;
mod delete;
mod digest;
mod error;
mod token;

pub use challenge::BearerChallenge;
pub use client::{
    DEFAULT_TIMEOUT, INSECURE_TLS_ENV, ManifestTarget, RegistryClient, Scheme,
    insecure_tls_from_env,
};
pub use delete::DeleteOutcome;
pub use digest::{DOCKER_CONTENT_DIGEST, MANIFEST_MEDIA_TYPES};
pub use error::RegistryError;
pub use token::{BearerToken, parse_token};
