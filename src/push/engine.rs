// ABOUTME: Push capability of a local image engine.
// ABOUTME: Engines return a lazy stream of decoded push records over one open response.

use super::PushRecord;
use crate::auth::RegistryAuth;
use crate::error::ErrorKind;
use crate::types::{ImageRef, ParseImageRefError};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Records of one push, in the order the engine emits them.
///
/// Finite and single-use; dropping it closes the underlying response.
pub type PushStream = Pin<Box<dyn Stream<Item = Result<PushRecord, PushError>> + Send>>;

/// A push the engine should perform.
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// Image to push.
    pub image: ImageRef,
    /// Resolved credentials (anonymous when none matched).
    pub auth: RegistryAuth,
    /// `auth` encoded for the `X-Registry-Auth` header.
    pub registry_auth: String,
}

/// Image push operations.
#[async_trait]
pub trait PushEngine: Send + Sync {
    /// Start a push and return its record stream.
    async fn push(&self, request: &PushRequest) -> Result<PushStream, PushError>;
}

/// Errors from push operations.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    InvalidReference(#[from] ParseImageRefError),

    #[error("push of {image} failed: {message}")]
    Failed { image: String, message: String },

    #[error("failed to encode registry auth: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("undecodable push record: {0}")]
    Decode(String),

    #[error("image engine error: {0}")]
    Engine(String),
}

impl PushError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PushError::InvalidReference(_) => ErrorKind::InvalidReference,
            PushError::Failed { .. } => ErrorKind::PushFailed,
            PushError::Encode(_) | PushError::Decode(_) | PushError::Engine(_) => {
                ErrorKind::Transport
            }
        }
    }
}
