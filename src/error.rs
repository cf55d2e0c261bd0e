// ABOUTME: Application-wide error types for regkeep.
// ABOUTME: Aggregates push, registry, and configuration errors behind one ErrorKind taxonomy.

use crate::auth::AuthError;
use crate::push::PushError;
use crate::registry::RegistryError;
use crate::types::ParseImageRefError;
use std::path::PathBuf;
use thiserror::Error;

/// Error kind for programmatic handling. Every kind is terminal for the
/// current operation; nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed digest suffix in an image reference.
    InvalidReference,
    /// The image engine reported an error record during push.
    PushFailed,
    /// Registry rejected basic auth without offering a bearer challenge.
    BadCredentials,
    /// Token endpoint refused the request or the challenge was unusable.
    TokenFetchFailed,
    /// Token endpoint answered with a body that holds no token.
    TokenParseFailed,
    /// Registry answered with an unexpected status.
    RegistryRejected,
    /// Network or engine transport failure.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::PushFailed => "push_failed",
            ErrorKind::BadCredentials => "bad_credentials",
            ErrorKind::TokenFetchFailed => "token_fetch_failed",
            ErrorKind::TokenParseFailed => "token_parse_failed",
            ErrorKind::RegistryRejected => "registry_rejected",
            ErrorKind::Transport => "transport",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] ParseImageRefError),

    #[error("unable to push image: {0}")]
    Push(#[from] PushError),

    #[error("registry request failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("credential configuration error: {0}")]
    Auth(#[from] AuthError),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image engine unavailable: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Kind of a push/registry failure; `None` for setup errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Reference(_) => Some(ErrorKind::InvalidReference),
            Error::Push(e) => Some(e.kind()),
            Error::Registry(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
