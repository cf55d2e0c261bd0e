// ABOUTME: Registry HTTP error types with SNAFU context selectors.
// ABOUTME: Every variant names the registry and repository it concerns.

use crate::error::ErrorKind;
use crate::types::DigestError;
use snafu::Snafu;

/// Failure of a registry v2 exchange.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RegistryError {
    #[snafu(display("bad credentials for {registry}/{repository}: {status}"))]
    BadCredentials {
        registry: String,
        repository: String,
        status: String,
    },

    #[snafu(display("unusable bearer challenge from {registry}: {header:?}"))]
    MalformedChallenge { registry: String, header: String },

    #[snafu(display("token request to {realm} for {registry}/{repository} failed: {status}"))]
    TokenFetch {
        realm: String,
        registry: String,
        repository: String,
        status: String,
    },

    #[snafu(display("failed to parse token response from {realm}: {source}"))]
    TokenParse {
        realm: String,
        source: serde_json::Error,
    },

    #[snafu(display("token response from {realm} holds no token"))]
    MissingToken { realm: String },

    #[snafu(display("registry {registry} rejected {operation} of {repository}: {status}"))]
    Rejected {
        registry: String,
        repository: String,
        operation: String,
        status: String,
    },

    #[snafu(display("registry {registry} returned an invalid digest for {repository}: {source}"))]
    InvalidDigest {
        registry: String,
        repository: String,
        source: DigestError,
    },

    #[snafu(display("request to {registry} for {repository} failed: {source}"))]
    Transport {
        registry: String,
        repository: String,
        source: reqwest::Error,
    },

    #[snafu(display("failed to build registry HTTP client: {source}"))]
    ClientBuild { source: reqwest::Error },
}

impl RegistryError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::BadCredentials { .. } => ErrorKind::BadCredentials,
            RegistryError::MalformedChallenge { .. } | RegistryError::TokenFetch { .. } => {
                ErrorKind::TokenFetchFailed
            }
            RegistryError::TokenParse { .. } | RegistryError::MissingToken { .. } => {
                ErrorKind::TokenParseFailed
            }
            RegistryError::Rejected { .. } | RegistryError::InvalidDigest { .. } => {
                ErrorKind::RegistryRejected
            }
            RegistryError::Transport { .. } | RegistryError::ClientBuild { .. } => {
                ErrorKind::Transport
            }
        }
    }

    /// HTTP status line carried by the error, if any.
    pub fn status(&self) -> Option<&str> {
        match self {
            RegistryError::BadCredentials { status, .. }
            | RegistryError::TokenFetch { status, .. }
            | RegistryError::Rejected { status, .. } => Some(status),
            _ => None,
        }
    }
}
