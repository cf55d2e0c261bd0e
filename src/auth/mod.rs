// ABOUTME: Registry credentials and the immutable per-process credential table.
// ABOUTME: Lookup is an exact match on the normalized, scheme-qualified address.

mod docker_config;
mod registry_auth;

pub use docker_config::DockerConfig;
pub use registry_auth::RegistryAuth;

use crate::types::{ImageRef, normalize_registry_address};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Username/password pair for one registry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Errors loading credentials from external configuration.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to read docker config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid docker config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid auth entry for {address}: {reason}")]
    InvalidEntry { address: String, reason: String },
}

/// Credentials keyed by normalized registry address (`https://host`).
///
/// Built once from configuration and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, Credentials>,
}

impl CredentialTable {
    /// Look up credentials for a registry address, normalizing it first.
    pub fn get(&self, address: &str) -> Option<&Credentials> {
        self.entries.get(&normalize_registry_address(address))
    }

    /// Credentials for the registry an image reference addresses. References
    /// without a registry resolve to the default registry's entry.
    pub fn resolve(&self, image: &ImageRef) -> Option<&Credentials> {
        self.entries.get(&image.registry_address())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized addresses with an entry, sorted.
    pub fn addresses(&self) -> Vec<&str> {
        let mut addresses: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        addresses.sort_unstable();
        addresses
    }
}

impl<K: AsRef<str>> FromIterator<(K, Credentials)> for CredentialTable {
    /// Later entries for the same normalized address win.
    fn from_iter<I: IntoIterator<Item = (K, Credentials)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(address, creds)| (normalize_registry_address(address.as_ref()), creds))
            .collect();
        Self { entries }
    }
}
