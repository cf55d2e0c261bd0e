// ABOUTME: Reads credentials from a Docker CLI config.json `auths` section.
// ABOUTME: Decodes base64 `auth` fields and maps Docker Hub aliases to the default registry.

use super::{AuthError, Credentials};
use crate::types::{DEFAULT_REGISTRY, normalize_registry_address};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Hosts `docker login` writes for Docker Hub.
const HUB_ALIASES: &[&str] = &["index.docker.io", "docker.io", "registry-1.docker.io"];

#[derive(Debug, Default, Deserialize)]
pub struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl DockerConfig {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Credentials stored for one registry address, if any.
    pub fn credentials_for(&self, address: &str) -> Result<Option<Credentials>, AuthError> {
        let wanted = config_key_address(address);
        for (key, entry) in &self.auths {
            if config_key_address(key) == wanted {
                return entry.decode(key);
            }
        }
        Ok(None)
    }
}

impl AuthEntry {
    fn decode(&self, address: &str) -> Result<Option<Credentials>, AuthError> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Ok(Some(Credentials::new(username, password)));
        }

        let Some(encoded) = self.auth.as_deref().filter(|a| !a.is_empty()) else {
            return Ok(None);
        };

        let invalid = |reason: String| AuthError::InvalidEntry {
            address: address.to_string(),
            reason,
        };

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| invalid(format!("auth is not base64: {}", e)))?;
        let decoded =
            String::from_utf8(decoded).map_err(|_| invalid("auth is not UTF-8".to_string()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| invalid("auth must be username:password".to_string()))?;

        Ok(Some(Credentials::new(username, password)))
    }
}

// Config keys may carry a path (`https://index.docker.io/v1/`); only the
// scheme and host take part in matching.
fn config_key_address(key: &str) -> String {
    let normalized = normalize_registry_address(key);
    let (scheme, rest) = normalized
        .split_once("://")
        .unwrap_or(("https", normalized.as_str()));
    let host = rest.split('/').next().unwrap_or(rest);
    let host = if HUB_ALIASES.contains(&host) {
        DEFAULT_REGISTRY
    } else {
        host
    };
    format!("{}://{}", scheme, host)
}
