// ABOUTME: Configuration types and parsing for regkeep.yml.
// ABOUTME: Builds the credential table, engine override and registry client settings.

mod env_value;

pub use env_value::EnvValue;

use crate::auth::{CredentialTable, Credentials, DockerConfig};
use crate::engine::{EngineConfig, EngineKind};
use crate::error::{Error, Result};
use crate::registry::{DEFAULT_TIMEOUT, RegistryClient, Scheme};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "regkeep.yml";
pub const CONFIG_FILENAME_ALT: &str = "regkeep.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".regkeep/config.yml";

/// Environment variable naming the Docker CLI config directory.
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Engine type (overrides auto-detection).
    #[serde(default)]
    pub runtime: Option<EngineKind>,

    /// Engine socket path (overrides the engine default).
    #[serde(default)]
    pub socket: Option<String>,

    /// Verify registry TLS during push. Podman honours `false` via libpod.
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Talk plain HTTP to registries (local test registries only).
    #[serde(default)]
    pub plain_http: bool,

    #[serde(default)]
    pub registry_auth: Vec<RegistryAuthConfig>,
}

/// One `registry_auth` entry: inline credentials or a Docker config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryAuthConfig {
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<EnvValue>,
    /// Docker CLI `config.json`; defaults to `$DOCKER_CONFIG/config.json`,
    /// then `~/.docker/config.json`, when no username is given.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

fn default_tls_verify() -> bool {
    true
}

fn default_request_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            runtime: None,
            socket: None,
            tls_verify: default_tls_verify(),
            request_timeout: default_request_timeout(),
            plain_http: false,
            registry_auth: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Engine override for detection.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            engine: self.runtime,
            socket: self.socket.clone(),
        }
    }

    pub fn registry_client(&self) -> RegistryClient {
        let scheme = if self.plain_http {
            Scheme::Http
        } else {
            Scheme::Https
        };
        RegistryClient::new()
            .with_scheme(scheme)
            .with_timeout(self.request_timeout)
    }

    /// Resolve every `registry_auth` entry into one immutable table.
    ///
    /// An entry whose config file holds nothing for its address is skipped
    /// with a warning; pushes to that registry go out anonymously.
    pub fn credential_table(&self) -> Result<CredentialTable> {
        let mut entries = Vec::with_capacity(self.registry_auth.len());
        for auth in &self.registry_auth {
            match auth.credentials()? {
                Some(creds) => entries.push((auth.address.clone(), creds)),
                None => {
                    tracing::warn!(address = %auth.address, "no credentials found for registry")
                }
            }
        }
        Ok(entries.into_iter().collect())
    }
}

impl RegistryAuthConfig {
    fn credentials(&self) -> Result<Option<Credentials>> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(Some(Credentials::new(username, password.resolve()?)))
            }
            (Some(_), None) | (None, Some(_)) => Err(Error::InvalidConfig(format!(
                "registry_auth for {}: username and password must be given together",
                self.address
            ))),
            (None, None) => {
                let path = match &self.config_file {
                    Some(path) => path.clone(),
                    None => default_docker_config().ok_or_else(|| {
                        Error::InvalidConfig(format!(
                            "registry_auth for {}: no credentials and no docker config location",
                            self.address
                        ))
                    })?,
                };
                tracing::debug!(address = %self.address, path = %path.display(), "reading docker config");
                Ok(DockerConfig::load(&path)?.credentials_for(&self.address)?)
            }
        }
    }
}

fn default_docker_config() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DOCKER_CONFIG_ENV) {
        return Some(PathBuf::from(dir).join("config.json"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".docker").join("config.json"))
}
