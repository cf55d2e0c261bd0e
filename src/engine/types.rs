// ABOUTME: Image engine type definitions for Docker and Podman.
// ABOUTME: Includes EngineKind, the detected EngineSocket, and explicit overrides.

use serde::{Deserialize, Serialize};

/// The local image engine serving the push API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Docker,
    Podman,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Docker => write!(f, "docker"),
            EngineKind::Podman => write!(f, "podman"),
        }
    }
}

/// Detected engine and the socket it listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSocket {
    pub kind: EngineKind,
    pub socket_path: String,
}

/// Explicit engine override from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Engine type (overrides auto-detection).
    #[serde(default)]
    pub engine: Option<EngineKind>,
    /// Socket path (overrides the engine's default).
    #[serde(default)]
    pub socket: Option<String>,
}
