// ABOUTME: Local image engine detection.
// ABOUTME: Honors explicit config, then checks Podman sockets before Docker.

use super::types::{EngineConfig, EngineKind, EngineSocket};
use std::path::Path;

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Error during engine detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no image engine found (checked Podman and Docker sockets)")]
    NoEngineFound,

    #[error("configured socket does not exist: {0}")]
    SocketMissing(String),
}

/// Resolve the engine socket.
///
/// Explicit `config` values take precedence. Otherwise detection order is:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_engine(config: Option<&EngineConfig>) -> Result<EngineSocket, DetectionError> {
    if let Some(cfg) = config
        && let Some(kind) = cfg.engine
    {
        let socket_path = cfg
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(kind));
        return Ok(EngineSocket { kind, socket_path });
    }

    if let Some(socket) = config.and_then(|c| c.socket.as_deref()) {
        if !Path::new(socket).exists() {
            return Err(DetectionError::SocketMissing(socket.to_string()));
        }
        return Ok(EngineSocket {
            kind: kind_from_socket(socket),
            socket_path: socket.to_string(),
        });
    }

    detect_local()
}

/// Detect an engine socket on the local system.
pub fn detect_local() -> Result<EngineSocket, DetectionError> {
    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(EngineSocket {
                kind: EngineKind::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(EngineSocket {
            kind: EngineKind::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(EngineSocket {
            kind: EngineKind::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoEngineFound)
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(kind: EngineKind) -> String {
    match kind {
        EngineKind::Docker => DOCKER_SOCKET.to_string(),
        EngineKind::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

fn kind_from_socket(socket: &str) -> EngineKind {
    if socket.contains("podman") {
        EngineKind::Podman
    } else {
        EngineKind::Docker
    }
}
