// ABOUTME: Push engine for Docker and Podman sockets.
// ABOUTME: Bollard checks the engine is up; pushes go over the socket with the caller's auth header.

use super::socket::{self, PushApi};
use super::types::{EngineKind, EngineSocket};
use crate::push::{PushEngine, PushError, PushRequest, PushStream};
use async_trait::async_trait;
use bollard::Docker;

/// Seconds the bollard client waits on a single API call.
const ENGINE_TIMEOUT_SECS: u64 = 120;

/// Push engine bound to one local engine socket.
pub struct SocketEngine {
    client: Docker,
    kind: EngineKind,
    socket_path: String,
    tls_verify: bool,
}

impl SocketEngine {
    /// Connect to a detected engine socket.
    pub fn connect(socket: &EngineSocket) -> Result<Self, PushError> {
        let client = Docker::connect_with_unix(
            &socket.socket_path,
            ENGINE_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| PushError::Engine(format!("failed to connect to {}: {}", socket.socket_path, e)))?;
        Ok(Self {
            client,
            kind: socket.kind,
            socket_path: socket.socket_path.clone(),
            tls_verify: true,
        })
    }

    /// Verify registry TLS during push. Only Podman can turn this off, via libpod.
    pub fn with_tls_verify(mut self, tls_verify: bool) -> Self {
        self.tls_verify = tls_verify;
        self
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// Check the engine answers before starting a push.
    pub async fn ping(&self) -> Result<(), PushError> {
        self.client
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| PushError::Engine(format!("engine at {} is not responding: {}", self.socket_path, e)))
    }

    fn push_api(&self) -> PushApi {
        match (self.kind, self.tls_verify) {
            (EngineKind::Podman, false) => PushApi::LibpodInsecure,
            (EngineKind::Docker, false) => {
                tracing::warn!("tls_verify=false is only honoured by Podman; pushing with verification");
                PushApi::Compat
            }
            _ => PushApi::Compat,
        }
    }
}

#[async_trait]
impl PushEngine for SocketEngine {
    async fn push(&self, request: &PushRequest) -> Result<PushStream, PushError> {
        socket::push(
            &self.socket_path,
            self.push_api(),
            &request.image,
            &request.registry_auth,
        )
        .await
    }
}
