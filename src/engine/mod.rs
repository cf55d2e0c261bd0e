// ABOUTME: Local image engine connection for pushes.
// ABOUTME: Detects Docker/Podman sockets and provides the socket-backed PushEngine.

mod client;
mod detection;
mod socket;
mod types;

pub use client::SocketEngine;
pub use detection::{DetectionError, detect_engine, detect_local};
pub use types::{EngineConfig, EngineKind, EngineSocket};
