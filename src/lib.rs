// ABOUTME: Library root for regkeep - push images and delete registry manifests.
// ABOUTME: The main binary is in main.rs.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod push;
pub mod registry;
pub mod resource;
pub mod types;
