// ABOUTME: Create/read/update/delete boundary for a pushed registry image.
// ABOUTME: Returns state for a lifecycle wrapper to record; never persists anything itself.

use crate::auth::CredentialTable;
use crate::error::{Error, Result};
use crate::push::{PushEngine, push_image};
use crate::registry::{DeleteOutcome, ManifestTarget, RegistryClient};
use crate::types::{Digest, ImageRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared inputs of a registry image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryImage {
    /// Image reference to push, e.g. `registry.example.com/team/app:v1`.
    pub name: String,
    /// Leave the remote manifest in place on delete.
    #[serde(default)]
    pub keep_remote: bool,
    /// Arbitrary values whose change forces a new push.
    #[serde(default)]
    pub push_triggers: BTreeSet<String>,
}

impl RegistryImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether moving from `prior` to `self` needs a fresh push rather than
    /// an in-place update. Only `keep_remote` can change in place.
    pub fn requires_replacement(&self, prior: &RegistryImage) -> bool {
        self.name != prior.name || self.push_triggers != prior.push_triggers
    }
}

/// Recorded outputs of a registry image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryImageState {
    pub id: String,
    pub name: String,
    pub sha256_digest: Digest,
}

/// What a delete did to the remote manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTeardown {
    /// `keep_remote` was set; no registry call was made.
    Kept,
    Removed(DeleteOutcome),
}

/// Lifecycle operations over an image engine, registry client and credential
/// table. Only `create` needs the engine.
pub struct RegistryImageResource<'a, E: ?Sized> {
    engine: Option<&'a E>,
    registry: &'a RegistryClient,
    credentials: &'a CredentialTable,
}

impl<'a, E> RegistryImageResource<'a, E>
where
    E: PushEngine + ?Sized,
{
    pub fn new(
        engine: &'a E,
        registry: &'a RegistryClient,
        credentials: &'a CredentialTable,
    ) -> Self {
        Self {
            engine: Some(engine),
            registry,
            credentials,
        }
    }

    /// Resource that can read and delete but not push.
    pub fn without_engine(registry: &'a RegistryClient, credentials: &'a CredentialTable) -> Self {
        Self {
            engine: None,
            registry,
            credentials,
        }
    }

    /// Push the image, then read back its manifest digest.
    pub async fn create(&self, image: &RegistryImage) -> Result<RegistryImageState> {
        let engine = self
            .engine
            .ok_or_else(|| Error::Engine("no image engine connected".to_string()))?;
        push_image(engine, self.credentials, &image.name).await?;
        self.read(image).await
    }

    /// Current manifest digest of the image on its registry.
    pub async fn read(&self, image: &RegistryImage) -> Result<RegistryImageState> {
        let reference = ImageRef::parse(&image.name)?;
        let target = ManifestTarget::for_image(&reference);
        let digest = self
            .registry
            .manifest_digest(&target, self.credentials.resolve(&reference))
            .await?;

        Ok(RegistryImageState {
            id: digest.to_string(),
            name: image.name.clone(),
            sha256_digest: digest,
        })
    }

    /// In-place update; only `keep_remote` can change, so this re-reads.
    pub async fn update(&self, image: &RegistryImage) -> Result<RegistryImageState> {
        self.read(image).await
    }

    /// Delete the recorded manifest unless `keep_remote` is set.
    pub async fn delete(
        &self,
        image: &RegistryImage,
        state: &RegistryImageState,
    ) -> Result<RemoteTeardown> {
        if image.keep_remote {
            tracing::info!(image = %image.name, "keep_remote set, leaving remote manifest");
            return Ok(RemoteTeardown::Kept);
        }

        let reference = ImageRef::parse(&image.name)?;
        let target = ManifestTarget::with_reference(&reference, state.sha256_digest.to_string());
        let outcome = self
            .registry
            .delete_manifest(&target, self.credentials.resolve(&reference))
            .await?;

        tracing::info!(
            image = %image.name,
            digest = %state.sha256_digest,
            outcome = ?outcome,
            "remote manifest removed"
        );
        Ok(RemoteTeardown::Removed(outcome))
    }
}
