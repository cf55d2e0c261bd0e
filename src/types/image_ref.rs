// ABOUTME: Container image reference parsing and registry address normalization.
// ABOUTME: Handles formats like consul, host:5000/ns/app:tag, app@sha256:<hex>.

use super::digest::{Digest, DigestError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Registry used when a reference names no registry host.
pub const DEFAULT_REGISTRY: &str = "registry.hub.docker.com";

/// Namespace the default registry uses for unqualified (official) images.
pub const DEFAULT_NAMESPACE: &str = "library";

pub const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseImageRefError {
    #[error("invalid digest in image reference {reference:?}: {source}")]
    InvalidDigest {
        reference: String,
        source: DigestError,
    },
}

/// A parsed image reference.
///
/// The repository is kept exactly as written; use [`ImageRef::remote_repository`]
/// for the path the registry actually serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    repository: String,
    tag: Option<String>,
    digest: Option<Digest>,
}

impl ImageRef {
    /// Parse a reference. Only a malformed `@digest` suffix is an error; every
    /// other input produces some reference since registries disagree on which
    /// repository names they accept.
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();

        let (rest, digest) = split_digest(input)?;
        let (rest, tag) = split_tag(rest);
        let (registry, repository) = split_registry(rest);

        let tag = match (tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (tag, _) => tag,
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    /// Registry host this reference addresses, falling back to the default registry.
    pub fn registry_host(&self) -> &str {
        match self.registry.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => DEFAULT_REGISTRY,
        }
    }

    /// Repository path on the registry. The default registry serves
    /// single-segment names under the `library/` namespace.
    pub fn remote_repository(&self) -> String {
        if self.registry_host() == DEFAULT_REGISTRY && !self.repository.contains('/') {
            format!("{}/{}", DEFAULT_NAMESPACE, self.repository)
        } else {
            self.repository.clone()
        }
    }

    /// Scheme-qualified registry address used as the credential table key.
    pub fn registry_address(&self) -> String {
        normalize_registry_address(self.registry.as_deref().unwrap_or_default())
    }

    /// Manifest reference to address on the registry: the digest if present,
    /// otherwise the tag.
    pub fn manifest_reference(&self) -> String {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => digest.to_string(),
            (None, Some(tag)) => tag.clone(),
            (None, None) => DEFAULT_TAG.to_string(),
        }
    }

    /// Name without tag or digest, as the image engine expects for a push.
    pub fn name(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.repository),
            None => self.repository.clone(),
        }
    }
}

/// Map a registry component to the key format of the credential table.
///
/// An empty registry becomes the default registry; a bare host gains an
/// explicit `https://` scheme.
pub fn normalize_registry_address(registry: &str) -> String {
    let registry = registry.trim();
    if registry.is_empty() {
        return format!("https://{}", DEFAULT_REGISTRY);
    }
    if registry.starts_with("https://") || registry.starts_with("http://") {
        return registry.to_string();
    }
    format!("https://{}", registry)
}

fn split_digest(input: &str) -> Result<(&str, Option<Digest>), ParseImageRefError> {
    match input.split_once('@') {
        Some((rest, raw)) => {
            let digest =
                Digest::parse(raw).map_err(|source| ParseImageRefError::InvalidDigest {
                    reference: input.to_string(),
                    source,
                })?;
            Ok((rest, Some(digest)))
        }
        None => Ok((input, None)),
    }
}

// A tag can only live in the last path segment; a colon before the last
// slash belongs to a registry port.
fn split_tag(input: &str) -> (&str, Option<String>) {
    let last_segment = input.rfind('/').map(|i| i + 1).unwrap_or(0);
    match input[last_segment..].rfind(':') {
        Some(offset) => {
            let colon = last_segment + offset;
            let tag = &input[colon + 1..];
            let tag = (!tag.is_empty()).then(|| tag.to_string());
            (&input[..colon], tag)
        }
        None => (input, None),
    }
}

fn split_registry(input: &str) -> (Option<String>, String) {
    match input.split_once('/') {
        Some((first, rest)) if is_registry_host(first) => {
            (Some(first.to_string()), rest.to_string())
        }
        _ => (None, input.to_string()),
    }
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

impl FromStr for ImageRef {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
