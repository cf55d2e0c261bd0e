// ABOUTME: Registry v2 HTTP client settings, request targets, and auth decoration.
// ABOUTME: TLS verification is strict unless the insecure environment switch is set.

use super::error::{ClientBuildSnafu, RegistryError, RejectedSnafu, TransportSnafu};
use super::token::BearerToken;
use crate::auth::Credentials;
use crate::types::ImageRef;
use reqwest::{RequestBuilder, Response, StatusCode};
use snafu::ResultExt;
use std::time::Duration;

/// Environment variable that relaxes TLS verification when set to an integer >= 1.
pub const INSECURE_TLS_ENV: &str = "REGKEEP_INSECURE_TLS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether the insecure TLS switch is on. Read once per registry call.
pub fn insecure_tls_from_env() -> bool {
    std::env::var(INSECURE_TLS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|n| n >= 1)
}

/// URL scheme used to reach registries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    #[default]
    Https,
    /// Plain HTTP, for local registries without TLS.
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// A manifest on a registry: `/v2/{repository}/manifests/{reference}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTarget {
    /// Registry host (and port).
    pub registry: String,
    /// Repository path as served by the registry.
    pub repository: String,
    /// Tag or digest.
    pub reference: String,
}

impl ManifestTarget {
    pub fn new(
        registry: impl Into<String>,
        repository: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
            reference: reference.into(),
        }
    }

    /// Target for an image reference: default registry and `library/`
    /// namespace applied, digest preferred over tag.
    pub fn for_image(image: &ImageRef) -> Self {
        Self::with_reference(image, image.manifest_reference())
    }

    /// Target for an image's repository with an explicit manifest reference.
    pub fn with_reference(image: &ImageRef, reference: impl Into<String>) -> Self {
        Self::new(image.registry_host(), image.remote_repository(), reference)
    }
}

/// Client for the registry v2 manifest endpoints.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    scheme: Scheme,
    timeout: Duration,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn manifest_url(&self, target: &ManifestTarget) -> String {
        format!(
            "{}://{}/v2/{}/manifests/{}",
            self.scheme.as_str(),
            target.registry,
            target.repository,
            target.reference
        )
    }

    /// Build the transport for a single call.
    pub(crate) fn http_client(&self, insecure: bool) -> Result<reqwest::Client, RegistryError> {
        if insecure {
            tracing::warn!("TLS certificate verification disabled for registry call");
        }
        reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .context(ClientBuildSnafu)
    }
}

/// Authorization attached to one registry request.
pub(crate) enum RequestAuth<'a> {
    Anonymous,
    Basic(&'a Credentials),
    Bearer(&'a BearerToken),
}

impl<'a> RequestAuth<'a> {
    /// Basic auth when a username was resolved, anonymous otherwise.
    pub(crate) fn basic(credentials: Option<&'a Credentials>) -> Self {
        match credentials {
            Some(creds) if !creds.username.is_empty() => RequestAuth::Basic(creds),
            _ => RequestAuth::Anonymous,
        }
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            RequestAuth::Anonymous => request,
            RequestAuth::Basic(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
            RequestAuth::Bearer(token) => request.bearer_auth(token.as_str()),
        }
    }
}

pub(crate) async fn send(
    request: RequestBuilder,
    target: &ManifestTarget,
) -> Result<Response, RegistryError> {
    request.send().await.context(TransportSnafu {
        registry: &target.registry,
        repository: &target.repository,
    })
}

pub(crate) fn rejected<T>(
    target: &ManifestTarget,
    operation: &str,
    status: StatusCode,
) -> Result<T, RegistryError> {
    RejectedSnafu {
        registry: &target.registry,
        repository: &target.repository,
        operation,
        status: status.to_string(),
    }
    .fail()
}
