// ABOUTME: Reads the current manifest digest for a tag from the registry.
// ABOUTME: Uses Docker-Content-Digest, hashing the manifest body when the header is absent.

use super::client::{
    ManifestTarget, RegistryClient, RequestAuth, insecure_tls_from_env, rejected, send,
};
use super::error::{InvalidDigestSnafu, RegistryError, TransportSnafu};
use super::token::answer_challenge;
use crate::auth::Credentials;
use crate::types::Digest;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use snafu::ResultExt;

pub const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Manifest media types we ask for, so the registry reports the digest of
/// the manifest that was pushed rather than a converted one.
pub const MANIFEST_MEDIA_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.oci.image.index.v1+json",
];

impl RegistryClient {
    /// Digest of the manifest at `target`.
    ///
    /// A 401 with a bearer challenge is answered once, like a delete. A
    /// missing manifest is an error here: it is read right after a push.
    pub async fn manifest_digest(
        &self,
        target: &ManifestTarget,
        credentials: Option<&Credentials>,
    ) -> Result<Digest, RegistryError> {
        let http = self.http_client(insecure_tls_from_env())?;
        let url = self.manifest_url(target);
        let accept = MANIFEST_MEDIA_TYPES.join(", ");
        let request = |method: Method, auth: &RequestAuth<'_>| {
            auth.apply(http.request(method, &url).header(ACCEPT, &accept))
        };

        let basic = RequestAuth::basic(credentials);
        let mut response = send(request(Method::HEAD, &basic), target).await?;

        let token = if response.status() == StatusCode::UNAUTHORIZED {
            let token = answer_challenge(&http, &response, target, credentials).await?;
            response = send(request(Method::HEAD, &RequestAuth::Bearer(&token)), target).await?;
            Some(token)
        } else {
            None
        };

        if response.status() != StatusCode::OK {
            return rejected(target, "read", response.status());
        }

        if let Some(header) = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
        {
            return Digest::parse(header.trim()).context(InvalidDigestSnafu {
                registry: &target.registry,
                repository: &target.repository,
            });
        }

        tracing::debug!(url = %url, "no {} header, hashing manifest body", DOCKER_CONTENT_DIGEST);
        let auth = match &token {
            Some(token) => RequestAuth::Bearer(token),
            None => basic,
        };
        fetch_and_hash(request(Method::GET, &auth), target).await
    }
}

async fn fetch_and_hash(
    request: RequestBuilder,
    target: &ManifestTarget,
) -> Result<Digest, RegistryError> {
    let response = send(request, target).await?;
    if response.status() != StatusCode::OK {
        return rejected(target, "read", response.status());
    }
    let body = response.bytes().await.context(TransportSnafu {
        registry: &target.registry,
        repository: &target.repository,
    })?;
    Ok(Digest::sha256_of(&body))
}
