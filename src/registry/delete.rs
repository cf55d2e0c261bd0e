// ABOUTME: Manifest deletion via the registry v2 API with one bearer-challenge retry.
// ABOUTME: 202 deletes, 404 counts as already gone, 401 enters the token handshake.

use super::client::{
    ManifestTarget, RegistryClient, RequestAuth, insecure_tls_from_env, rejected, send,
};
use super::error::RegistryError;
use super::token::{BearerToken, answer_challenge};
use crate::auth::Credentials;
use reqwest::StatusCode;

/// Terminal success states of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The registry accepted the delete.
    Deleted,
    /// The manifest did not exist; nothing to do.
    AlreadyAbsent,
}

/// The two request shapes of a delete. `Retrying` carries the token that
/// replaces basic auth.
enum DeleteState {
    Initial,
    Retrying(BearerToken),
}

impl RegistryClient {
    /// Delete the manifest at `target`, tolerating one that is already gone.
    ///
    /// Basic auth is attached only when a username was resolved. A 401 with a
    /// bearer challenge triggers exactly one token fetch and one retry; the
    /// retried request accepts 200 as well as 202 since registries answer it
    /// either way.
    pub async fn delete_manifest(
        &self,
        target: &ManifestTarget,
        credentials: Option<&Credentials>,
    ) -> Result<DeleteOutcome, RegistryError> {
        let http = self.http_client(insecure_tls_from_env())?;
        let url = self.manifest_url(target);
        let mut state = DeleteState::Initial;

        loop {
            state = match state {
                DeleteState::Initial => {
                    tracing::debug!(url = %url, "deleting manifest");
                    let request = RequestAuth::basic(credentials).apply(http.delete(&url));
                    let response = send(request, target).await?;

                    match response.status() {
                        StatusCode::ACCEPTED => return Ok(DeleteOutcome::Deleted),
                        StatusCode::NOT_FOUND => {
                            tracing::info!(url = %url, "manifest already absent");
                            return Ok(DeleteOutcome::AlreadyAbsent);
                        }
                        StatusCode::UNAUTHORIZED => {
                            let token =
                                answer_challenge(&http, &response, target, credentials).await?;
                            DeleteState::Retrying(token)
                        }
                        status => return rejected(target, "delete", status),
                    }
                }
                DeleteState::Retrying(token) => {
                    tracing::debug!(url = %url, "retrying manifest delete with bearer token");
                    let request = RequestAuth::Bearer(&token).apply(http.delete(&url));
                    let response = send(request, target).await?;

                    return match response.status() {
                        StatusCode::OK | StatusCode::ACCEPTED => Ok(DeleteOutcome::Deleted),
                        status => rejected(target, "delete", status),
                    };
                }
            };
        }
    }
}
