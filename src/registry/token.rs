// ABOUTME: Bearer token exchange for registry 401 challenges.
// ABOUTME: Fetches a short-lived token from the challenge realm, reusing basic credentials.

use super::challenge::BearerChallenge;
use super::client::{ManifestTarget, RequestAuth, send};
use super::error::{
    BadCredentialsSnafu, MalformedChallengeSnafu, MissingTokenSnafu, RegistryError,
    TokenFetchSnafu, TokenParseSnafu, TransportSnafu,
};
use crate::auth::Credentials;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use std::fmt;

/// Short-lived token used once to decorate a retried request.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Parse a token endpoint body. `token` wins over `access_token`.
pub fn parse_token(body: &[u8], realm: &str) -> Result<BearerToken, RegistryError> {
    let parsed: TokenResponse = serde_json::from_slice(body).context(TokenParseSnafu { realm })?;
    parsed
        .token
        .filter(|t| !t.is_empty())
        .or(parsed.access_token.filter(|t| !t.is_empty()))
        .map(BearerToken::new)
        .context(MissingTokenSnafu { realm })
}

/// Answer a 401: require a bearer challenge, then fetch its token.
pub(crate) async fn answer_challenge(
    http: &reqwest::Client,
    response: &Response,
    target: &ManifestTarget,
    credentials: Option<&Credentials>,
) -> Result<BearerToken, RegistryError> {
    let header = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !BearerChallenge::is_bearer(header) {
        return BadCredentialsSnafu {
            registry: &target.registry,
            repository: &target.repository,
            status: response.status().to_string(),
        }
        .fail();
    }

    let challenge = BearerChallenge::parse(header).context(MalformedChallengeSnafu {
        registry: &target.registry,
        header,
    })?;

    fetch_token(http, &challenge, target, credentials).await
}

pub(crate) async fn fetch_token(
    http: &reqwest::Client,
    challenge: &BearerChallenge,
    target: &ManifestTarget,
    credentials: Option<&Credentials>,
) -> Result<BearerToken, RegistryError> {
    tracing::debug!(
        realm = %challenge.realm,
        service = %challenge.service,
        scope = %challenge.scope,
        "requesting bearer token"
    );

    let request = RequestAuth::basic(credentials).apply(http.get(challenge.token_url()));
    let response = send(request, target).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return TokenFetchSnafu {
            realm: &challenge.realm,
            registry: &target.registry,
            repository: &target.repository,
            status: status.to_string(),
        }
        .fail();
    }

    let body = response.bytes().await.context(TransportSnafu {
        registry: &target.registry,
        repository: &target.repository,
    })?;

    parse_token(&body, &challenge.realm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reads_token_field() {
        let token = parse_token(br#"{"token":"abc","expires_in":300}"#, "realm").unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn falls_back_to_access_token() {
        let token = parse_token(br#"{"access_token":"xyz"}"#, "realm").unwrap();
        assert_eq!(token.as_str(), "xyz");
    }

    #[test]
    fn malformed_json_is_parse_failure() {
        let err = parse_token(b"<html>oops</html>", "realm").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenParseFailed);
    }

    #[test]
    fn missing_token_is_parse_failure() {
        let err = parse_token(br#"{"expires_in":300}"#, "realm").unwrap_err();
        assert!(matches!(err, RegistryError::MissingToken { .. }));
        assert_eq!(err.kind(), ErrorKind::TokenParseFailed);
    }

    #[test]
    fn debug_redacts_token() {
        assert!(!format!("{:?}", BearerToken::new("s3cret")).contains("s3cret"));
    }
}
