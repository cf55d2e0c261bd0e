// ABOUTME: Registry auth payload sent to the image engine on push.
// ABOUTME: Encodes as URL-safe base64 JSON; anonymous pushes send an empty object.

use super::CredentialTable;
use crate::types::ImageRef;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::Serialize;
use std::fmt;

/// Auth payload for the engine's `X-Registry-Auth` header.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "serveraddress", skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl RegistryAuth {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve auth for `image` from the table, falling back to anonymous.
    pub fn resolve(table: &CredentialTable, image: &ImageRef) -> Self {
        match table.resolve(image) {
            Some(creds) => Self {
                username: Some(creds.username.clone()),
                password: Some(creds.password.clone()),
                server: Some(image.registry_address()),
            },
            None => Self::anonymous(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }

    /// Header value: URL-safe base64 of the JSON payload.
    pub fn encode_header(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE.encode(json))
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("server", &self.server)
            .finish()
    }
}
