// ABOUTME: Parses `WWW-Authenticate: Bearer ...` challenges from registry 401 responses.
// ABOUTME: Quote-aware, so scope values like repository:app:pull,push stay intact.

use std::collections::HashMap;

/// Where and how to obtain a bearer token, as announced by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: String,
    pub scope: String,
}

impl BearerChallenge {
    /// Whether a `WWW-Authenticate` value asks for bearer auth.
    pub fn is_bearer(header: &str) -> bool {
        header.starts_with("Bearer")
    }

    /// Parse a bearer challenge. Returns `None` for non-bearer headers and
    /// for challenges without a realm.
    pub fn parse(header: &str) -> Option<Self> {
        let params = header.strip_prefix("Bearer")?;
        let mut params = parse_params(params);

        let realm = params.remove("realm").filter(|r| !r.is_empty())?;
        Some(Self {
            realm,
            service: params.remove("service").unwrap_or_default(),
            scope: params.remove("scope").unwrap_or_default(),
        })
    }

    /// Token endpoint URL with `service` and `scope` query parameters.
    pub fn token_url(&self) -> String {
        let separator = if self.realm.contains('?') { '&' } else { '?' };
        format!(
            "{}{}service={}&scope={}",
            self.realm,
            separator,
            urlencoding::encode(&self.service),
            urlencoding::encode(&self.scope)
        )
    }
}

// key=value pairs separated by commas; values may be quoted with
// backslash escapes. Keys are case-insensitive.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ',' || c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && *c != ',') {
            key.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            continue;
        }

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
            value = value.trim().to_string();
        }

        params.insert(key.trim().to_ascii_lowercase(), value);
    }

    params
}
