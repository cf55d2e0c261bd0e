// ABOUTME: Content digest parsing and validation.
// ABOUTME: Accepts algorithm:hex strings such as sha256:<64 hex chars>.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("digest {0:?} has no algorithm separator")]
    MissingSeparator(String),

    #[error("digest {0:?} has an empty algorithm or encoded part")]
    EmptyPart(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("{algorithm} digest must be {expected} hex characters, got {actual}")]
    Length {
        algorithm: String,
        expected: usize,
        actual: usize,
    },

    #[error("digest contains invalid character {0:?}")]
    Charset(char),
}

/// A content-addressable digest, e.g. `sha256:4c1f...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    encoded: String,
}

impl Digest {
    pub fn parse(input: &str) -> Result<Self, DigestError> {
        let (algorithm, encoded) = input
            .split_once(':')
            .ok_or_else(|| DigestError::MissingSeparator(input.to_string()))?;

        if algorithm.is_empty() || encoded.is_empty() {
            return Err(DigestError::EmptyPart(input.to_string()));
        }

        let expected = match algorithm {
            "sha256" => 64,
            "sha384" => 96,
            "sha512" => 128,
            other => return Err(DigestError::UnsupportedAlgorithm(other.to_string())),
        };

        if let Some(bad) = encoded
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(DigestError::Charset(bad));
        }

        if encoded.len() != expected {
            return Err(DigestError::Length {
                algorithm: algorithm.to_string(),
                expected,
                actual: encoded.len(),
            });
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }

    /// Digest of `bytes` using SHA-256.
    pub fn sha256_of(bytes: &[u8]) -> Self {
        use sha2::{Digest as _, Sha256};
        Self {
            algorithm: "sha256".to_string(),
            encoded: hex::encode(Sha256::digest(bytes)),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
