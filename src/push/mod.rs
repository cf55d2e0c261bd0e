// ABOUTME: Pushes a local image through the image engine under resolved credentials.
// ABOUTME: Drains the record stream and fails on the first embedded error record.

mod engine;
mod record;

pub use engine::{PushEngine, PushError, PushRequest, PushStream};
pub use record::{ErrorDetail, MAX_RECORD_LEN, PushAux, PushRecord, RecordDecoder};

use crate::auth::{CredentialTable, RegistryAuth};
use crate::types::{Digest, ImageRef};
use futures::StreamExt;

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSummary {
    /// Image that was pushed.
    pub image: String,
    /// Number of records the engine emitted.
    pub records: usize,
    /// Manifest digest, when the engine reported one.
    pub digest: Option<Digest>,
}

/// Push `image` using credentials from `credentials`.
///
/// References without a registry use the default registry's credentials. When
/// nothing matches, an anonymous (empty object) auth payload is still sent.
pub async fn push_image<E>(
    engine: &E,
    credentials: &CredentialTable,
    image: &str,
) -> Result<PushSummary, PushError>
where
    E: PushEngine + ?Sized,
{
    let image = ImageRef::parse(image)?;
    let auth = RegistryAuth::resolve(credentials, &image);
    let registry_auth = auth.encode_header().map_err(PushError::Encode)?;

    tracing::debug!(
        image = %image,
        registry = %image.registry_address(),
        anonymous = auth.is_anonymous(),
        "pushing image"
    );

    let request = PushRequest {
        image,
        auth,
        registry_auth,
    };
    let stream = engine.push(&request).await?;
    let summary = drain_push_stream(&request.image, stream).await?;

    tracing::info!(
        image = %summary.image,
        records = summary.records,
        digest = ?summary.digest,
        "push completed"
    );
    Ok(summary)
}

/// Consume a push stream to the end or to its first error record.
///
/// The stream is owned here, so it is dropped (and its connection closed) on
/// every return path.
pub async fn drain_push_stream(
    image: &ImageRef,
    mut stream: PushStream,
) -> Result<PushSummary, PushError> {
    let mut summary = PushSummary {
        image: image.to_string(),
        records: 0,
        digest: None,
    };

    while let Some(record) = stream.next().await {
        let record = record?;
        summary.records += 1;

        if let Some(message) = record.error_message() {
            tracing::warn!(image = %image, error = message, "push reported an error");
            return Err(PushError::Failed {
                image: image.to_string(),
                message: message.to_string(),
            });
        }

        if let Some(digest) = record.pushed_digest() {
            summary.digest = Some(digest);
        }

        tracing::debug!(image = %image, "{}", record.describe());
    }

    Ok(summary)
}
