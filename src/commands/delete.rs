// ABOUTME: Delete command implementation.
// ABOUTME: Removes a recorded manifest digest from its registry, honoring keep_remote.

use regkeep::config::Config;
use regkeep::engine::SocketEngine;
use regkeep::error::{Error, Result};
use regkeep::output::Output;
use regkeep::registry::DeleteOutcome;
use regkeep::resource::{RegistryImage, RegistryImageResource, RegistryImageState, RemoteTeardown};
use regkeep::types::Digest;

pub async fn delete(
    config: Config,
    name: String,
    digest: String,
    keep_remote: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let digest = Digest::parse(&digest).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let credentials = config.credential_table()?;
    let registry = config.registry_client();
    let resource = RegistryImageResource::<SocketEngine>::without_engine(&registry, &credentials);

    let image = RegistryImage {
        keep_remote,
        ..RegistryImage::new(name)
    };
    let state = RegistryImageState {
        id: digest.to_string(),
        name: image.name.clone(),
        sha256_digest: digest,
    };

    let message = match resource.delete(&image, &state).await? {
        RemoteTeardown::Kept => format!("Kept {} on the registry", image.name),
        RemoteTeardown::Removed(DeleteOutcome::Deleted) => {
            format!("Deleted {}@{}", image.name, state.sha256_digest)
        }
        RemoteTeardown::Removed(DeleteOutcome::AlreadyAbsent) => {
            format!("{}@{} was already absent", image.name, state.sha256_digest)
        }
    };
    output.image_result(&message, &image.name, Some(state.id.as_str()));
    Ok(())
}
