// ABOUTME: Digest command implementation.
// ABOUTME: Reads the manifest digest a registry currently serves for an image.

use regkeep::config::Config;
use regkeep::engine::SocketEngine;
use regkeep::error::Result;
use regkeep::output::Output;
use regkeep::resource::{RegistryImage, RegistryImageResource};

pub async fn digest(config: Config, name: String, output: Output) -> Result<()> {
    let credentials = config.credential_table()?;
    let registry = config.registry_client();
    let resource = RegistryImageResource::<SocketEngine>::without_engine(&registry, &credentials);

    let state = resource.read(&RegistryImage::new(name)).await?;
    let digest = state.sha256_digest.to_string();
    output.image_result(
        &format!("{} {}", state.name, digest),
        &state.name,
        Some(digest.as_str()),
    );
    Ok(())
}
