// ABOUTME: Push command implementation.
// ABOUTME: Detects the local engine, pushes the image and reads back its digest.

use regkeep::config::Config;
use regkeep::engine::{SocketEngine, detect_engine};
use regkeep::error::{Error, Result};
use regkeep::output::Output;
use regkeep::resource::{RegistryImage, RegistryImageResource};

pub async fn push(config: Config, name: String, mut output: Output) -> Result<()> {
    output.start_timer();
    let credentials = config.credential_table()?;
    let registry = config.registry_client();

    output.progress("  → Detecting image engine...");
    let socket = detect_engine(Some(&config.engine_config()))
        .map_err(|e| Error::Engine(e.to_string()))?;
    output.progress(&format!("  → Found {} at {}", socket.kind, socket.socket_path));

    let engine = SocketEngine::connect(&socket)?.with_tls_verify(config.tls_verify);
    engine.ping().await?;
    let resource = RegistryImageResource::new(&engine, &registry, &credentials);

    output.progress(&format!("  → Pushing {}...", name));
    let state = resource.create(&RegistryImage::new(name)).await?;

    let digest = state.sha256_digest.to_string();
    output.image_result(
        &format!("Pushed {} ({})", state.name, digest),
        &state.name,
        Some(digest.as_str()),
    );
    Ok(())
}
