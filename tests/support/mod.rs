// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, sample digests and a mock registry client.

use regkeep::registry::{RegistryClient, Scheme};
use std::sync::Once;
use std::time::Duration;
use wiremock::MockServer;

static TRACING_INIT: Once = Once::new();

/// A well-formed sha256 manifest digest.
#[allow(dead_code)]
pub const DIGEST: &str =
    "sha256:4a5b7c1d2e3f40516273849aabbccddeeff00112233445566778899aabbccdd0";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("regkeep=debug".parse().unwrap())
            .add_directive("wiremock=info".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Registry client that talks plain HTTP to a wiremock server.
#[allow(dead_code)]
pub fn plain_http_client() -> RegistryClient {
    RegistryClient::new()
        .with_scheme(Scheme::Http)
        .with_timeout(Duration::from_secs(5))
}

/// `host:port` of a mock server, as it appears in image references.
#[allow(dead_code)]
pub fn registry_host(server: &MockServer) -> String {
    server.address().to_string()
}
