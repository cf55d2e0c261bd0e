// ABOUTME: Integration tests for credential resolution.
// ABOUTME: Tests table normalization, image lookups, and Docker config parsing.

use regkeep::auth::{CredentialTable, Credentials, DockerConfig, RegistryAuth};
use regkeep::types::ImageRef;

fn hub_table() -> CredentialTable {
    [
        (
            "registry.hub.docker.com",
            Credentials::new("hubuser", "hubpass"),
        ),
        ("ghcr.io", Credentials::new("octo", "pat")),
    ]
    .into_iter()
    .collect()
}

#[test]
fn unqualified_and_hub_qualified_images_share_entry() {
    let table = hub_table();
    let short = ImageRef::parse("consul").unwrap();
    let long = ImageRef::parse("registry.hub.docker.com/library/consul").unwrap();

    let a = table.resolve(&short).unwrap();
    let b = table.resolve(&long).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.username, "hubuser");
}

#[test]
fn qualified_image_resolves_its_registry() {
    let table = hub_table();
    let image = ImageRef::parse("ghcr.io/octo/app:v1").unwrap();
    assert_eq!(table.resolve(&image).unwrap().username, "octo");
}

#[test]
fn unknown_registry_resolves_to_nothing() {
    let table = hub_table();
    let image = ImageRef::parse("quay.io/team/app").unwrap();
    assert!(table.resolve(&image).is_none());
    assert!(RegistryAuth::resolve(&table, &image).is_anonymous());
}

#[test]
fn scheme_qualified_keys_are_kept() {
    let table: CredentialTable = [("http://localhost:5000", Credentials::new("dev", "dev"))]
        .into_iter()
        .collect();
    assert!(table.get("http://localhost:5000").is_some());
    assert!(table.get("localhost:5000").is_none());
}

#[test]
fn debug_output_redacts_password() {
    let creds = Credentials::new("octo", "super-secret");
    let rendered = format!("{creds:?}");
    assert!(rendered.contains("octo"));
    assert!(!rendered.contains("super-secret"));
}

#[test]
fn docker_config_entries_feed_the_table() {
    let config = DockerConfig::from_json(
        r#"{
            "auths": {
                "https://index.docker.io/v1/": {"auth": "aHVzZXI6aHBhc3M="},
                "ghcr.io": {"username": "octo", "password": "pat"},
                "quay.io": {}
            },
            "credsStore": "desktop"
        }"#,
    )
    .unwrap();

    let table: CredentialTable = ["registry.hub.docker.com", "ghcr.io", "quay.io"]
        .into_iter()
        .filter_map(|address| {
            config
                .credentials_for(address)
                .unwrap()
                .map(|creds| (address, creds))
        })
        .collect();
    assert_eq!(
        table.addresses(),
        vec!["https://ghcr.io", "https://registry.hub.docker.com"]
    );

    let consul = ImageRef::parse("consul").unwrap();
    assert_eq!(
        table.resolve(&consul),
        Some(&Credentials::new("huser", "hpass"))
    );
}

#[test]
fn malformed_auth_field_is_an_error() {
    let config =
        DockerConfig::from_json(r#"{"auths":{"ghcr.io":{"auth":"not base64!"}}}"#).unwrap();
    assert!(config.credentials_for("ghcr.io").is_err());
}
