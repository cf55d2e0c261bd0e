// ABOUTME: Integration tests for the registry image create/read/update/delete boundary.
// ABOUTME: Uses a scripted engine and a mock registry; nothing touches a real daemon.

mod support;

use async_trait::async_trait;
use regkeep::auth::{CredentialTable, Credentials};
use regkeep::error::{Error, ErrorKind};
use regkeep::push::{PushEngine, PushError, PushRecord, PushRequest, PushStream};
use regkeep::registry::{DOCKER_CONTENT_DIGEST, DeleteOutcome};
use regkeep::resource::{RegistryImage, RegistryImageResource, RegistryImageState, RemoteTeardown};
use regkeep::types::Digest;
use support::{DIGEST, init_tracing, plain_http_client, registry_host};
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Engine whose pushes always succeed with a single status record.
struct AcceptingEngine;

#[async_trait]
impl PushEngine for AcceptingEngine {
    async fn push(&self, _request: &PushRequest) -> Result<PushStream, PushError> {
        let record = PushRecord {
            status: Some("Pushed".to_string()),
            ..Default::default()
        };
        Ok(Box::pin(futures::stream::iter(vec![Ok(record)])))
    }
}

/// Engine whose pushes fail with an error record.
struct DenyingEngine;

#[async_trait]
impl PushEngine for DenyingEngine {
    async fn push(&self, _request: &PushRequest) -> Result<PushStream, PushError> {
        let record = PushRecord {
            error: Some("denied".to_string()),
            ..Default::default()
        };
        Ok(Box::pin(futures::stream::iter(vec![Ok(record)])))
    }
}

fn recorded_state(name: &str) -> RegistryImageState {
    RegistryImageState {
        id: DIGEST.to_string(),
        name: name.to_string(),
        sha256_digest: Digest::parse(DIGEST).unwrap(),
    }
}

#[tokio::test]
async fn create_pushes_then_reads_digest() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/v2/team/app/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).insert_header(DOCKER_CONTENT_DIGEST, DIGEST))
        .expect(1)
        .mount(&server)
        .await;

    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::new(&AcceptingEngine, &registry, &credentials);

    let name = format!("{}/team/app:v1", registry_host(&server));
    let state = resource.create(&RegistryImage::new(&name)).await.unwrap();
    assert_eq!(state.id, DIGEST);
    assert_eq!(state.name, name);
    assert_eq!(state.sha256_digest.to_string(), DIGEST);
}

#[tokio::test]
async fn failed_push_skips_digest_read() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::new(&DenyingEngine, &registry, &credentials);

    let name = format!("{}/team/app:v1", registry_host(&server));
    let err = resource.create(&RegistryImage::new(name)).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::PushFailed));
}

#[tokio::test]
async fn create_without_engine_fails() {
    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::<AcceptingEngine>::without_engine(&registry, &credentials);

    let err = resource
        .create(&RegistryImage::new("ghcr.io/org/app"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
}

#[tokio::test]
async fn keep_remote_delete_makes_no_request() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::new(&AcceptingEngine, &registry, &credentials);

    let name = format!("{}/team/app:v1", registry_host(&server));
    let image = RegistryImage {
        keep_remote: true,
        ..RegistryImage::new(&name)
    };
    let teardown = resource.delete(&image, &recorded_state(&name)).await.unwrap();
    assert_eq!(teardown, RemoteTeardown::Kept);
}

#[tokio::test]
async fn delete_targets_recorded_digest_with_credentials() {
    init_tracing();
    let server = MockServer::start().await;
    // "u:p"
    Mock::given(method("DELETE"))
        .and(path(format!("/v2/team/app/manifests/{}", DIGEST)))
        .and(header("Authorization", "Basic dTpw"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let host = registry_host(&server);
    let registry = plain_http_client();
    let credentials: CredentialTable = [(host.as_str(), Credentials::new("u", "p"))]
        .into_iter()
        .collect();
    let resource = RegistryImageResource::new(&AcceptingEngine, &registry, &credentials);

    let name = format!("{}/team/app:v1", host);
    let teardown = resource
        .delete(&RegistryImage::new(&name), &recorded_state(&name))
        .await
        .unwrap();
    assert_eq!(teardown, RemoteTeardown::Removed(DeleteOutcome::Deleted));
}

#[tokio::test]
async fn delete_of_absent_manifest_succeeds() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::<AcceptingEngine>::without_engine(&registry, &credentials);

    let name = format!("{}/team/app", registry_host(&server));
    let teardown = resource
        .delete(&RegistryImage::new(&name), &recorded_state(&name))
        .await
        .unwrap();
    assert_eq!(teardown, RemoteTeardown::Removed(DeleteOutcome::AlreadyAbsent));
}

#[tokio::test]
async fn update_rereads_digest() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/v2/team/app/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).insert_header(DOCKER_CONTENT_DIGEST, DIGEST))
        .expect(1)
        .mount(&server)
        .await;

    let registry = plain_http_client();
    let credentials = CredentialTable::default();
    let resource = RegistryImageResource::<AcceptingEngine>::without_engine(&registry, &credentials);

    let image = RegistryImage {
        keep_remote: true,
        ..RegistryImage::new(format!("{}/team/app:v1", registry_host(&server)))
    };
    let state = resource.update(&image).await.unwrap();
    assert_eq!(state.id, DIGEST);
}
