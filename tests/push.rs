// ABOUTME: Integration tests for pushing through a scripted image engine.
// ABOUTME: Covers error-record detection, digest capture and the registry auth header.

mod support;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use regkeep::auth::{CredentialTable, Credentials};
use regkeep::error::ErrorKind;
use regkeep::push::{PushEngine, PushError, PushRecord, PushRequest, PushStream, push_image};
use std::sync::Mutex;
use support::{DIGEST, init_tracing};

/// Engine that replays canned NDJSON lines and remembers each request.
struct ScriptedEngine {
    lines: Vec<&'static str>,
    requests: Mutex<Vec<PushRequest>>,
}

impl ScriptedEngine {
    fn new(lines: Vec<&'static str>) -> Self {
        Self {
            lines,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> PushRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl PushEngine for ScriptedEngine {
    async fn push(&self, request: &PushRequest) -> Result<PushStream, PushError> {
        self.requests.lock().unwrap().push(request.clone());
        let records: Vec<Result<PushRecord, PushError>> = self
            .lines
            .iter()
            .map(|line| serde_json::from_str(line).map_err(|e| PushError::Decode(e.to_string())))
            .collect();
        Ok(Box::pin(futures::stream::iter(records)))
    }
}

fn decode_header(header: &str) -> serde_json::Value {
    let bytes = URL_SAFE.decode(header).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn error_record_after_progress_fails_push() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![
        r#"{"status":"The push refers to repository [ghcr.io/org/app]"}"#,
        r#"{"status":"Pushing","progressDetail":{"current":512,"total":1024},"id":"a1b2"}"#,
        r#"{"errorDetail":{"message":"denied: requested access to the resource is denied"},"error":"denied: requested access to the resource is denied"}"#,
        r#"{"status":"never reached"}"#,
    ]);

    let err = push_image(&engine, &CredentialTable::default(), "ghcr.io/org/app:v1")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PushFailed);
    match err {
        PushError::Failed { image, message } => {
            assert_eq!(image, "ghcr.io/org/app:v1");
            assert_eq!(message, "denied: requested access to the resource is denied");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn error_detail_alone_fails_push() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![r#"{"errorDetail":{"message":"blob upload unknown"}}"#]);

    let err = push_image(&engine, &CredentialTable::default(), "ghcr.io/org/app")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("blob upload unknown"));
}

#[tokio::test]
async fn clean_stream_succeeds_with_digest() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![
        r#"{"status":"Pushed","id":"a1b2"}"#,
        r#"{"status":"v1: digest: sha256:4a5b size: 528"}"#,
        r#"{"progressDetail":{},"aux":{"Tag":"v1","Digest":"sha256:4a5b7c1d2e3f40516273849aabbccddeeff00112233445566778899aabbccdd0","Size":528}}"#,
    ]);

    let summary = push_image(&engine, &CredentialTable::default(), "ghcr.io/org/app:v1")
        .await
        .unwrap();
    assert_eq!(summary.records, 3);
    assert_eq!(summary.digest.map(|d| d.to_string()).as_deref(), Some(DIGEST));
}

#[tokio::test]
async fn empty_stream_is_success() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![]);
    let summary = push_image(&engine, &CredentialTable::default(), "app")
        .await
        .unwrap();
    assert_eq!(summary.records, 0);
    assert!(summary.digest.is_none());
}

#[tokio::test]
async fn anonymous_push_sends_empty_object() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![r#"{"status":"Pushed"}"#]);

    push_image(&engine, &CredentialTable::default(), "registry.example.com/team/app:v1")
        .await
        .unwrap();

    let request = engine.last_request();
    assert_eq!(request.registry_auth, "e30=");
    assert_eq!(decode_header(&request.registry_auth), serde_json::json!({}));
}

#[tokio::test]
async fn unqualified_image_uses_default_registry_credentials() {
    init_tracing();
    let table: CredentialTable = [(
        "registry.hub.docker.com",
        Credentials::new("hubuser", "hubpass"),
    )]
    .into_iter()
    .collect();
    let engine = ScriptedEngine::new(vec![]);

    push_image(&engine, &table, "consul:1.16").await.unwrap();

    let header = decode_header(&engine.last_request().registry_auth);
    assert_eq!(header["username"], "hubuser");
    assert_eq!(header["password"], "hubpass");
    assert_eq!(header["serveraddress"], "https://registry.hub.docker.com");
}

#[tokio::test]
async fn invalid_digest_is_rejected_before_engine_call() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![]);

    let err = push_image(&engine, &CredentialTable::default(), "app@sha256:short")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
    assert!(engine.requests.lock().unwrap().is_empty());
}
