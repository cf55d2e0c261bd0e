// ABOUTME: Image push over the engine's Unix socket with the caller's X-Registry-Auth header.
// ABOUTME: Speaks the Docker-compatible push endpoint or libpod's, decoding the body lazily.

use crate::push::{PushError, PushRecord, PushStream, RecordDecoder};
use crate::types::ImageRef;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::body::Body;
use hyper_util::rt::TokioIo;
use std::collections::VecDeque;
use std::fmt;
use tokio::net::UnixStream;

const LIBPOD_API: &str = "/v4.0.0/libpod";

/// Push endpoint served on the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PushApi {
    /// `POST /images/{name}/push?tag=`, served by Docker and Podman.
    Compat,
    /// libpod push with registry TLS verification off.
    LibpodInsecure,
}

/// Push `image`, sending `registry_auth` verbatim as `X-Registry-Auth`.
pub(super) async fn push(
    socket_path: &str,
    api: PushApi,
    image: &ImageRef,
    registry_auth: &str,
) -> Result<PushStream, PushError> {
    let image_name = image.to_string();

    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| PushError::Engine(format!("failed to connect to socket: {}", e)))?;

    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| PushError::Engine(format!("HTTP handshake failed: {}", e)))?;

    // Spawn connection handler
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::warn!("engine connection error: {}", e);
        }
    });

    let uri = push_uri(api, image);
    tracing::debug!(uri = %uri, api = ?api, "posting push to engine");

    let req = hyper::Request::builder()
        .method("POST")
        .uri(&uri)
        .header("Host", "localhost")
        .header("X-Registry-Auth", registry_auth)
        .body(Empty::<Bytes>::new())
        .map_err(|e| PushError::Engine(format!("failed to build request: {}", e)))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| PushError::Engine(format!("request failed: {}", e)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| PushError::Engine(format!("failed to read error response: {}", e)))?;
        return Err(PushError::Failed {
            image: image_name,
            message: api_error_message(status.as_u16(), &body.to_bytes()),
        });
    }

    Ok(records(resp.into_body()))
}

fn push_uri(api: PushApi, image: &ImageRef) -> String {
    match api {
        PushApi::Compat => match image.tag() {
            Some(tag) => format!(
                "/images/{}/push?tag={}",
                image.name(),
                urlencoding::encode(tag)
            ),
            None => format!("/images/{}/push", image.name()),
        },
        PushApi::LibpodInsecure => {
            let image_name = image.to_string();
            format!(
                "{}/images/{}/push?destination={}&tlsVerify=false",
                LIBPOD_API,
                image_name,
                urlencoding::encode(&image_name)
            )
        }
    }
}

// Both APIs answer errors with a JSON object carrying "message".
fn api_error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("engine API error {}: {}", status, String::from_utf8_lossy(body)))
}

struct BodyRecords<B> {
    body: B,
    decoder: RecordDecoder,
    pending: VecDeque<Result<PushRecord, PushError>>,
    finished: bool,
}

fn records<B>(body: B) -> PushStream
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: fmt::Display + Send,
{
    let state = BodyRecords {
        body,
        decoder: RecordDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(record) = state.pending.pop_front() {
                return Some((record, state));
            }
            if state.finished {
                return None;
            }
            match state.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        let decoded = state.decoder.feed(&data);
                        state.pending.extend(decoded);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(PushError::Engine(format!("push stream error: {}", e))));
                }
                None => {
                    state.finished = true;
                    let rest = state.decoder.finish();
                    state.pending.extend(rest);
                }
            }
        }
    }))
}
