//! REST API route handlers.
//!
//! The generation endpoint accepts the user's raw credential blob with every
//! request (the blob is decrypted by the session layer upstream of this
//! service and never persisted here) and answers either with a JSON body or
//! an SSE delta stream, depending on the `stream` flag.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use copyforge_dispatch::{DeltaStream, DispatchError, ErrorKind, GenerationRequest};

use crate::state::AppState;

/// Stream terminator sentinel, mirrored from the vendor convention.
const DONE_SENTINEL: &str = "[DONE]";

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Response payload for the `/api/status` endpoint.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_count: usize,
    pub skill_count: usize,
}

/// Return basic service status.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model_count: copyforge_catalog::all_models().len(),
        skill_count: copyforge_catalog::all_skills().len(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/models, GET /api/skills
// ---------------------------------------------------------------------------

/// List the model catalog.
pub async fn models() -> impl IntoResponse {
    Json(copyforge_catalog::all_models())
}

/// List the skill catalog.
pub async fn skills() -> impl IntoResponse {
    Json(copyforge_catalog::all_skills())
}

// ---------------------------------------------------------------------------
// POST /api/generate
// ---------------------------------------------------------------------------

/// Request payload for `/api/generate`.
#[derive(Deserialize)]
pub struct GenerateRequest {
    /// The user's persisted credential blob, passed through verbatim.
    pub keys: String,
    /// The user's prompt.
    pub message: String,
    /// Selected skill ids.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Requested model id; omitted selects the default.
    #[serde(default)]
    pub model: Option<String>,
    /// Select the SSE streaming reply.
    #[serde(default)]
    pub stream: bool,
}

/// Non-streaming success payload.
#[derive(Serialize)]
pub struct GenerateResponse {
    pub content: String,
}

/// Generate copy, streaming or not.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> Response {
    let request = GenerationRequest {
        credential_blob: payload.keys,
        message: payload.message,
        skills: payload.skills,
        model_id: payload.model,
    };

    if payload.stream {
        match state.dispatcher.stream(&request).await {
            Ok(deltas) => Sse::new(frame_events(deltas))
                .keep_alive(KeepAlive::default())
                .into_response(),
            Err(err) => error_response(&err),
        }
    } else {
        match state.dispatcher.complete(&request).await {
            Ok(content) => Json(GenerateResponse { content }).into_response(),
            Err(err) => error_response(&err),
        }
    }
}

// ---------------------------------------------------------------------------
// SSE framing
// ---------------------------------------------------------------------------

/// Frame a delta stream as SSE events.
///
/// Each delta becomes one `data: {"delta": …}` event.  Normal end appends
/// the `[DONE]` sentinel; a mid-stream failure instead appends one error
/// event and closes without the sentinel, so consumers can tell the two
/// endings apart.  Dropping this stream (client disconnect) drops the delta
/// stream and with it the vendor connection.
fn frame_events(deltas: DeltaStream) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    enum FrameState {
        Streaming(DeltaStream),
        Finished,
    }

    stream::unfold(FrameState::Streaming(deltas), |state| async move {
        match state {
            FrameState::Finished => None,
            FrameState::Streaming(mut deltas) => match deltas.next().await {
                Some(Ok(text)) => {
                    let event = Event::default().data(json!({ "delta": text }).to_string());
                    Some((Ok(event), FrameState::Streaming(deltas)))
                }
                Some(Err(err)) => {
                    tracing::warn!(kind = err.kind.as_str(), "generation stream failed mid-flight");
                    let event = Event::default().data(error_body(&err).to_string());
                    Some((Ok(event), FrameState::Finished))
                }
                None => Some((
                    Ok(Event::default().data(DONE_SENTINEL)),
                    FrameState::Finished,
                )),
            },
        }
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// The stable HTTP status for each error kind.
pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::MissingCredential => StatusCode::FORBIDDEN,
        ErrorKind::InvalidCredential => StatusCode::UNAUTHORIZED,
        ErrorKind::Billing => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::ModelUnavailable => StatusCode::NOT_FOUND,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::EmptyResponse | ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(err: &DispatchError) -> serde_json::Value {
    json!({
        "error": {
            "kind": err.kind.as_str(),
            "message": err.message,
        }
    })
}

fn error_response(err: &DispatchError) -> Response {
    tracing::debug!(kind = err.kind.as_str(), message = %err.message, "generation request failed");
    (status_for(err.kind), Json(error_body(err))).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_stable_statuses() {
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::MissingCredential), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::InvalidCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Billing), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status_for(ErrorKind::ModelUnavailable), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_for(ErrorKind::EmptyResponse),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(ErrorKind::Upstream), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_carries_kind_and_message() {
        let err = DispatchError::new(ErrorKind::RateLimited, "rate limit hit — retry shortly");
        let body = error_body(&err);
        assert_eq!(body["error"]["kind"], "rate_limited");
        assert_eq!(body["error"]["message"], "rate limit hit — retry shortly");
    }

    #[tokio::test]
    async fn frame_events_appends_done_sentinel_on_normal_end() {
        let deltas: DeltaStream =
            stream::iter(vec![Ok("Hello".to_owned()), Ok(" world".to_owned())]).boxed();

        let events: Vec<_> = frame_events(deltas).collect().await;
        assert_eq!(events.len(), 3);
        // The final frame is the sentinel, not a delta.
        let last = format!("{:?}", events[2].as_ref().unwrap());
        assert!(last.contains(DONE_SENTINEL));
    }

    #[tokio::test]
    async fn frame_events_ends_with_error_event_on_failure() {
        let deltas: DeltaStream = stream::iter(vec![
            Ok("partial".to_owned()),
            Err(DispatchError::new(ErrorKind::Upstream, "connection dropped")),
        ])
        .boxed();

        let events: Vec<_> = frame_events(deltas).collect().await;
        assert_eq!(events.len(), 2);
        let last = format!("{:?}", events[1].as_ref().unwrap());
        assert!(last.contains("upstream"));
        assert!(!last.contains(DONE_SENTINEL));
    }
}
