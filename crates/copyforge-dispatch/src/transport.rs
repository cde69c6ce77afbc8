//! Vendor transport layer.
//!
//! [`VendorClient`] is the seam between the dispatcher and the outside
//! world: one call shape per vendor, issued in either delivery mode.  The
//! production implementation, [`HttpVendorClient`], speaks three wire
//! protocols:
//!
//! - **OpenAI Chat Completions** (also used for xAI, which differs only in
//!   its base URL),
//! - **Anthropic Messages**,
//! - **Google Gemini `generateContent`**.
//!
//! Failures at this layer are unclassified [`CallFailure`] values; the
//! dispatcher owns turning them into the user-facing error taxonomy.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use copyforge_catalog::Vendor;

use crate::sse;
use crate::types::{CompletionCall, MAX_OUTPUT_TOKENS, REQUEST_TIMEOUT, TEMPERATURE};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// xAI API base URL (OpenAI-compatible wire format).
const XAI_BASE_URL: &str = "https://api.x.ai/v1";

/// Anthropic API base URL.
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Google Generative Language API base URL.
const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Failures and stream type
// ---------------------------------------------------------------------------

/// An unclassified transport-level failure.
#[derive(Debug, Clone)]
pub enum CallFailure {
    /// The vendor answered with a non-success HTTP status.
    Status { code: u16, body: String },
    /// The request never completed (connect, TLS, read, timeout).
    Network { reason: String },
    /// The vendor answered but the payload was not in the documented shape.
    Protocol { reason: String },
}

/// An unclassified stream of text deltas from one vendor call.
pub type RawDeltaStream =
    Pin<Box<dyn Stream<Item = std::result::Result<String, CallFailure>> + Send>>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One completion capability per vendor call, in two delivery modes.
///
/// The dispatcher resolves the vendor once and then invokes this uniformly;
/// tests substitute counting doubles.
#[async_trait]
pub trait VendorClient: Send + Sync {
    /// Issue one non-streaming completion and return the raw content text.
    ///
    /// An empty string is a valid return here; the dispatcher decides what
    /// an empty response means.
    async fn complete(&self, call: CompletionCall) -> std::result::Result<String, CallFailure>;

    /// Open one streaming completion.
    async fn open_stream(
        &self,
        call: CompletionCall,
    ) -> std::result::Result<RawDeltaStream, CallFailure>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Production [`VendorClient`] over reqwest.
///
/// The shared client carries no global timeout: the non-streaming path sets
/// [`REQUEST_TIMEOUT`] per request, while the streaming path stays open for
/// as long as the consumer keeps pulling.
pub struct HttpVendorClient {
    http: reqwest::Client,
}

impl Default for HttpVendorClient {
    fn default() -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("copyforge/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl HttpVendorClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VendorClient for HttpVendorClient {
    async fn complete(&self, call: CompletionCall) -> std::result::Result<String, CallFailure> {
        let url = endpoint(call.vendor, &call.model, false);
        let headers = auth_headers(&call)?;
        let body = request_body(&call, false);

        tracing::debug!(url = %url, vendor = %call.vendor, model = %call.model, "sending completion request");

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallFailure::Network {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| CallFailure::Network {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(CallFailure::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| CallFailure::Protocol {
            reason: format!("invalid JSON response: {e}"),
        })?;

        Ok(extract_content(call.vendor, &v))
    }

    async fn open_stream(
        &self,
        call: CompletionCall,
    ) -> std::result::Result<RawDeltaStream, CallFailure> {
        let url = endpoint(call.vendor, &call.model, true);
        let headers = auth_headers(&call)?;
        let body = request_body(&call, true);

        tracing::debug!(url = %url, vendor = %call.vendor, model = %call.model, "opening completion stream");

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallFailure::Network {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CallFailure::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        Ok(sse::delta_stream(call.vendor, resp))
    }
}

// ---------------------------------------------------------------------------
// Request building (free functions, unit-tested)
// ---------------------------------------------------------------------------

/// The URL for one vendor call.
///
/// Only catalog model ids ever reach the Google arm (unknown ids resolve to
/// the default vendor), so the path interpolation sees a fixed id set.
fn endpoint(vendor: Vendor, model: &str, stream: bool) -> String {
    match vendor {
        Vendor::OpenAi => format!("{OPENAI_BASE_URL}/chat/completions"),
        Vendor::Xai => format!("{XAI_BASE_URL}/chat/completions"),
        Vendor::Anthropic => format!("{ANTHROPIC_BASE_URL}/v1/messages"),
        Vendor::Google => {
            let method = if stream {
                "streamGenerateContent?alt=sse"
            } else {
                "generateContent"
            };
            format!("{GOOGLE_BASE_URL}/models/{model}:{method}")
        }
    }
}

/// Authentication and content-type headers for one vendor call.
fn auth_headers(call: &CompletionCall) -> std::result::Result<HeaderMap, CallFailure> {
    let secret_header = |value: &str| {
        HeaderValue::from_str(value).map_err(|e| CallFailure::Protocol {
            reason: format!("API key is not a valid header value: {e}"),
        })
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match call.vendor {
        Vendor::OpenAi | Vendor::Xai => {
            headers.insert(AUTHORIZATION, secret_header(&format!("Bearer {}", call.api_key))?);
        }
        Vendor::Anthropic => {
            headers.insert("x-api-key", secret_header(&call.api_key)?);
            headers.insert(
                "anthropic-version",
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
        }
        Vendor::Google => {
            headers.insert("x-goog-api-key", secret_header(&call.api_key)?);
        }
    }

    Ok(headers)
}

/// Build the JSON request body for one vendor call.
pub(crate) fn request_body(call: &CompletionCall, stream: bool) -> Value {
    match call.vendor {
        Vendor::OpenAi | Vendor::Xai => openai_body(call, stream),
        Vendor::Anthropic => anthropic_body(call, stream),
        Vendor::Google => google_body(call),
    }
}

fn openai_body(call: &CompletionCall, stream: bool) -> Value {
    let mut body = json!({
        "model": call.model,
        "messages": [
            {"role": "system", "content": call.system},
            {"role": "user", "content": call.message},
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_OUTPUT_TOKENS,
    });
    if stream {
        body["stream"] = json!(true);
    }
    body
}

/// Anthropic takes the system instruction as a top-level field, not a
/// message.
fn anthropic_body(call: &CompletionCall, stream: bool) -> Value {
    let mut body = json!({
        "model": call.model,
        "max_tokens": MAX_OUTPUT_TOKENS,
        "temperature": TEMPERATURE,
        "system": call.system,
        "messages": [
            {"role": "user", "content": call.message},
        ],
    });
    if stream {
        body["stream"] = json!(true);
    }
    body
}

/// Google selects streaming by endpoint, not by a body flag.
fn google_body(call: &CompletionCall) -> Value {
    json!({
        "systemInstruction": {"parts": [{"text": call.system}]},
        "contents": [
            {"role": "user", "parts": [{"text": call.message}]},
        ],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
        },
    })
}

/// Pull the generated text out of a non-streaming response body.
///
/// Returns an empty string when the content field is missing or empty; the
/// dispatcher classifies that case.
pub(crate) fn extract_content(vendor: Vendor, v: &Value) -> String {
    match vendor {
        Vendor::OpenAi | Vendor::Xai => v["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_owned(),
        Vendor::Anthropic => v["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default(),
        Vendor::Google => v["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn call(vendor: Vendor, model: &str) -> CompletionCall {
        CompletionCall {
            vendor,
            model: model.to_owned(),
            api_key: "test-key".to_owned(),
            system: "You write copy.".to_owned(),
            message: "Write a headline".to_owned(),
        }
    }

    #[test]
    fn openai_body_shape() {
        let body = request_body(&call(Vendor::OpenAi, "gpt-4o"), false);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 2000);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.75).abs() < 1e-6, "temperature was {temp}");
        assert!(body.get("stream").is_none());

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You write copy.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Write a headline");
    }

    #[test]
    fn openai_streaming_body_sets_flag() {
        let body = request_body(&call(Vendor::OpenAi, "gpt-4o"), true);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn xai_reuses_openai_body_with_different_endpoint() {
        let xai = request_body(&call(Vendor::Xai, "grok-3"), false);
        let openai = request_body(&call(Vendor::OpenAi, "grok-3"), false);
        assert_eq!(xai, openai);

        assert_eq!(
            endpoint(Vendor::Xai, "grok-3", false),
            "https://api.x.ai/v1/chat/completions"
        );
        assert_eq!(
            endpoint(Vendor::OpenAi, "gpt-4o", false),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn anthropic_body_has_top_level_system() {
        let body = request_body(&call(Vendor::Anthropic, "claude-sonnet-4-20250514"), false);

        assert_eq!(body["system"], "You write copy.");
        assert_eq!(body["max_tokens"], 2000);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn google_body_and_endpoints() {
        let body = request_body(&call(Vendor::Google, "gemini-2.0-flash"), false);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You write copy.");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Write a headline");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
        assert!(body.get("stream").is_none());

        assert_eq!(
            endpoint(Vendor::Google, "gemini-2.0-flash", false),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            endpoint(Vendor::Google, "gemini-2.0-flash", true),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn auth_header_per_vendor() {
        let headers = auth_headers(&call(Vendor::OpenAi, "gpt-4o")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer test-key");

        let headers = auth_headers(&call(Vendor::Anthropic, "claude-sonnet-4-20250514")).unwrap();
        assert_eq!(headers["x-api-key"], "test-key");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);

        let headers = auth_headers(&call(Vendor::Google, "gemini-2.0-flash")).unwrap();
        assert_eq!(headers["x-goog-api-key"], "test-key");
    }

    #[test]
    fn extract_openai_content() {
        let v = json!({
            "choices": [{"message": {"role": "assistant", "content": "Buy Now"}}]
        });
        assert_eq!(extract_content(Vendor::OpenAi, &v), "Buy Now");

        let empty = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert_eq!(extract_content(Vendor::OpenAi, &empty), "");
    }

    #[test]
    fn extract_anthropic_content_joins_text_blocks() {
        let v = json!({
            "content": [
                {"type": "text", "text": "Buy "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "Now"},
            ]
        });
        assert_eq!(extract_content(Vendor::Anthropic, &v), "Buy Now");
    }

    #[test]
    fn extract_google_content_joins_parts() {
        let v = json!({
            "candidates": [{"content": {"parts": [{"text": "Buy "}, {"text": "Now"}]}}]
        });
        assert_eq!(extract_content(Vendor::Google, &v), "Buy Now");

        let blocked = json!({"candidates": []});
        assert_eq!(extract_content(Vendor::Google, &blocked), "");
    }
}
