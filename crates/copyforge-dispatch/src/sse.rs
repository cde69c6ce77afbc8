//! SSE adaptation: one delta stream shape for every vendor.
//!
//! Each vendor delivers increments over SSE in its own dialect:
//!
//! - **OpenAI / xAI**: `data:` lines carrying `choices[].delta.content`,
//!   terminated by a `data: [DONE]` sentinel.
//! - **Anthropic**: `event:`/`data:` pairs; text arrives in
//!   `content_block_delta` events and `message_stop` ends the message.
//! - **Google**: `data:` lines carrying `candidates[].content.parts[].text`;
//!   the stream simply ends.
//!
//! A per-vendor line parser reduces each dialect to [`LineEvent`], and
//! [`delta_stream`] lifts the response byte stream through that parser into
//! a pull-based stream of text chunks.  Because the result is pull-based,
//! dropping it drops the vendor connection; a consumer that walks away stops
//! the token spend.

use std::collections::VecDeque;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde_json::Value;

use copyforge_catalog::Vendor;

use crate::transport::{CallFailure, RawDeltaStream};

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// What one SSE line contributed.
#[derive(Debug, PartialEq)]
enum LineEvent {
    /// A text increment to forward.
    Delta(String),
    /// The vendor signalled normal end of stream.
    Done,
    /// Keepalive, metadata, or an empty delta; nothing to forward.
    Ignore,
}

/// Per-vendor SSE line parser.
#[derive(Debug)]
enum DeltaParser {
    /// OpenAI-compatible dialect (also xAI).
    OpenAi,
    /// Anthropic event/data dialect; carries the pending `event:` type.
    Anthropic { event: Option<String> },
    /// Google `alt=sse` dialect.
    Google,
}

impl DeltaParser {
    fn for_vendor(vendor: Vendor) -> Self {
        match vendor {
            Vendor::OpenAi | Vendor::Xai => DeltaParser::OpenAi,
            Vendor::Anthropic => DeltaParser::Anthropic { event: None },
            Vendor::Google => DeltaParser::Google,
        }
    }

    /// Feed one line; `Err` carries a reason for an unreadable or
    /// vendor-reported stream failure.
    fn feed(&mut self, line: &str) -> std::result::Result<LineEvent, String> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with(':') {
            return Ok(LineEvent::Ignore);
        }

        match self {
            DeltaParser::OpenAi => Self::feed_openai(line),
            DeltaParser::Anthropic { event } => Self::feed_anthropic(event, line),
            DeltaParser::Google => Self::feed_google(line),
        }
    }

    fn feed_openai(line: &str) -> std::result::Result<LineEvent, String> {
        let Some(data) = line.strip_prefix("data: ") else {
            return Ok(LineEvent::Ignore);
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Ok(LineEvent::Done);
        }

        let v = parse_json(data)?;
        match v["choices"][0]["delta"]["content"].as_str() {
            Some(text) if !text.is_empty() => Ok(LineEvent::Delta(text.to_owned())),
            _ => Ok(LineEvent::Ignore),
        }
    }

    fn feed_anthropic(
        pending_event: &mut Option<String>,
        line: &str,
    ) -> std::result::Result<LineEvent, String> {
        if let Some(event) = line.strip_prefix("event: ") {
            *pending_event = Some(event.to_owned());
            return Ok(LineEvent::Ignore);
        }
        let Some(data) = line.strip_prefix("data: ") else {
            return Ok(LineEvent::Ignore);
        };

        let event = pending_event.take().unwrap_or_default();
        match event.as_str() {
            "content_block_delta" => {
                let v = parse_json(data)?;
                if v["delta"]["type"] == "text_delta" {
                    if let Some(text) = v["delta"]["text"].as_str() {
                        if !text.is_empty() {
                            return Ok(LineEvent::Delta(text.to_owned()));
                        }
                    }
                }
                Ok(LineEvent::Ignore)
            }
            "message_stop" => Ok(LineEvent::Done),
            // The Messages API reports mid-stream faults as an `error` event.
            "error" => {
                let v = parse_json(data)?;
                let message = v["error"]["message"].as_str().unwrap_or("vendor stream error");
                Err(message.to_owned())
            }
            _ => Ok(LineEvent::Ignore),
        }
    }

    fn feed_google(line: &str) -> std::result::Result<LineEvent, String> {
        let Some(data) = line.strip_prefix("data: ") else {
            return Ok(LineEvent::Ignore);
        };

        let v = parse_json(data)?;
        let text = v["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            Ok(LineEvent::Ignore)
        } else {
            Ok(LineEvent::Delta(text))
        }
    }
}

fn parse_json(data: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(data).map_err(|e| format!("invalid JSON in SSE data: {e}"))
}

// ---------------------------------------------------------------------------
// Stream adaptation
// ---------------------------------------------------------------------------

/// Adapt a vendor SSE response into a [`RawDeltaStream`].
pub(crate) fn delta_stream(vendor: Vendor, resp: reqwest::Response) -> RawDeltaStream {
    let bytes = resp
        .bytes_stream()
        .map(|r| {
            r.map(|chunk| chunk.to_vec())
                .map_err(|e| format!("stream read error: {e}"))
        })
        .boxed();
    adapt_byte_stream(vendor, bytes)
}

/// State threaded through the unfold loop below.
struct Adapter {
    bytes: BoxStream<'static, std::result::Result<Vec<u8>, String>>,
    /// Raw bytes not yet decodable (a UTF-8 sequence split across chunks).
    raw: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    lines: String,
    parser: DeltaParser,
    /// Deltas parsed out of the current chunk but not yet yielded.
    pending: VecDeque<std::result::Result<String, CallFailure>>,
    finished: bool,
}

/// Lift a chunked byte stream through a vendor line parser.
///
/// Deltas are yielded strictly in arrival order and never merged.  After a
/// vendor end signal (or stream EOF) the adapter yields nothing further; a
/// read error or unreadable payload yields one terminal `Err` item.
pub(crate) fn adapt_byte_stream(
    vendor: Vendor,
    bytes: BoxStream<'static, std::result::Result<Vec<u8>, String>>,
) -> RawDeltaStream {
    let adapter = Adapter {
        bytes,
        raw: Vec::new(),
        lines: String::new(),
        parser: DeltaParser::for_vendor(vendor),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(adapter, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.bytes.next().await {
                // Vendor closed the connection; for Google this is the normal
                // end, for the sentinel dialects it means the sentinel was
                // already consumed or the vendor hung up early.
                None => {
                    st.finished = true;
                }
                Some(Err(reason)) => {
                    st.finished = true;
                    st.pending.push_back(Err(CallFailure::Network { reason }));
                }
                Some(Ok(chunk)) => {
                    st.raw.extend_from_slice(&chunk);
                    match take_valid_utf8(&mut st.raw) {
                        Ok(text) => st.lines.push_str(&text),
                        Err(reason) => {
                            st.finished = true;
                            st.pending.push_back(Err(CallFailure::Protocol { reason }));
                            continue;
                        }
                    }

                    while let Some(pos) = st.lines.find('\n') {
                        let line = st.lines[..pos].to_owned();
                        st.lines.drain(..=pos);

                        match st.parser.feed(&line) {
                            Ok(LineEvent::Delta(text)) => st.pending.push_back(Ok(text)),
                            Ok(LineEvent::Ignore) => {}
                            Ok(LineEvent::Done) => {
                                st.finished = true;
                                break;
                            }
                            Err(reason) => {
                                st.finished = true;
                                st.pending.push_back(Err(CallFailure::Protocol { reason }));
                                break;
                            }
                        }
                    }
                }
            }
        }
    })
    .boxed()
}

/// Split the longest valid UTF-8 prefix out of `raw`, leaving any trailing
/// incomplete sequence in place for the next chunk.
fn take_valid_utf8(raw: &mut Vec<u8>) -> std::result::Result<String, String> {
    let valid_len = match std::str::from_utf8(raw) {
        Ok(_) => raw.len(),
        // An incomplete trailing sequence is expected at chunk boundaries.
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => return Err(format!("invalid UTF-8 in stream: {e}")),
    };

    let tail = raw.split_off(valid_len);
    let prefix = std::mem::replace(raw, tail);
    String::from_utf8(prefix).map_err(|e| format!("invalid UTF-8 in stream: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
