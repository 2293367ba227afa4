//! SignalR JSON hub protocol, version 1
//!
//! Every record on the wire is a JSON document terminated by the ASCII
//! record separator (0x1E). A single websocket frame may carry several.

use serde::Deserialize;
use serde_json::Value;

pub const RECORD_SEPARATOR: char = '\u{1e}';

const INVOCATION: u64 = 1;
const COMPLETION: u64 = 3;
const PING: u64 = 6;
const CLOSE: u64 = 7;

/// A decoded hub message
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// The server invoked a client method, e.g. `sendEpc`
    Invocation {
        target: String,
        arguments: Vec<Value>,
    },
    /// Result of an invocation we sent
    Completion {
        invocation_id: String,
        error: Option<String>,
    },
    Ping,
    /// The server is closing the connection
    Close { error: Option<String> },
    /// Message types this client has no use for (streaming, acks)
    Other(u64),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: u64,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(rename = "invocationId", default)]
    invocation_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    error: Option<String>,
}

/// The first record a client sends after the websocket opens
pub fn handshake_request() -> String {
    format!(r#"{{"protocol":"json","version":1}}{}"#, RECORD_SEPARATOR)
}

/// Check the server's answer to [`handshake_request`]
pub fn parse_handshake_response(record: &str) -> crate::Result<()> {
    let response: HandshakeResponse = serde_json::from_str(record)?;
    match response.error {
        Some(error) => Err(crate::EntradaError::Hub(format!(
            "Handshake rejected: {}",
            error
        ))),
        None => Ok(()),
    }
}

/// Split a frame into its non-empty records
pub fn split_records(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|record| !record.is_empty())
}

pub fn parse_message(record: &str) -> crate::Result<HubMessage> {
    let raw: RawMessage = serde_json::from_str(record)?;

    let message = match raw.kind {
        INVOCATION => HubMessage::Invocation {
            target: raw.target.ok_or_else(|| {
                crate::EntradaError::Hub("Invocation without a target".to_string())
            })?,
            arguments: raw.arguments,
        },
        COMPLETION => HubMessage::Completion {
            invocation_id: raw.invocation_id.unwrap_or_default(),
            error: raw.error,
        },
        PING => HubMessage::Ping,
        CLOSE => HubMessage::Close { error: raw.error },
        other => HubMessage::Other(other),
    };
    Ok(message)
}

pub fn encode_invocation(invocation_id: &str, target: &str, arguments: &[Value]) -> String {
    let body = serde_json::json!({
        "type": INVOCATION,
        "invocationId": invocation_id,
        "target": target,
        "arguments": arguments,
    });
    format!("{}{}", body, RECORD_SEPARATOR)
}

pub fn encode_ping() -> String {
    format!(r#"{{"type":{}}}{}"#, PING, RECORD_SEPARATOR)
}
