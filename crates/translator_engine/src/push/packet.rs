//! Engine.IO v4 / Socket.IO v5 text packets, as carried by the polling
//! transport. Only the subset a notification client needs is understood.

use serde::Deserialize;
use serde_json::Value;

use super::PushError;

/// Separates packets inside one polling payload.
pub const RECORD_SEPARATOR: char = '\u{1e}';

pub const PONG: &str = "3";
pub const CONNECT: &str = "40";
pub const CLOSE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace connect acknowledged.
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(String),
    Unsupported(String),
}

/// Split a polling payload into packets. Empty records are skipped.
pub fn decode_payload(body: &str) -> Vec<Result<Packet, PushError>> {
    body.split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .map(decode_packet)
        .collect()
}

pub fn decode_packet(text: &str) -> Result<Packet, PushError> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| PushError::Decode("empty packet".into()))?;
    let rest = chars.as_str();
    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|err| PushError::Handshake(err.to_string())),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_message(rest),
        '6' => Ok(Packet::Noop),
        _ => Ok(Packet::Unsupported(text.to_string())),
    }
}

fn decode_message(text: &str) -> Result<Packet, PushError> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| PushError::Decode("empty message".into()))?;
    let rest = skip_namespace(chars.as_str());
    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(rest),
        '4' => Ok(Packet::ConnectError(connect_error_message(rest))),
        _ => Ok(Packet::Unsupported(format!("4{text}"))),
    }
}

/// Drop a leading `/namespace,` if present.
fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        match text.find(',') {
            Some(index) => &text[index + 1..],
            None => "",
        }
    } else {
        text
    }
}

fn decode_event(text: &str) -> Result<Packet, PushError> {
    let json = text.trim_start_matches(|c: char| c.is_ascii_digit());
    let items: Vec<Value> =
        serde_json::from_str(json).map_err(|err| PushError::Decode(err.to_string()))?;
    let mut items = items.into_iter();
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(PushError::Decode("event without a name".into())),
    };
    let payload = items.next().unwrap_or(Value::Null);
    Ok(Packet::Event { name, payload })
}

fn connect_error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| text.to_string())
}

pub fn encode_event(name: &str, payload: &Value) -> String {
    format!("42{}", Value::Array(vec![Value::String(name.to_string()), payload.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_packet_carries_session() {
        let packet =
            decode_packet(r#"0{"sid":"abc","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":20000}"#)
                .unwrap();
        assert_eq!(
            packet,
            Packet::Open(Handshake {
                sid: "abc".into(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn payload_splits_on_record_separator() {
        let body = "40{\"sid\":\"x\"}\u{1e}2\u{1e}42[\"progress\",{\"overall\":10}]";
        let packets: Vec<Packet> = decode_payload(body).into_iter().map(Result::unwrap).collect();
        assert_eq!(packets[0], Packet::Connect);
        assert_eq!(packets[1], Packet::Ping);
        assert_eq!(
            packets[2],
            Packet::Event {
                name: "progress".into(),
                payload: json!({"overall": 10}),
            }
        );
    }

    #[test]
    fn event_with_namespace_and_ack_id() {
        let packet = decode_packet("42/tasks,17[\"log\",{\"message\":\"hi\"}]").unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "log".into(),
                payload: json!({"message": "hi"}),
            }
        );
    }

    #[test]
    fn event_without_payload_gets_null() {
        let packet = decode_packet("42[\"ping\"]").unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "ping".into(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn malformed_event_is_an_error() {
        assert!(decode_packet("42{not json").is_err());
        assert!(decode_packet("42[1,2]").is_err());
        assert!(decode_packet("").is_err());
    }

    #[test]
    fn connect_error_message_is_extracted() {
        assert_eq!(
            decode_packet("44{\"message\":\"Not authorized\"}").unwrap(),
            Packet::ConnectError("Not authorized".into())
        );
    }

    #[test]
    fn join_event_encoding() {
        assert_eq!(
            encode_event("join", &json!({"task_id": "t1"})),
            r#"42["join",{"task_id":"t1"}]"#
        );
    }
}
