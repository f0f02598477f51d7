//! Multipart GraphQL response parsing.
//!
//! Subscriptions and deferred queries stream several payloads per HTTP
//! response, encoded as `multipart/mixed` parts separated by `--boundary`
//! lines and terminated by `--boundary--`.

use crate::error::ClientError;
use serde_json::Value;

/// One event decoded from a multipart stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartEvent {
    /// A payload chunk, already unwrapped from the `{"payload": ...}`
    /// subscription envelope when present.
    Chunk(Value),
    /// The `--boundary--` terminator.
    End,
}

/// Extracts the `boundary` parameter from a `multipart/mixed` Content-Type.
pub fn boundary_parameter(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("boundary=")
            .map(|value| value.trim_matches('"').to_string())
    })
}

/// True when the Content-Type advertises a multipart protocol this client
/// understands (`subscriptionSpec=1.0` or a `deferSpec`).
pub fn is_known_multipart(content_type: &str) -> bool {
    content_type.starts_with("multipart/mixed")
        && (content_type.contains("subscriptionSpec=") || content_type.contains("deferSpec="))
}

/// Splits a complete multipart body into payload events.
///
/// Line endings are normalized before splitting so CRLF and LF streams parse
/// identically. Each part consists of headers, a blank line, then a JSON
/// body; heartbeat parts (empty JSON objects without payload) are skipped.
pub fn parse_multipart_body(body: &[u8], boundary: &str) -> Result<Vec<MultipartEvent>, ClientError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| ClientError::Parse("multipart body is not valid UTF-8".to_string()))?;
    let normalized = text.replace("\r\n", "\n");
    let delimiter = format!("--{boundary}");

    let mut events = Vec::new();
    // The first segment is the preamble before the first delimiter.
    for segment in normalized.split(&delimiter).skip(1) {
        if segment.starts_with("--") {
            events.push(MultipartEvent::End);
            break;
        }
        let Some(chunk) = parse_part(segment)? else {
            continue;
        };
        events.push(MultipartEvent::Chunk(chunk));
    }
    Ok(events)
}

fn parse_part(segment: &str) -> Result<Option<Value>, ClientError> {
    // Headers end at the first blank line; a part without headers is all body.
    let body = match segment.split_once("\n\n") {
        Some((_headers, body)) => body,
        None => segment,
    };
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::Parse(format!("invalid JSON in multipart part: {e}")))?;

    // Subscription payloads arrive wrapped as {"payload": <envelope>}; a
    // null payload is a heartbeat.
    match value {
        Value::Object(mut object) if object.contains_key("payload") => {
            match object.remove("payload") {
                Some(Value::Null) | None => Ok(None),
                Some(payload) => Ok(Some(payload)),
            }
        }
        Value::Object(object) if object.is_empty() => Ok(None),
        other => Ok(Some(other)),
    }
}
