//! Multipart form bodies for file upload mutations.
//!
//! Follows the GraphQL multipart request convention: an `operations` part
//! carrying the operation JSON, a `map` part binding file parts to variable
//! paths, then one part per file.

use crate::error::ClientError;
use crate::request::UploadFile;
use bytes::Bytes;
use quill_core::Operation;
use serde_json::json;
use uuid::Uuid;

/// Builds the form body and its Content-Type for an upload request.
pub fn build_upload_body<Op: Operation>(
    operation: &Op,
    files: &[UploadFile],
) -> Result<(String, Bytes), ClientError> {
    let boundary = format!("quill-{}", Uuid::new_v4().simple());

    let variables = match operation.variables() {
        Some(variables) => {
            serde_json::to_value(variables).map_err(|e| ClientError::Upload(e.to_string()))?
        }
        None => json!({}),
    };
    let operations = json!({
        "query": Op::DOCUMENT,
        "operationName": Op::NAME,
        "variables": variables,
    });

    let mut map = serde_json::Map::new();
    for (index, file) in files.iter().enumerate() {
        map.insert(
            index.to_string(),
            json!([format!("variables.{}", file.field_name)]),
        );
    }

    let mut body = Vec::new();
    push_field(&mut body, &boundary, "operations", &operations.to_string());
    push_field(
        &mut body,
        &boundary,
        "map",
        &serde_json::Value::Object(map).to_string(),
    );
    for (index, file) in files.iter().enumerate() {
        let contents = std::fs::read(&file.path).map_err(|e| {
            ClientError::Upload(format!("could not read {}: {e}", file.path.display()))
        })?;
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{index}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                file.original_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(&contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok((
        format!("multipart/form-data; boundary={boundary}"),
        Bytes::from(body),
    ))
}

fn push_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .as_bytes(),
    );
}
