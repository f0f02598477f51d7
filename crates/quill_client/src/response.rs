//! HTTP responses flowing through the request chain.

use bytes::Bytes;
use indexmap::IndexMap;
use quill_core::{GraphQLResult, Operation, ResponseEnvelope};

/// The response to a single operation request, carried interceptor to
/// interceptor. Parsing interceptors fill in `envelope` and `parsed`;
/// everything downstream of the network fetch sees the raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse<Op: Operation> {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Bytes,
    /// The decoded wire envelope, kept around so the cache write can
    /// normalize the raw payload after typed parsing succeeded.
    pub envelope: Option<ResponseEnvelope>,
    pub parsed: Option<GraphQLResult<Op::Data>>,
    /// False only for multipart chunks with more parts behind them; the
    /// chain treats end-of-chain delivery of a non-final part as
    /// non-terminal.
    pub is_final_part: bool,
}

impl<Op: Operation> HttpResponse<Op> {
    pub fn new(status: u16, headers: IndexMap<String, String>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            envelope: None,
            parsed: None,
            is_final_part: true,
        }
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
