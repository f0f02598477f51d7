//! Test doubles for driving request chains without a server.

use crate::session::{HttpSession, SessionError, SessionResponse};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One request as the mock session observed it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Bytes,
}

/// A scripted [`HttpSession`]: hand it responses in order, then inspect the
/// requests it received.
#[derive(Default)]
pub struct MockSession {
    responses: Mutex<VecDeque<Result<SessionResponse, SessionError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a 200 response with the given Content-Type and body.
    pub fn respond_with(&self, content_type: &str, body: impl Into<Bytes>) {
        self.respond_with_status(200, content_type, body);
    }

    pub fn respond_with_status(&self, status: u16, content_type: &str, body: impl Into<Bytes>) {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        self.responses.lock().push_back(Ok(SessionResponse {
            status,
            headers,
            body: body.into(),
        }));
    }

    pub fn fail_with(&self, error: SessionError) {
        self.responses.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpSession for MockSession {
    async fn post(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Bytes,
    ) -> Result<SessionResponse, SessionError> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SessionError::Transport("no scripted response".to_string())))
    }
}
