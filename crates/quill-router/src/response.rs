//! Write-once HTTP response.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// The output side of a request.
///
/// Headers can be set at any point, but the status and body are written by
/// exactly one emit call. Once a response has been emitted the middleware
/// chain stops advancing and later emits are dropped.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    sent: bool,
}

impl Response {
    /// Creates an empty, not yet emitted response.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            sent: false,
        }
    }

    /// Serializes `data` as the JSON body and emits it with `status`.
    ///
    /// A serialization failure is returned to the caller and leaves the
    /// response untouched.
    pub fn emit_json<T: Serialize + ?Sized>(&mut self, data: &T, status: u16) -> Result<()> {
        if self.sent {
            warn!(status, "response already emitted, dropping JSON body");
            return Ok(());
        }

        let body = serde_json::to_vec(data)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.finish(status, body);
        Ok(())
    }

    /// Emits `body` verbatim with `status`, leaving the content type alone.
    pub fn emit_raw(&mut self, body: impl Into<Vec<u8>>, status: u16) {
        if self.sent {
            warn!(status, "response already emitted, dropping raw body");
            return;
        }
        self.finish(status, body.into());
    }

    /// Sets a header.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    fn finish(&mut self, status: u16, body: Vec<u8>) {
        self.status = status;
        self.body = body;
        self.sent = true;
    }

    /// Returns whether an emit call has happened.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Gets a header value (case-insensitive).
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Decodes the body as JSON.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Splits the response into status, headers and body for the transport.
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
