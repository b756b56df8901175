//! Log entry handed to remote sinks

use super::fields::JsonPayload;
use super::http_request::HttpRequest;
use super::severity::Severity;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Label set attached to entries
pub type Labels = HashMap<String, String>;

/// Entry payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Formatted message from the print family
    Text(String),
    /// Message plus fields from the structured family
    Json(JsonPayload),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonPayload> {
        match self {
            Payload::Text(_) => None,
            Payload::Json(map) => Some(map),
        }
    }
}

/// One logging call, as seen by a remote sink
///
/// Labels and request are snapshots of the emitting facade at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub severity: Severity,
    pub payload: Payload,
    pub labels: Labels,
    pub http_request: Option<HttpRequest>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(severity: Severity, payload: Payload) -> Self {
        Self {
            severity,
            payload,
            labels: Labels::new(),
            http_request: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_request(mut self, request: Option<HttpRequest>) -> Self {
        self.http_request = request;
        self
    }
}
