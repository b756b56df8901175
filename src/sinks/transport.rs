//! Wire model and transport for Cloud Logging `entries:write`

use super::auth::TokenSource;
use crate::core::{HttpRequest, JsonPayload, Labels, LogEntry, LoggerError, Payload, Result};
use chrono::SecondsFormat;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

/// Resource every entry is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Labels,
}

impl MonitoredResource {
    /// `{type: "project", labels: {project_id}}`
    pub fn project(project_id: &str) -> Self {
        let mut labels = Labels::new();
        labels.insert("project_id".to_string(), project_id.to_string());
        Self {
            kind: "project".to_string(),
            labels,
        }
    }
}

/// Body of a `WriteLogEntries` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest<'a> {
    pub log_name: &'a str,
    pub resource: &'a MonitoredResource,
    #[serde(skip_serializing_if = "no_labels")]
    pub labels: &'a Labels,
    pub entries: Vec<WireEntry<'a>>,
}

/// One entry as Cloud Logging expects it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry<'a> {
    pub severity: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_payload: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_payload: Option<&'a JsonPayload>,
    #[serde(skip_serializing_if = "no_labels")]
    pub labels: &'a Labels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_request: Option<&'a HttpRequest>,
}

impl<'a> From<&'a LogEntry> for WireEntry<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        let (text_payload, json_payload) = match &entry.payload {
            Payload::Text(text) => (Some(text.as_str()), None),
            Payload::Json(map) => (None, Some(map)),
        };
        Self {
            severity: entry.severity.cloud_name(),
            timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            text_payload,
            json_payload,
            labels: &entry.labels,
            http_request: entry.http_request.as_ref(),
        }
    }
}

fn no_labels(labels: &&Labels) -> bool {
    labels.is_empty()
}

/// Ships batches of entries to the ingestion service
///
/// Transports are created and used on the shipper thread only.
pub trait Transport {
    fn write_entries(&self, request: &WriteRequest<'_>) -> Result<()>;
}

/// HTTPS transport for the Cloud Logging REST API
pub struct HttpTransport {
    client: Client,
    url: String,
    tokens: TokenSource,
}

impl HttpTransport {
    pub fn new(endpoint: &str, tokens: TokenSource, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/v2/entries:write", endpoint.trim_end_matches('/')),
            tokens,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check that the token provider can serve this transport
    pub fn verify_tokens(&self) -> Result<()> {
        self.tokens.verify(&self.client)
    }
}

impl Transport for HttpTransport {
    fn write_entries(&self, request: &WriteRequest<'_>) -> Result<()> {
        let token = self.tokens.token(&self.client)?;
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(request)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(LoggerError::transport(format!(
            "entries:write returned {}: {}",
            status,
            body.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{format_payload, Fields, Severity};
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_entry(payload: Payload) -> LogEntry {
        let mut entry = LogEntry::new(Severity::Warning, payload);
        entry.timestamp = chrono::Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        entry
    }

    #[test]
    fn test_text_entry_wire_form() {
        let entry = fixed_entry(Payload::Text("foo: bar".to_string()));
        let value = serde_json::to_value(WireEntry::from(&entry)).unwrap();

        assert_eq!(
            value,
            json!({
                "severity": "WARNING",
                "timestamp": "2025-01-08T10:30:45.000000000Z",
                "textPayload": "foo: bar",
            })
        );
    }

    #[test]
    fn test_json_entry_carries_labels_and_request() {
        let payload = format_payload("done", &Fields::new().with("n", 1));
        let mut labels = Labels::new();
        labels.insert("request_id".to_string(), "abc".to_string());
        let entry = fixed_entry(Payload::Json(payload))
            .with_labels(labels)
            .with_request(Some(HttpRequest::new("GET", "/health").with_status(200)));

        let value = serde_json::to_value(WireEntry::from(&entry)).unwrap();
        assert_eq!(value["jsonPayload"], json!({"message": "done", "n": 1}));
        assert_eq!(value["labels"], json!({"request_id": "abc"}));
        assert_eq!(value["httpRequest"]["status"], json!(200));
        assert!(value.get("textPayload").is_none());
    }

    #[test]
    fn test_write_request_shape() {
        let resource = MonitoredResource::project("my-project");
        let mut common = Labels::new();
        common.insert("module".to_string(), "test".to_string());
        let entry = fixed_entry(Payload::Text("x".to_string()));

        let request = WriteRequest {
            log_name: "projects/my-project/logs/gcplog",
            resource: &resource,
            labels: &common,
            entries: vec![WireEntry::from(&entry)],
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["logName"], json!("projects/my-project/logs/gcplog"));
        assert_eq!(
            value["resource"],
            json!({"type": "project", "labels": {"project_id": "my-project"}})
        );
        assert_eq!(value["labels"], json!({"module": "test"}));
        assert_eq!(value["entries"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_endpoint_url() {
        let transport = HttpTransport::new(
            "https://logging.example.com/",
            TokenSource::Static("t".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(transport.url(), "https://logging.example.com/v2/entries:write");
    }
}
