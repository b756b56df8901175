//! HTTP request descriptor attached to log entries

use serde::{Serialize, Serializer};
use std::time::Duration;

/// Request context carried by a facade and copied onto every entry it emits
///
/// Serializes to the Cloud Logging `HttpRequest` object. Every field is
/// optional; unset fields are omitted from the wire form.
///
/// # Example
///
/// ```
/// use gcplog::HttpRequest;
/// use std::time::Duration;
///
/// let req = HttpRequest::new("GET", "https://example.com/items/7")
///     .with_status(200)
///     .with_latency(Duration::from_millis(42));
/// assert_eq!(req.status, Some(200));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_latency"
    )]
    pub latency: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            request_method: Some(method.into()),
            request_url: Some(url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_remote_ip(mut self, remote_ip: impl Into<String>) -> Self {
        self.remote_ip = Some(remote_ip.into());
        self
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn with_sizes(mut self, request_size: u64, response_size: u64) -> Self {
        self.request_size = Some(request_size);
        self.response_size = Some(response_size);
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }
}

/// Durations go over the wire as decimal seconds with an `s` suffix
fn serialize_latency<S: Serializer>(
    latency: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match latency {
        Some(d) => serializer.serialize_str(&format_latency(*d)),
        None => serializer.serialize_none(),
    }
}

fn format_latency(d: Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", d.as_secs());
    }
    let fraction = format!("{:09}", nanos);
    format!("{}.{}s", d.as_secs(), fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latency_format() {
        assert_eq!(format_latency(Duration::from_secs(3)), "3s");
        assert_eq!(format_latency(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_latency(Duration::from_micros(42)), "0.000042s");
    }

    #[test]
    fn test_serializes_camel_case_and_skips_unset() {
        let req = HttpRequest::new("POST", "/v1/orders")
            .with_status(201)
            .with_remote_ip("10.0.0.1")
            .with_latency(Duration::from_millis(250));

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "requestMethod": "POST",
                "requestUrl": "/v1/orders",
                "status": 201,
                "remoteIp": "10.0.0.1",
                "latency": "0.25s",
            })
        );
    }
}
