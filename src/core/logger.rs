//! Logging facade

use super::{
    credentials::{credentials_path, read_project_id, ENV_CONFIG},
    error::Result,
    fields::{format_payload, render_payload, Fields},
    http_request::HttpRequest,
    local::{prefix_from_labels, LocalWriter},
    log_entry::{Labels, LogEntry, Payload},
    severity::Severity,
    std_logger::StdLogger,
    timestamp::TimestampFormat,
};
use crate::sinks::{CloudLoggingSink, CloudSinkConfig, RemoteSink};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Logger writing every call to a local stream and, when available, to a
/// remote sink
///
/// Values are cheap to clone and safe to share across threads. Derived
/// facades created by [`with`](CloudLogger::with) and
/// [`with_request`](CloudLogger::with_request) share the local stream and the
/// remote sink of their parent but never its label map.
///
/// # Example
///
/// ```
/// use gcplog::prelude::*;
///
/// let logger = CloudLogger::builder()
///     .common_labels([("app", "shop"), ("module", "cart")])
///     .local_only()
///     .build();
///
/// let request_logger = logger.with([("request_id", "r-42")]);
/// request_logger.info("item added", Fields::new().with("sku", "A-1").with("qty", 2));
/// logger.printf(format_args!("cart size: {}", 3));
/// ```
#[derive(Clone)]
pub struct CloudLogger {
    local: LocalWriter,
    remote: Option<Arc<dyn RemoteSink>>,
    common_labels: Arc<Labels>,
    labels: Labels,
    request: Option<Arc<HttpRequest>>,
}

impl CloudLogger {
    /// Build a facade from common labels, resolving credentials from
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    ///
    /// Never fails: without usable credentials the facade logs locally only.
    pub fn new(common_labels: Labels) -> Self {
        Self::builder().common_labels(common_labels).build()
    }

    pub fn builder() -> CloudLoggerBuilder {
        CloudLoggerBuilder::new()
    }

    /// Derive a facade whose labels are this facade's labels overlaid with
    /// `labels`
    #[must_use]
    pub fn with<I, K, V>(&self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = self.labels.clone();
        merged.extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self {
            labels: merged,
            ..self.clone()
        }
    }

    /// Derive a facade carrying `request` on every entry
    #[must_use]
    pub fn with_request(&self, request: HttpRequest) -> Self {
        Self {
            request: Some(Arc::new(request)),
            ..self.clone()
        }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn common_labels(&self) -> &Labels {
        &self.common_labels
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_deref()
    }

    pub fn local_writer(&self) -> &LocalWriter {
        &self.local
    }

    pub fn remote_sink(&self) -> Option<&Arc<dyn RemoteSink>> {
        self.remote.as_ref()
    }

    pub fn has_remote_sink(&self) -> bool {
        self.remote.is_some()
    }

    /// Structured log call
    ///
    /// The local stream receives the payload as single-line JSON; the remote
    /// sink receives the payload object. `Critical` flushes and exits the
    /// process with status 1.
    pub fn log(&self, severity: Severity, msg: &str, fields: impl Into<Fields>) {
        self.dispatch_fields(severity, msg, &fields.into());
        if severity.is_terminal() {
            self.exit_after_flush();
        }
    }

    pub fn debug(&self, msg: &str, fields: impl Into<Fields>) {
        self.log(Severity::Debug, msg, fields);
    }

    pub fn info(&self, msg: &str, fields: impl Into<Fields>) {
        self.log(Severity::Info, msg, fields);
    }

    pub fn warn(&self, msg: &str, fields: impl Into<Fields>) {
        self.log(Severity::Warning, msg, fields);
    }

    pub fn error(&self, msg: &str, fields: impl Into<Fields>) {
        self.log(Severity::Error, msg, fields);
    }

    /// Log at `Critical`, flush, and exit with status 1
    pub fn crit(&self, msg: &str, fields: impl Into<Fields>) -> ! {
        self.dispatch_fields(Severity::Critical, msg, &fields.into());
        self.exit_after_flush()
    }

    /// Wait until queued remote entries are handed to the transport
    ///
    /// Succeeds immediately when there is no remote sink.
    pub fn flush(&self) -> Result<()> {
        let local = self.local.flush();
        if let Some(remote) = &self.remote {
            remote.flush()?;
        }
        local
    }

    fn dispatch_text(&self, severity: Severity, message: String) {
        self.local.write_line(&message);
        if let Some(remote) = &self.remote {
            remote.submit(self.entry(severity, Payload::Text(message)));
        }
    }

    fn dispatch_fields(&self, severity: Severity, msg: &str, fields: &Fields) {
        let payload = format_payload(msg, fields);
        match render_payload(&payload) {
            Ok(line) => self.local.write_line(&line),
            Err(e) => self.dispatch_text(
                Severity::Error,
                format!("failed to marshal payload: {}", e),
            ),
        }
        if let Some(remote) = &self.remote {
            remote.submit(self.entry(severity, Payload::Json(payload)));
        }
    }

    fn entry(&self, severity: Severity, payload: Payload) -> LogEntry {
        LogEntry::new(severity, payload)
            .with_labels(self.labels.clone())
            .with_request(self.request.as_deref().cloned())
    }

    fn exit_after_flush(&self) -> ! {
        let _ = self.flush();
        std::process::exit(1)
    }
}

impl StdLogger for CloudLogger {
    fn output(&self, severity: Severity, message: &str) {
        self.dispatch_text(severity, message.to_string());
    }

    fn flush_before_exit(&self) {
        let _ = self.flush();
    }
}

impl fmt::Debug for CloudLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudLogger")
            .field("local", &self.local)
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .field("common_labels", &self.common_labels)
            .field("labels", &self.labels)
            .field("request", &self.request)
            .finish()
    }
}

enum RemoteChoice {
    FromCredentials,
    Disabled,
    Sink(Arc<dyn RemoteSink>),
}

/// Builder for [`CloudLogger`]
///
/// # Example
///
/// ```
/// use gcplog::prelude::*;
/// use std::sync::Arc;
///
/// let sink = Arc::new(RecordingSink::new());
/// let logger = CloudLogger::builder()
///     .common_labels([("module", "billing")])
///     .writer(std::io::sink())
///     .timestamp_format(TimestampFormat::Iso8601)
///     .remote_sink(sink.clone())
///     .build();
///
/// logger.warn("retrying", Fields::new().with("attempt", 2));
/// assert_eq!(sink.entries()[0].severity, Severity::Warning);
/// ```
pub struct CloudLoggerBuilder {
    common_labels: Option<Labels>,
    writer: Option<LocalWriter>,
    timestamp_format: Option<TimestampFormat>,
    remote: RemoteChoice,
    credentials_env: String,
    sink_config: CloudSinkConfig,
}

impl CloudLoggerBuilder {
    pub fn new() -> Self {
        Self {
            common_labels: None,
            writer: None,
            timestamp_format: None,
            remote: RemoteChoice::FromCredentials,
            credentials_env: ENV_CONFIG.to_string(),
            sink_config: CloudSinkConfig::default(),
        }
    }

    /// Labels attached to every remote entry; `app` and `module` also form
    /// the local line prefix
    #[must_use = "builder methods return a new value"]
    pub fn common_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.common_labels = Some(
            labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Local stream target; stderr when not set
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(LocalWriter::new(writer));
        self
    }

    /// Use an existing local writer, sharing its stream
    #[must_use = "builder methods return a new value"]
    pub fn local_writer(mut self, writer: LocalWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = Some(format);
        self
    }

    /// Use `sink` instead of resolving credentials
    #[must_use = "builder methods return a new value"]
    pub fn remote_sink(mut self, sink: Arc<dyn RemoteSink>) -> Self {
        self.remote = RemoteChoice::Sink(sink);
        self
    }

    /// Skip the remote sink entirely
    #[must_use = "builder methods return a new value"]
    pub fn local_only(mut self) -> Self {
        self.remote = RemoteChoice::Disabled;
        self
    }

    /// Environment variable holding the credentials file path
    #[must_use = "builder methods return a new value"]
    pub fn credentials_env(mut self, var: impl Into<String>) -> Self {
        self.credentials_env = var.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink_config(mut self, config: CloudSinkConfig) -> Self {
        self.sink_config = config;
        self
    }

    /// Build the facade
    ///
    /// Credential or client failures are reported as one warning line on the
    /// local stream and leave the facade without a remote sink. Tokens come
    /// from the service-account key in the credentials file when it has one,
    /// otherwise from the metadata server, which must answer at build time.
    pub fn build(self) -> CloudLogger {
        let mut local = self.writer.unwrap_or_else(LocalWriter::stderr);
        if let Some(labels) = &self.common_labels {
            local = local.with_prefix(prefix_from_labels(labels));
        }
        if let Some(format) = self.timestamp_format {
            local = local.with_timestamp_format(format);
        }

        let common_labels = self.common_labels.unwrap_or_default();
        let remote = match self.remote {
            RemoteChoice::Sink(sink) => Some(sink),
            RemoteChoice::Disabled => None,
            RemoteChoice::FromCredentials => connect_cloud_sink(
                &local,
                &self.credentials_env,
                &common_labels,
                self.sink_config,
            ),
        };

        CloudLogger {
            local,
            remote,
            common_labels: Arc::new(common_labels),
            labels: Labels::new(),
            request: None,
        }
    }
}

impl Default for CloudLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn connect_cloud_sink(
    local: &LocalWriter,
    env_var: &str,
    common_labels: &Labels,
    config: CloudSinkConfig,
) -> Option<Arc<dyn RemoteSink>> {
    let (path, project_id) =
        match credentials_path(env_var).and_then(|path| Ok((read_project_id(&path)?, path))) {
            Ok((project_id, path)) => (path, project_id),
            Err(e) => {
                local.write_line(&format!("Failed to get cloud credentials: {}", e));
                return None;
            }
        };
    let config = match config.credentials_file {
        Some(_) => config,
        None => config.with_credentials_file(path),
    };

    match CloudLoggingSink::new(&project_id, common_labels.clone(), config) {
        Ok(sink) => Some(Arc::new(sink)),
        Err(e) => {
            local.write_line(&format!("Failed to create cloud logging client: {}", e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::RecordingSink;
    use serde_json::json;

    fn recording_logger() -> (CloudLogger, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let logger = CloudLogger::builder()
            .writer(std::io::sink())
            .common_labels([("module", "test")])
            .remote_sink(sink.clone())
            .build();
        (logger, sink)
    }

    #[test]
    fn test_builder_local_only() {
        let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
        assert!(!logger.has_remote_sink());
        assert!(logger.labels().is_empty());
        assert!(logger.common_labels().is_empty());
        assert_eq!(logger.local_writer().prefix(), "");
    }

    #[test]
    fn test_builder_prefix_from_common_labels() {
        let logger = CloudLogger::builder()
            .writer(std::io::sink())
            .common_labels([("app", " shop "), ("module", "cart")])
            .local_only()
            .build();
        assert_eq!(logger.local_writer().prefix(), "shop  cart ");
    }

    #[test]
    fn test_builder_blank_app_and_module_prefix() {
        let logger = CloudLogger::builder()
            .writer(std::io::sink())
            .common_labels([("env", "prod")])
            .local_only()
            .build();
        assert_eq!(logger.local_writer().prefix(), " ");
    }

    #[test]
    fn test_missing_credentials_degrades_to_local() {
        let logger = CloudLogger::builder()
            .writer(std::io::sink())
            .credentials_env("GCPLOG_UNIT_TEST_CREDENTIALS_UNSET")
            .build();
        assert!(!logger.has_remote_sink());
        assert!(logger.flush().is_ok());
    }

    #[test]
    fn test_with_merges_without_mutating() {
        let (base, _) = recording_logger();
        let child = base.with([("a", "1"), ("b", "2")]);
        let grandchild = child.with([("b", "override")]);

        assert!(base.labels().is_empty());
        assert_eq!(child.labels().get("b").map(String::as_str), Some("2"));
        assert_eq!(
            grandchild.labels().get("b").map(String::as_str),
            Some("override")
        );
        assert_eq!(grandchild.labels().get("a").map(String::as_str), Some("1"));
        assert_eq!(grandchild.common_labels(), base.common_labels());
    }

    #[test]
    fn test_with_request_replaces_descriptor() {
        let (base, sink) = recording_logger();
        let first = base.with_request(HttpRequest::new("GET", "/a"));
        let second = first.with_request(HttpRequest::new("POST", "/b"));

        assert!(base.request().is_none());
        second.info("handled", Fields::new());

        let entries = sink.entries();
        let request = entries[0].http_request.as_ref().expect("request attached");
        assert_eq!(request.request_method.as_deref(), Some("POST"));
        assert_eq!(
            first.request().and_then(|r| r.request_url.as_deref()),
            Some("/a")
        );
    }

    #[test]
    fn test_structured_entry_shape() {
        let (logger, sink) = recording_logger();
        logger
            .with([("user", "u1")])
            .error("lookup failed", Fields::new().with("code", 404));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(
            serde_json::Value::Object(entries[0].payload.as_json().unwrap().clone()),
            json!({"message": "lookup failed", "code": 404})
        );
        assert_eq!(entries[0].labels.get("user").map(String::as_str), Some("u1"));
    }

    #[test]
    fn test_print_family_submits_text_at_info() {
        let (logger, sink) = recording_logger();
        logger.printf(format_args!("foo: {}", "bar"));
        logger.print("plain");

        let entries = sink.entries();
        assert_eq!(entries[0].payload.as_text(), Some("foo: bar"));
        assert_eq!(entries[0].severity, Severity::Info);
        assert_eq!(entries[1].payload.as_text(), Some("plain"));
    }

    #[test]
    fn test_flush_delegates_to_sink() {
        let (logger, sink) = recording_logger();
        logger.with([("k", "v")]).flush().unwrap();
        assert_eq!(sink.flush_count(), 1);
    }
}
