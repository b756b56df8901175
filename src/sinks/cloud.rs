//! Google Cloud Logging sink
//!
//! Entries are queued on a bounded channel and shipped by a dedicated worker
//! thread in batches. Every request names the log, attributes entries to the
//! `project` resource and carries the common labels.

use super::auth::{TokenSource, METADATA_TOKEN_URL};
use super::remote::RemoteSink;
use super::transport::{HttpTransport, MonitoredResource, Transport, WireEntry, WriteRequest};
use crate::core::{Labels, LogEntry, LoggerError, Result, Severity, SinkMetrics};
use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_LOG_ID: &str = "gcplog";
pub const DEFAULT_ENDPOINT: &str = "https://logging.googleapis.com";
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const BATCH_SIZE: usize = 50;
const BATCH_LINGER: Duration = Duration::from_millis(10);

/// Settings for [`CloudLoggingSink`]
///
/// # Example
///
/// ```
/// use gcplog::CloudSinkConfig;
/// use std::time::Duration;
///
/// let config = CloudSinkConfig::default()
///     .with_log_id("checkout")
///     .with_flush_timeout(Duration::from_secs(2));
/// assert_eq!(config.log_id, "checkout");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSinkConfig {
    /// Log name within the project
    pub log_id: String,
    /// API root, without the `/v2/...` path
    pub endpoint: String,
    /// Static bearer token; takes precedence over every other provider
    pub access_token: Option<String>,
    /// Credentials file whose service-account key mints tokens
    pub credentials_file: Option<PathBuf>,
    /// Metadata server token URL, used when no key is available
    pub metadata_url: String,
    /// Queue capacity in entries
    pub buffer_size: usize,
    pub flush_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CloudSinkConfig {
    fn default() -> Self {
        Self {
            log_id: DEFAULT_LOG_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            credentials_file: None,
            metadata_url: METADATA_TOKEN_URL.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CloudSinkConfig {
    #[must_use]
    pub fn with_log_id(mut self, log_id: impl Into<String>) -> Self {
        self.log_id = log_id.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn validate(&self, project_id: &str) -> Result<()> {
        if project_id.trim().is_empty() {
            return Err(LoggerError::config("CloudLoggingSink", "project id is empty"));
        }
        if self.log_id.trim().is_empty() {
            return Err(LoggerError::config("CloudLoggingSink", "log id is empty"));
        }
        if self.buffer_size == 0 {
            return Err(LoggerError::config(
                "CloudLoggingSink",
                "buffer size must be at least 1",
            ));
        }
        Ok(())
    }
}

enum Command {
    Entry(LogEntry),
    Flush(Sender<Result<()>>),
}

/// Remote sink backed by the Cloud Logging API
pub struct CloudLoggingSink {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    metrics: Arc<SinkMetrics>,
    log_name: String,
    flush_timeout: Duration,
}

impl CloudLoggingSink {
    /// Create a sink shipping over HTTPS
    ///
    /// # Errors
    ///
    /// Returns an error for invalid settings, when no token provider is
    /// usable (unusable key file, or no key and no metadata server), or if
    /// the HTTP client or the worker thread cannot be created.
    pub fn new(project_id: &str, common_labels: Labels, config: CloudSinkConfig) -> Result<Self> {
        let tokens = TokenSource::select(
            config.access_token.as_deref(),
            config.credentials_file.as_deref(),
            &config.metadata_url,
        )?;
        let endpoint = config.endpoint.clone();
        let request_timeout = config.request_timeout;

        Self::with_transport(project_id, common_labels, config, move || {
            let transport = HttpTransport::new(&endpoint, tokens, request_timeout)?;
            transport.verify_tokens()?;
            Ok(Box::new(transport) as Box<dyn Transport>)
        })
    }

    /// Create a sink with a custom transport
    ///
    /// `make_transport` runs on the worker thread; its error is returned from
    /// here.
    pub fn with_transport<F>(
        project_id: &str,
        common_labels: Labels,
        config: CloudSinkConfig,
        make_transport: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn Transport>> + Send + 'static,
    {
        config.validate(project_id)?;

        let log_name = format!("projects/{}/logs/{}", project_id, config.log_id);
        let resource = MonitoredResource::project(project_id);
        let (sender, receiver) = bounded(config.buffer_size);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let metrics = Arc::new(SinkMetrics::new());
        let worker_metrics = Arc::clone(&metrics);
        let worker_log_name = log_name.clone();

        let worker = thread::Builder::new()
            .name("gcplog-shipper".to_string())
            .spawn(move || {
                let transport = match make_transport() {
                    Ok(transport) => {
                        let _ = ready_tx.send(Ok(()));
                        transport
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let mut shipper = Shipper {
                    transport,
                    log_name: worker_log_name,
                    resource,
                    common_labels,
                    metrics: worker_metrics,
                    last_error: None,
                };
                shipper.run(&receiver);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(LoggerError::SinkStopped);
            }
        }

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            metrics,
            log_name,
            flush_timeout: config.flush_timeout,
        })
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Full log name, `projects/{project}/logs/{log_id}`
    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    fn alert_and_drop(&self, reason: &str) {
        let dropped = self.metrics.record_dropped();

        // First drop, then every thousandth
        if dropped == 0 || (dropped + 1) % 1000 == 0 {
            eprintln!(
                "[LOGGER WARNING] Cloud logging {}, {} entries dropped ({:.1}% of entries)",
                reason,
                dropped + 1,
                self.metrics.drop_rate()
            );
        }
    }
}

impl RemoteSink for CloudLoggingSink {
    fn submit(&self, entry: LogEntry) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        let critical = entry.severity == Severity::Critical;

        match sender.try_send(Command::Entry(entry)) {
            Ok(()) => {
                self.metrics.record_submitted();
            }
            Err(TrySendError::Full(command)) => {
                // Critical entries precede process exit and are never dropped
                if critical {
                    self.metrics.record_blocked();
                    if sender.send(command).is_ok() {
                        self.metrics.record_submitted();
                    } else {
                        self.alert_and_drop("shipper stopped");
                    }
                } else {
                    self.alert_and_drop("queue full");
                }
            }
            Err(TrySendError::Disconnected(_)) => self.alert_and_drop("shipper stopped"),
        }
    }

    fn flush(&self) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(LoggerError::SinkStopped)?;
        let (ack_tx, ack_rx) = bounded(1);

        sender
            .send_timeout(Command::Flush(ack_tx), self.flush_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => LoggerError::flush_timeout(self.flush_timeout),
                SendTimeoutError::Disconnected(_) => LoggerError::SinkStopped,
            })?;

        match ack_rx.recv_timeout(self.flush_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LoggerError::flush_timeout(self.flush_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(LoggerError::SinkStopped),
        }
    }

    fn name(&self) -> &str {
        "cloud-logging"
    }
}

impl fmt::Debug for CloudLoggingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudLoggingSink")
            .field("log_name", &self.log_name)
            .field("flush_timeout", &self.flush_timeout)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Drop for CloudLoggingSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker ship what is queued and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker-side state
struct Shipper {
    transport: Box<dyn Transport>,
    log_name: String,
    resource: MonitoredResource,
    common_labels: Labels,
    metrics: Arc<SinkMetrics>,
    /// First failure since the last flush
    last_error: Option<String>,
}

impl Shipper {
    fn run(&mut self, receiver: &Receiver<Command>) {
        let mut batch = Vec::with_capacity(BATCH_SIZE);

        while let Ok(command) = receiver.recv() {
            let mut next = Some(command);

            while let Some(command) = next.take() {
                match command {
                    Command::Entry(entry) => {
                        batch.push(entry);
                        if batch.len() >= BATCH_SIZE {
                            self.ship(&mut batch);
                        }
                    }
                    Command::Flush(ack) => {
                        self.ship(&mut batch);
                        let _ = ack.send(self.take_error());
                    }
                }

                next = receiver.try_recv().ok();
                if next.is_none() && !batch.is_empty() {
                    // Small batch - linger briefly for more entries
                    thread::sleep(BATCH_LINGER);
                    next = receiver.try_recv().ok();
                }
            }

            self.ship(&mut batch);
        }

        // Channel closed
        self.ship(&mut batch);
    }

    fn ship(&mut self, batch: &mut Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len() as u64;

        let request = WriteRequest {
            log_name: &self.log_name,
            resource: &self.resource,
            labels: &self.common_labels,
            entries: batch.iter().map(WireEntry::from).collect(),
        };
        let result = self.transport.write_entries(&request);
        drop(request);
        batch.clear();

        match result {
            Ok(()) => {
                self.metrics.record_delivered(count);
            }
            Err(e) => {
                eprintln!(
                    "[LOGGER ERROR] Failed to ship {} entries to {}: {}",
                    count, self.log_name, e
                );
                self.metrics.record_failed(count);
                if self.last_error.is_none() {
                    self.last_error = Some(e.to_string());
                }
            }
        }
    }

    fn take_error(&mut self) -> Result<()> {
        match self.last_error.take() {
            Some(message) => Err(LoggerError::transport(message)),
            None => Ok(()),
        }
    }
}
