//! # gcplog
//!
//! Structured logging facade that writes every call to a local stream and
//! ships it to Google Cloud Logging.
//!
//! ## Features
//!
//! - **Dual sink**: one human-readable line locally, one structured entry remotely
//! - **Graceful degradation**: missing credentials mean local-only logging, never an error
//! - **Derived loggers**: `with` / `with_request` overlay labels and request context
//!   without touching the parent
//! - **Background shipping**: batched, bounded queue with explicit `flush`
//!
//! ```no_run
//! use gcplog::prelude::*;
//! use gcplog::{info, printf};
//!
//! let logger = CloudLogger::new([("app", "shop"), ("module", "cart")]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v.to_string()))
//!     .collect());
//!
//! printf!(logger, "foo: {}", "bar");
//! info!(logger, "item added", "sku" => "A-1", "qty" => 2);
//! logger.flush().ok();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        CloudLogger, CloudLoggerBuilder, Fields, HttpRequest, Labels, LocalWriter, LogEntry,
        LoggerError, Payload, Result, Severity, StdLogger, TimestampFormat,
    };
    pub use crate::sinks::{CloudLoggingSink, CloudSinkConfig, RecordingSink, RemoteSink};
}

pub use crate::core::{
    credentials_path, field_value, format_payload, read_project_id, render_payload,
    resolve_project_id, CloudLogger, CloudLoggerBuilder, Fields, HttpRequest, JsonPayload, Labels,
    LocalWriter, LogEntry, LoggerError, Payload, Result, Severity, SinkMetrics, StdLogger,
    TimestampFormat, ENV_CONFIG,
};
pub use crate::sinks::{
    CloudLoggingSink, CloudSinkConfig, HttpTransport, RecordingSink, RemoteSink, TokenSource,
    Transport,
};
