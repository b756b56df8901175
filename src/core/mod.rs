//! Core facade types

pub mod credentials;
pub mod error;
pub mod fields;
pub mod http_request;
pub mod local;
pub mod log_entry;
pub mod logger;
pub mod metrics;
pub mod severity;
pub mod std_logger;
pub mod timestamp;

pub use credentials::{credentials_path, read_project_id, resolve_project_id, ENV_CONFIG};
pub use error::{LoggerError, Result};
pub use fields::{field_value, format_payload, render_payload, Fields, JsonPayload};
pub use http_request::HttpRequest;
pub use local::LocalWriter;
pub use log_entry::{Labels, LogEntry, Payload};
pub use logger::{CloudLogger, CloudLoggerBuilder};
pub use metrics::SinkMetrics;
pub use severity::Severity;
pub use std_logger::StdLogger;
pub use timestamp::TimestampFormat;
