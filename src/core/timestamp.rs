//! Timestamp formatting for local log lines
//!
//! The local stream prefixes every line with a timestamp. The default mirrors
//! the classic `2025/01/08 10:30:45` layout in local time; ISO 8601, RFC 3339
//! and custom strftime layouts are available, or timestamps can be disabled.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Timestamp layout for the local stream
///
/// # Examples
///
/// ```
/// use gcplog::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(
///     TimestampFormat::Standard.format(&at).as_deref(),
///     Some("2025/01/08 10:30:45")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025/01/08 10:30:45` in the zone of the supplied time
    #[default]
    Standard,

    /// ISO 8601 with milliseconds in UTC: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with offset: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Custom strftime format
    ///
    /// ```
    /// use gcplog::TimestampFormat;
    ///
    /// let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),

    /// No timestamp
    Disabled,
}

impl TimestampFormat {
    /// Format a point in time, or `None` when timestamps are disabled
    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            TimestampFormat::Standard => Some(datetime.format("%Y/%m/%d %H:%M:%S").to_string()),
            TimestampFormat::Iso8601 => Some(
                datetime
                    .with_timezone(&Utc)
                    .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                    .to_string(),
            ),
            TimestampFormat::Rfc3339 => Some(datetime.to_rfc3339()),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                match write!(out, "{}", datetime.format(format_str)) {
                    Ok(()) => Some(out),
                    // Invalid strftime items
                    Err(_) => Some(datetime.to_rfc3339()),
                }
            }
            TimestampFormat::Disabled => None,
        }
    }
}
