//! Logging macros
//!
//! Structured macros take a message followed by `key => value` pairs; any
//! `Serialize` value is accepted. Print-family macros take `format!`-style
//! arguments.
//!
//! # Examples
//!
//! ```
//! use gcplog::prelude::*;
//! use gcplog::{info, printf};
//!
//! let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
//!
//! info!(logger, "Server started");
//! info!(logger, "Request served", "status" => 200, "path" => "/health");
//!
//! let port = 8080;
//! printf!(logger, "listening on port {}", port);
//! ```

/// Build [`Fields`](crate::Fields) from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use gcplog::fields;
///
/// let fields = fields! {
///     "number" => 1,
///     "string" => "bar",
///     "slice" => [1, 2, 3],
/// };
/// assert_eq!(fields.len(), 3);
/// assert!(fields!().is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()
            $(.with($key, $crate::field_value(&$value)))+
    };
}

/// Structured log call at an explicit severity.
///
/// # Examples
///
/// ```
/// # use gcplog::prelude::*;
/// # let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
/// use gcplog::log;
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Upstream failed", "code" => 502);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log($severity, $msg, $crate::fields!($($key => $value),*))
    };
}

/// Structured debug-level call.
///
/// # Examples
///
/// ```
/// # use gcplog::prelude::*;
/// # let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
/// use gcplog::debug;
/// debug!(logger, "cache state", "hits" => 10, "misses" => 2);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Debug, $msg $(, $key => $value)*)
    };
}

/// Structured info-level call.
#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Info, $msg $(, $key => $value)*)
    };
}

/// Structured warning-level call.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Warning, $msg $(, $key => $value)*)
    };
}

/// Structured error-level call.
///
/// # Examples
///
/// ```
/// # use gcplog::prelude::*;
/// # let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
/// use gcplog::error;
/// error!(logger, "write failed", "err" => "disk full", "retry" => false);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Error, $msg $(, $key => $value)*)
    };
}

/// Structured critical call; flushes and exits the process with status 1.
#[macro_export]
macro_rules! crit {
    ($logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.crit($msg, $crate::fields!($($key => $value),*))
    };
}

/// `format!`-style print at info severity.
#[macro_export]
macro_rules! printf {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::StdLogger as _;
        $logger.printf(format_args!($($arg)+))
    }};
}

/// `format!`-style fatal: log at critical, flush, exit with status 1.
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::StdLogger as _;
        $logger.fatalf(format_args!($($arg)+))
    }};
}

/// `format!`-style panic: log at critical, flush, unwind with the message.
///
/// # Examples
///
/// ```
/// # use gcplog::prelude::*;
/// # let logger = CloudLogger::builder().writer(std::io::sink()).local_only().build();
/// use gcplog::panicf;
/// use std::panic::{catch_unwind, AssertUnwindSafe};
///
/// let result = catch_unwind(AssertUnwindSafe(|| {
///     panicf!(logger, "invariant broken: {} > {}", 3, 2);
/// }));
/// assert!(result.is_err());
/// ```
#[macro_export]
macro_rules! panicf {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::StdLogger as _;
        $logger.panicf(format_args!($($arg)+))
    }};
}
