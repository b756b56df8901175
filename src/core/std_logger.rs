//! Print/fatal/panic logging interface

use super::local::LocalWriter;
use super::severity::Severity;
use std::fmt;

/// Minimal logging interface for code that only prints
///
/// Implementors supply [`output`](StdLogger::output); the print, fatal and
/// panic families are provided. `print*` emits at `Info`; `fatal*` and
/// `panic*` emit at `Critical`, call
/// [`flush_before_exit`](StdLogger::flush_before_exit), then either exit the
/// process with status 1 or unwind with the formatted message.
///
/// # Example
///
/// ```
/// use gcplog::{LocalWriter, StdLogger, TimestampFormat};
///
/// fn report(log: &dyn StdLogger, done: usize) {
///     log.printf(format_args!("processed {} items", done));
/// }
///
/// let writer = LocalWriter::new(std::io::sink())
///     .with_timestamp_format(TimestampFormat::Disabled);
/// report(&writer, 3);
/// ```
pub trait StdLogger {
    /// Emit one formatted message
    fn output(&self, severity: Severity, message: &str);

    /// Best-effort flush ahead of exit or unwind
    fn flush_before_exit(&self) {}

    fn print(&self, message: &str) {
        self.output(Severity::Info, message);
    }

    fn printf(&self, args: fmt::Arguments<'_>) {
        self.output(Severity::Info, &fmt::format(args));
    }

    fn println(&self, message: &str) {
        self.output(Severity::Info, &format!("{}\n", message));
    }

    fn fatal(&self, message: &str) -> ! {
        self.output(Severity::Critical, message);
        self.flush_before_exit();
        std::process::exit(1)
    }

    fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.fatal(&fmt::format(args))
    }

    fn fatalln(&self, message: &str) -> ! {
        self.fatal(&format!("{}\n", message))
    }

    fn panic(&self, message: &str) -> ! {
        self.output(Severity::Critical, message);
        self.flush_before_exit();
        panic!("{}", message)
    }

    fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.panic(&fmt::format(args))
    }

    fn panicln(&self, message: &str) -> ! {
        self.panic(&format!("{}\n", message))
    }
}

impl StdLogger for LocalWriter {
    fn output(&self, _severity: Severity, message: &str) {
        self.write_line(message);
    }

    fn flush_before_exit(&self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collecting {
        lines: Mutex<Vec<(Severity, String)>>,
        flushed: Mutex<bool>,
    }

    impl StdLogger for Collecting {
        fn output(&self, severity: Severity, message: &str) {
            self.lines.lock().push((severity, message.to_string()));
        }

        fn flush_before_exit(&self) {
            *self.flushed.lock() = true;
        }
    }

    #[test]
    fn test_print_family_at_info() {
        let log = Collecting::default();
        log.print("a");
        log.printf(format_args!("foo: {}", "bar"));
        log.println("b");

        let lines = log.lines.lock();
        assert_eq!(
            *lines,
            vec![
                (Severity::Info, "a".to_string()),
                (Severity::Info, "foo: bar".to_string()),
                (Severity::Info, "b\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_panicf_unwinds_with_message() {
        let log = Collecting::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            log.panicf(format_args!("bad state: {} of {}", 3, 4))
        }));

        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("bad state: 3 of 4")
        );
        assert!(*log.flushed.lock());
        assert_eq!(log.lines.lock()[0].0, Severity::Critical);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let log = Collecting::default();
        let dynamic: &dyn StdLogger = &log;
        dynamic.print("through dyn");
        assert_eq!(log.lines.lock().len(), 1);
    }
}
