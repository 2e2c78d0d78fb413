//! The console appender.

use std::io::{self, Write};

use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::context;
use crate::event::LoggingEvent;
use crate::layout::Layout;

/// An appender that writes to stdout or stderr.
///
/// Output is serialized against the internal diagnostic logger through the
/// process-wide console lock, so framework messages and event lines never
/// interleave mid-line.
#[derive(Debug)]
pub struct ConsoleAppender {
    log_to_stderr: bool,
    immediate_flush: bool,
}

impl ConsoleAppender {
    /// Creates a new `ConsoleAppenderBuilder`.
    pub fn builder() -> ConsoleAppenderBuilder {
        ConsoleAppenderBuilder {
            log_to_stderr: false,
            immediate_flush: false,
        }
    }

    /// Builds a console sink from the `logToStdErr` and `ImmediateFlush`
    /// properties.
    pub fn from_properties(properties: &Properties) -> ConsoleAppender {
        ConsoleAppender {
            log_to_stderr: properties.get_bool("logToStdErr").unwrap_or(false),
            immediate_flush: properties.get_bool("ImmediateFlush").unwrap_or(false),
        }
    }
}

impl Append for ConsoleAppender {
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        _errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        let _guard = context::console_lock().lock();
        if self.log_to_stderr {
            let stderr = io::stderr();
            let mut out = stderr.lock();
            layout.format_and_append(&mut out, event)?;
            if self.immediate_flush {
                out.flush()?;
            }
        } else {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            layout.format_and_append(&mut out, event)?;
            if self.immediate_flush {
                out.flush()?;
            }
        }
        Ok(())
    }
}

/// A builder for `ConsoleAppender`s.
pub struct ConsoleAppenderBuilder {
    log_to_stderr: bool,
    immediate_flush: bool,
}

impl ConsoleAppenderBuilder {
    /// Routes output to stderr instead of stdout.
    ///
    /// Defaults to `false`.
    pub fn log_to_stderr(mut self, log_to_stderr: bool) -> ConsoleAppenderBuilder {
        self.log_to_stderr = log_to_stderr;
        self
    }

    /// Flushes the stream after each event.
    ///
    /// Defaults to `false`.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> ConsoleAppenderBuilder {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Consumes the builder, producing a `ConsoleAppender`.
    pub fn build(self) -> ConsoleAppender {
        ConsoleAppender {
            log_to_stderr: self.log_to_stderr,
            immediate_flush: self.immediate_flush,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_properties() {
        let mut props = Properties::new();
        props.set("logToStdErr", "1");
        props.set("ImmediateFlush", "true");
        let appender = ConsoleAppender::from_properties(&props);
        assert!(appender.log_to_stderr);
        assert!(appender.immediate_flush);

        let appender = ConsoleAppender::from_properties(&Properties::new());
        assert!(!appender.log_to_stderr);
        assert!(!appender.immediate_flush);
    }
}
