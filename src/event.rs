//! The log event record.

use std::fmt;

use crate::level::LogLevel;
use crate::time::Timestamp;

/// A single logging occurrence, carrying everything a layout can render.
///
/// The timestamp is captured when the event is constructed (or rewritten via
/// [`LoggingEvent::rewrite`]) and is never touched again downstream: an event
/// that sits in a sink queue or triggers a rollover keeps its original time.
#[derive(Clone, Debug)]
pub struct LoggingEvent {
    logger_name: String,
    level: LogLevel,
    message: String,
    timestamp: Timestamp,
    file: String,
    line: Option<u32>,
    function: String,
}

impl LoggingEvent {
    /// Creates an event with no source location, capturing the current time.
    pub fn new(logger_name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> LoggingEvent {
        LoggingEvent {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            timestamp: Timestamp::now(),
            file: String::new(),
            line: None,
            function: String::new(),
        }
    }

    /// Creates an event with call-site metadata, capturing the current time.
    pub fn with_location(
        logger_name: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
        file: &str,
        line: Option<u32>,
        function: &str,
    ) -> LoggingEvent {
        LoggingEvent {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            timestamp: Timestamp::now(),
            file: file.to_owned(),
            line,
            function: function.to_owned(),
        }
    }

    /// Overwrites every field in place, capturing a fresh timestamp.
    ///
    /// The dispatch path keeps one event per thread and rewrites it on each
    /// call instead of allocating; the existing string capacity is reused.
    pub fn rewrite(
        &mut self,
        logger_name: &str,
        level: LogLevel,
        message: fmt::Arguments<'_>,
        file: &str,
        line: Option<u32>,
        function: &str,
    ) {
        use fmt::Write;

        self.logger_name.clear();
        self.logger_name.push_str(logger_name);
        self.level = level;
        self.message.clear();
        // Writing into a String is infallible.
        let _ = self.message.write_fmt(message);
        self.timestamp = Timestamp::now();
        self.file.clear();
        self.file.push_str(file);
        self.line = line;
        self.function.clear();
        self.function.push_str(function);
    }

    /// The fully qualified dotted name of the emitting logger.
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// The event's severity; never [`LogLevel::NOT_SET`] for dispatched
    /// events.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The rendered message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// When the event was emitted.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Source file of the call site; empty when unknown.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Source line of the call site.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Enclosing function or module of the call site; empty when unknown.
    pub fn function(&self) -> &str {
        &self.function
    }

    #[cfg(test)]
    pub(crate) fn with_timestamp(mut self, timestamp: Timestamp) -> LoggingEvent {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn construction_captures_location() {
        let event = LoggingEvent::with_location(
            "a.b",
            LogLevel::INFO,
            "hello",
            "src/main.rs",
            Some(42),
            "main",
        );
        assert_eq!(event.logger_name(), "a.b");
        assert_eq!(event.level(), LogLevel::INFO);
        assert_eq!(event.message(), "hello");
        assert_eq!(event.file(), "src/main.rs");
        assert_eq!(event.line(), Some(42));
        assert_eq!(event.function(), "main");
    }

    #[test]
    fn rewrite_overwrites_every_field() {
        let mut event = LoggingEvent::with_location(
            "a.b",
            LogLevel::INFO,
            "hello",
            "src/main.rs",
            Some(42),
            "main",
        );
        let before = event.timestamp();
        event.rewrite("c.d", LogLevel::ERROR, format_args!("bye {}", 7), "", None, "");
        assert_eq!(event.logger_name(), "c.d");
        assert_eq!(event.level(), LogLevel::ERROR);
        assert_eq!(event.message(), "bye 7");
        assert_eq!(event.file(), "");
        assert_eq!(event.line(), None);
        assert_eq!(event.function(), "");
        assert!(event.timestamp() >= before);
    }
}
