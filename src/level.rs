//! Severity levels and the name catalog.
//!
//! Levels are plain integers ordered by severity. Higher values are more
//! severe, so gating is a single comparison: a logger is enabled for a level
//! when that level is at least its effective threshold.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The severity attached to every log event and logger threshold.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LogLevel(i32);

impl LogLevel {
    /// Turns logging off entirely when used as a threshold.
    pub const OFF: LogLevel = LogLevel(60_000);
    /// Severe errors that will presumably lead the application to abort.
    pub const FATAL: LogLevel = LogLevel(50_000);
    /// Errors that might still allow the application to continue running.
    pub const ERROR: LogLevel = LogLevel(40_000);
    /// Potentially harmful situations.
    pub const WARN: LogLevel = LogLevel(30_000);
    /// Coarse-grained progress messages.
    pub const INFO: LogLevel = LogLevel(20_000);
    /// Fine-grained diagnostic messages.
    pub const DEBUG: LogLevel = LogLevel(10_000);
    /// The most verbose level.
    pub const TRACE: LogLevel = LogLevel(0);
    /// Alias for [`LogLevel::TRACE`]; accepts every event as a threshold.
    pub const ALL: LogLevel = LogLevel(0);
    /// Absence of a level; loggers with this own level inherit from their
    /// parent, appenders with this threshold pass everything.
    pub const NOT_SET: LogLevel = LogLevel(-1);

    /// Sentinel pinning the hierarchy's disable watermark so that later
    /// `disable` calls have no effect.
    pub(crate) const DISABLE_OVERRIDE: LogLevel = LogLevel(-2);

    /// Returns the raw numeric value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Builds a level from a raw numeric value.
    pub const fn from_value(value: i32) -> LogLevel {
        LogLevel(value)
    }

    /// Whether this is the [`LogLevel::NOT_SET`] placeholder.
    pub const fn is_not_set(self) -> bool {
        self.0 == LogLevel::NOT_SET.0
    }

    /// Returns the canonical name for this level.
    ///
    /// Values outside the catalog render as `UNKNOWN`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::OFF => "OFF",
            LogLevel::FATAL => "FATAL",
            LogLevel::ERROR => "ERROR",
            LogLevel::WARN => "WARN",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::TRACE => "TRACE",
            LogLevel::NOT_SET => "NOTSET",
            _ => "UNKNOWN",
        }
    }

    /// Looks a level up by its canonical name.
    ///
    /// Names are case-sensitive. `ALL` maps to [`LogLevel::TRACE`] and
    /// unrecognized names map to [`LogLevel::NOT_SET`].
    pub fn from_name(name: &str) -> LogLevel {
        CATALOG
            .iter()
            .find(|&&(catalog_name, _)| catalog_name == name)
            .map(|&(_, level)| level)
            .unwrap_or(LogLevel::NOT_SET)
    }
}

const CATALOG: &[(&str, LogLevel)] = &[
    ("OFF", LogLevel::OFF),
    ("FATAL", LogLevel::FATAL),
    ("ERROR", LogLevel::ERROR),
    ("WARN", LogLevel::WARN),
    ("INFO", LogLevel::INFO),
    ("DEBUG", LogLevel::DEBUG),
    ("TRACE", LogLevel::TRACE),
    ("ALL", LogLevel::ALL),
    ("NOTSET", LogLevel::NOT_SET),
];

impl fmt::Display for LogLevel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// The error returned when parsing a [`LogLevel`] from a string fails.
#[derive(Debug, Error, PartialEq)]
#[error("unrecognized log level `{0}`")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<LogLevel, ParseLogLevelError> {
        match LogLevel::from_name(s) {
            LogLevel::NOT_SET if s != "NOTSET" => Err(ParseLogLevelError(s.to_owned())),
            level => Ok(level),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        for level in [
            LogLevel::OFF,
            LogLevel::FATAL,
            LogLevel::ERROR,
            LogLevel::WARN,
            LogLevel::INFO,
            LogLevel::DEBUG,
            LogLevel::TRACE,
            LogLevel::NOT_SET,
        ] {
            assert_eq!(LogLevel::from_name(level.as_str()), level);
        }
    }

    #[test]
    fn aliases_and_unknowns() {
        assert_eq!(LogLevel::from_name("ALL"), LogLevel::TRACE);
        assert_eq!(LogLevel::from_name("warn"), LogLevel::NOT_SET);
        assert_eq!(LogLevel::from_name("bogus"), LogLevel::NOT_SET);
        assert_eq!(LogLevel::from_value(12_345).as_str(), "UNKNOWN");
    }

    #[test]
    fn ordering() {
        assert!(LogLevel::FATAL > LogLevel::ERROR);
        assert!(LogLevel::ERROR > LogLevel::WARN);
        assert!(LogLevel::WARN > LogLevel::INFO);
        assert!(LogLevel::INFO > LogLevel::DEBUG);
        assert!(LogLevel::DEBUG > LogLevel::TRACE);
        assert!(LogLevel::TRACE > LogLevel::NOT_SET);
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::ERROR));
        assert_eq!("NOTSET".parse::<LogLevel>(), Ok(LogLevel::NOT_SET));
        assert!("Error".parse::<LogLevel>().is_err());
    }
}
