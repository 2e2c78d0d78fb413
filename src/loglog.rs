//! The framework's internal diagnostic logger.
//!
//! Configuration problems, sink failures and invariant violations are
//! reported here rather than through the user-facing hierarchy, so that a
//! broken configuration can still tell the operator what went wrong.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::context;

const PREFIX: &str = "log4cplus: ";
const WARN_PREFIX: &str = "log4cplus:WARN ";
const ERROR_PREFIX: &str = "log4cplus:ERROR ";

/// Diagnostic output channel for the framework itself.
///
/// Debug messages are suppressed unless internal debugging is enabled; quiet
/// mode silences everything. Both switches default off and are seeded from
/// the `LOG4CPLUS_LOGLOG_DEBUGENABLED` and `LOG4CPLUS_LOGLOG_QUIETMODE`
/// environment variables on first use.
pub struct LogLog {
    debug_enabled: AtomicBool,
    quiet_mode: AtomicBool,
}

/// Returns the process-wide diagnostic logger.
pub fn loglog() -> &'static LogLog {
    static LOGLOG: OnceLock<LogLog> = OnceLock::new();
    LOGLOG.get_or_init(|| LogLog {
        debug_enabled: AtomicBool::new(env_flag("LOG4CPLUS_LOGLOG_DEBUGENABLED")),
        quiet_mode: AtomicBool::new(env_flag("LOG4CPLUS_LOGLOG_QUIETMODE")),
    })
}

fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or(false),
        Err(_) => false,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        value.trim().parse::<i64>().ok().map(|n| n != 0)
    }
}

impl LogLog {
    /// Enables or disables internal debug messages.
    pub fn set_internal_debugging(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Silences (or restores) all diagnostic output.
    pub fn set_quiet_mode(&self, quiet: bool) {
        self.quiet_mode.store(quiet, Ordering::Relaxed);
    }

    /// Emits an internal debug message to stdout.
    pub fn debug(&self, msg: impl AsRef<str>) {
        if !self.debug_enabled.load(Ordering::Relaxed) || self.quiet_mode.load(Ordering::Relaxed) {
            return;
        }
        let _guard = context::console_lock().lock();
        let stdout = std::io::stdout();
        let _ = writeln!(stdout.lock(), "{}{}", PREFIX, msg.as_ref());
    }

    /// Emits a warning to stderr.
    pub fn warn(&self, msg: impl AsRef<str>) {
        self.emit(WARN_PREFIX, msg.as_ref());
    }

    /// Emits an error to stderr.
    pub fn error(&self, msg: impl AsRef<str>) {
        self.emit(ERROR_PREFIX, msg.as_ref());
    }

    fn emit(&self, prefix: &str, msg: &str) {
        if self.quiet_mode.load(Ordering::Relaxed) {
            return;
        }
        let _guard = context::console_lock().lock();
        let stderr = std::io::stderr();
        let _ = writeln!(stderr.lock(), "{}{}", prefix, msg);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("17"), Some(true));
        assert_eq!(parse_flag("yes"), None);
    }
}
