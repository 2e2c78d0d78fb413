//! Logging macros.
//!
//! Each macro checks the logger's effective level before evaluating its
//! format arguments, so disabled call sites cost one comparison, and
//! captures the call site's file, line and module path for the layouts.

/// Logs at an explicit level: `log_event!(logger, LogLevel::WARN, "...")`.
#[macro_export]
macro_rules! log_event {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled_for(level) {
            logger.forced_log_at(
                level,
                ::core::format_args!($($arg)+),
                ::core::file!(),
                ::core::option::Option::Some(::core::line!()),
                ::core::module_path!(),
            );
        }
    }};
}

/// Logs at [`TRACE`](crate::LogLevel::TRACE) level.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::TRACE, $($arg)+)
    };
}

/// Logs at [`DEBUG`](crate::LogLevel::DEBUG) level.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::DEBUG, $($arg)+)
    };
}

/// Logs at [`INFO`](crate::LogLevel::INFO) level.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::INFO, $($arg)+)
    };
}

/// Logs at [`WARN`](crate::LogLevel::WARN) level.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::WARN, $($arg)+)
    };
}

/// Logs at [`ERROR`](crate::LogLevel::ERROR) level.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::ERROR, $($arg)+)
    };
}

/// Logs at [`FATAL`](crate::LogLevel::FATAL) level.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::LogLevel::FATAL, $($arg)+)
    };
}
