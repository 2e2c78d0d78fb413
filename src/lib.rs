//! log4cplus is a hierarchical, property-file configurable logging
//! framework in the log4j tradition.
//!
//! Application code emits events through named [`Logger`]s; the framework
//! decides whether each event survives level gating, which sinks
//! ([`append`]ers) receive it, and how it is rendered ([`layout`]s). The
//! whole arrangement can be wired from an external property file without
//! recompilation.
//!
//! # Architecture
//!
//! * Loggers form a dot-separated name hierarchy rooted at the empty name.
//!   A logger without an explicit level inherits the nearest ancestor's,
//!   and events propagate to every appender attached along the walk to the
//!   root.
//! * An [`append::Appender`] pairs a sink (console, file, rolling file,
//!   callback) with a threshold, an ordered [`filter`] chain, a layout and
//!   an error handler, all applied under the appender's own mutex.
//! * [`layout::PatternLayout`] compiles a `%`-style format specification
//!   once at configuration time.
//! * [`config::PropertyConfigurator`] reads `log4cplus.`-prefixed
//!   properties and instantiates everything through the name-indexed
//!   factory registries, so user components can participate by registering
//!   a factory.
//!
//! # Quick start
//!
//! ```no_run
//! use log4cplus::config::PropertyConfigurator;
//!
//! PropertyConfigurator::do_configure("log.properties");
//!
//! let logger = log4cplus::logger("store.engine");
//! log4cplus::info!(logger, "cache warmed in {} ms", 42);
//! ```
//!
//! Call [`shutdown`] before process exit to flush and close file sinks.

pub mod append;
pub mod compat;
pub mod config;
mod context;
pub mod event;
pub mod filter;
pub mod hierarchy;
pub mod layout;
mod level;
pub mod logger;
mod loglog;
mod macros;
pub mod time;

pub use crate::context::{context, initialize, shutdown, Context};
pub use crate::event::LoggingEvent;
pub use crate::hierarchy::Hierarchy;
pub use crate::level::{LogLevel, ParseLogLevelError};
pub use crate::logger::Logger;
pub use crate::loglog::{loglog, LogLog};
pub use crate::time::Timestamp;

/// Returns the named logger from the default hierarchy, creating it if
/// absent.
pub fn logger(name: &str) -> Logger {
    context::context().hierarchy().get(name)
}

/// Returns the default hierarchy's root logger.
pub fn root_logger() -> Logger {
    context::context().hierarchy().root()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_hierarchy_is_shared() {
        let a = logger("lib.test");
        let b = logger("lib.test");
        assert_eq!(a.name(), b.name());
        a.set_level(LogLevel::ERROR);
        assert_eq!(b.level(), LogLevel::ERROR);
        b.set_level(LogLevel::NOT_SET);
    }

    #[test]
    fn root_logger_has_a_concrete_level() {
        assert!(!root_logger().effective_level().is_not_set());
    }
}
