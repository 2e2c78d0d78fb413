//! Bridge from the `log` facade crate.
//!
//! Crates that log through `log::info!` and friends can be routed into the
//! default hierarchy: the record's target (`my_crate::module`) is mapped to
//! the dotted logger name `my_crate.module` and the facade level onto the
//! level catalog.

use log::{Level, Log, Metadata, Record};

use crate::context;
use crate::level::LogLevel;

/// Installs the bridge as the `log` facade's global logger.
///
/// Fails if another facade logger was installed first.
pub fn install() -> Result<(), log::SetLoggerError> {
    log::set_logger(&FacadeBridge)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Maps a facade level onto the catalog.
pub fn map_level(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::ERROR,
        Level::Warn => LogLevel::WARN,
        Level::Info => LogLevel::INFO,
        Level::Debug => LogLevel::DEBUG,
        Level::Trace => LogLevel::TRACE,
    }
}

fn logger_name(target: &str) -> String {
    target.replace("::", ".")
}

struct FacadeBridge;

impl Log for FacadeBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        context::context()
            .hierarchy()
            .get(&logger_name(metadata.target()))
            .is_enabled_for(map_level(metadata.level()))
    }

    fn log(&self, record: &Record) {
        let logger = context::context()
            .hierarchy()
            .get(&logger_name(record.target()));
        let level = map_level(record.level());
        if !logger.is_enabled_for(level) {
            return;
        }

        logger.forced_log_at(
            level,
            *record.args(),
            record.file().unwrap_or(""),
            record.line(),
            record.module_path().unwrap_or(""),
        );
    }

    fn flush(&self) {}
}
