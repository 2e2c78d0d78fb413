//! Property-driven configuration.
//!
//! A property file wires loggers, appenders, layouts and filters together
//! without recompilation:
//!
//! ```properties
//! log4cplus.rootLogger=WARN, CONSOLE
//! log4cplus.logger.store.engine=DEBUG, LOGFILE
//!
//! log4cplus.appender.CONSOLE=log4cplus::ConsoleAppender
//! log4cplus.appender.CONSOLE.layout=log4cplus::PatternLayout
//! log4cplus.appender.CONSOLE.layout.ConversionPattern=%d{%H:%M:%S} [%-5p] %c - %m%n
//!
//! log4cplus.appender.LOGFILE=log4cplus::RollingFileAppender
//! log4cplus.appender.LOGFILE.File=logs/engine.log
//! log4cplus.appender.LOGFILE.MaxFileSize=5MB
//! log4cplus.appender.LOGFILE.MaxBackupIndex=3
//! ```
//!
//! Configuration is best-effort: unknown factories, bad levels and missing
//! appender references are reported through the diagnostic logger and the
//! rest of the file still applies.

use std::path::Path;

use fnv::FnvHashMap;

use crate::append::SharedAppender;
use crate::context;
use crate::hierarchy::Hierarchy;
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::loglog::loglog;

pub mod properties;
pub mod registry;

pub use self::properties::Properties;

/// The prefix every recognized configuration key carries.
const KEY_PREFIX: &str = "log4cplus.";

/// Applies a property-file configuration to a hierarchy.
pub struct PropertyConfigurator {
    hierarchy: Hierarchy,
    properties: Properties,
    appenders: FnvHashMap<String, SharedAppender>,
}

impl PropertyConfigurator {
    /// Creates a configurator over an in-memory property set; keys are
    /// narrowed by stripping the `log4cplus.` prefix.
    pub fn new(properties: Properties, hierarchy: Hierarchy) -> PropertyConfigurator {
        PropertyConfigurator {
            hierarchy,
            properties: properties.subset(KEY_PREFIX),
            appenders: FnvHashMap::default(),
        }
    }

    /// Creates a configurator reading `path`.
    pub fn from_file(path: impl AsRef<Path>, hierarchy: Hierarchy) -> PropertyConfigurator {
        PropertyConfigurator::new(Properties::from_file(path), hierarchy)
    }

    /// One-shot: configures the default hierarchy from `path`.
    pub fn do_configure(path: impl AsRef<Path>) {
        PropertyConfigurator::from_file(path, context::context().hierarchy()).configure();
    }

    /// Runs the configuration pass.
    pub fn configure(mut self) {
        if let Some(debug) = self.properties.get_bool("configDebug") {
            loglog().set_internal_debugging(debug);
        }
        if let Some(quiet) = self.properties.get_bool("quietMode") {
            loglog().set_quiet_mode(quiet);
        }
        let disable_override = self.properties.get_bool("disableOverride").unwrap_or(false);

        context::initialize();
        self.configure_appenders();
        self.configure_loggers();

        if disable_override {
            self.hierarchy.disable(LogLevel::DISABLE_OVERRIDE);
        }

        // Loggers hold the appenders now; the staging map must not keep them
        // alive past this pass.
        self.appenders.clear();
    }

    /// Instantiates every `appender.<name> = <factory-type>` entry through
    /// the factory registry, handing each factory the `appender.<name>.`
    /// subset.
    fn configure_appenders(&mut self) {
        let appender_props = self.properties.subset("appender.");
        let names: Vec<String> = appender_props
            .property_names()
            .filter(|key| !key.contains('.'))
            .map(str::to_owned)
            .collect();

        for name in names {
            let Some(factory_type) = appender_props.get(&name) else {
                continue;
            };
            let subset = appender_props.subset(&format!("{}.", name));
            match context::context()
                .appender_factories()
                .create(factory_type, &subset)
            {
                Ok(appender) => {
                    appender.set_name(&name);
                    self.appenders.insert(name, appender);
                }
                Err(err) => {
                    loglog().error(format!("error while creating appender `{}`: {}", name, err))
                }
            }
        }
    }

    fn configure_loggers(&mut self) {
        if let Some(config) = self.properties.get("rootLogger").map(str::to_owned) {
            self.configure_logger(&self.hierarchy.root(), &config);
        }

        let logger_props = self.properties.subset("logger.");
        for name in logger_props
            .property_names()
            .map(str::to_owned)
            .collect::<Vec<_>>()
        {
            let Some(config) = logger_props.get(&name).map(str::to_owned) else {
                continue;
            };
            let logger = self.hierarchy.get(&name);
            self.configure_logger(&logger, &config);
        }
    }

    /// Applies one `LEVEL[,APPENDER_NAME]*` config string, spaces stripped.
    ///
    /// `INHERITED` leaves the level to the parent chain. The logger's
    /// appender list is replaced wholesale; references to appenders that
    /// were never created are reported and skipped.
    fn configure_logger(&self, logger: &Logger, config: &str) {
        let stripped: String = config.chars().filter(|&c| c != ' ').collect();
        if stripped.is_empty() {
            loglog().error(format!(
                "invalid config string for logger `{}`",
                logger.name()
            ));
            return;
        }

        let mut tokens = stripped.split(',');
        // The split of a non-empty string always yields a first token.
        let level = tokens.next().unwrap_or_default();
        if level == "INHERITED" {
            logger.set_level(LogLevel::NOT_SET);
        } else {
            logger.set_level(LogLevel::from_name(level));
        }

        // Replace, do not accumulate, so re-running a configuration does not
        // duplicate output.
        logger.remove_all_appenders();
        for appender_name in tokens.filter(|token| !token.is_empty()) {
            match self.appenders.get(appender_name) {
                Some(appender) => logger.add_appender(appender.clone()),
                None => loglog().error(format!("invalid appender: {}", appender_name)),
            }
        }
    }
}

/// Wires a lone console appender to the root logger at
/// [`LogLevel::DEBUG`].
pub struct BasicConfigurator;

impl BasicConfigurator {
    /// Applies the shortcut configuration to `hierarchy`.
    pub fn configure(hierarchy: Hierarchy, log_to_stderr: bool) {
        let mut props = Properties::new();
        props.set("log4cplus.rootLogger", "DEBUG, STDOUT");
        props.set("log4cplus.appender.STDOUT", "log4cplus::ConsoleAppender");
        props.set(
            "log4cplus.appender.STDOUT.logToStdErr",
            if log_to_stderr { "1" } else { "0" },
        );
        PropertyConfigurator::new(props, hierarchy).configure();
    }

    /// Applies the shortcut configuration to the default hierarchy.
    pub fn do_configure(log_to_stderr: bool) {
        BasicConfigurator::configure(context::context().hierarchy(), log_to_stderr);
    }
}
