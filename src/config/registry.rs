//! Name-indexed factories for appenders, layouts and filters.
//!
//! Configuration files refer to component types by name
//! (`log4cplus::ConsoleAppender`, `log4cplus::PatternLayout`, ...); the
//! registries resolve those names to constructor functions. User components
//! can be registered next to the built-ins.

use fnv::FnvHashMap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::append::{
    Appender, ConsoleAppender, CustomAppender, DailyRollingFileAppender, FileAppender,
    NullAppender, RollingFileAppender, SharedAppender,
};
use crate::config::properties::Properties;
use crate::filter::{DenyAllFilter, Filter, LogLevelMatchFilter, LogLevelRangeFilter};
use crate::layout::{Layout, PatternLayout, SimpleLayout};

/// Constructs a fully wrapped appender from its property subset.
pub type AppenderFactory = fn(&Properties) -> anyhow::Result<SharedAppender>;
/// Constructs a layout from its property subset.
pub type LayoutFactory = fn(&Properties) -> anyhow::Result<Box<dyn Layout>>;
/// Constructs a filter from its property subset.
pub type FilterFactory = fn(&Properties) -> anyhow::Result<Box<dyn Filter>>;

/// An error resolving or running a component factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No factory is registered under the requested type name.
    #[error("cannot find {registry} factory `{name}`")]
    UnknownFactory {
        /// Which registry was consulted.
        registry: &'static str,
        /// The requested type name.
        name: String,
    },
}

/// A registry mapping type names to factory functions.
pub struct FactoryRegistry<F> {
    registry: &'static str,
    factories: Mutex<FnvHashMap<String, F>>,
}

impl<F: Copy> FactoryRegistry<F> {
    fn new(registry: &'static str) -> FactoryRegistry<F> {
        FactoryRegistry {
            registry,
            factories: Mutex::new(FnvHashMap::default()),
        }
    }

    /// Registers a factory, replacing any previous one under the same name.
    pub fn register(&self, name: impl Into<String>, factory: F) {
        self.factories.lock().insert(name.into(), factory);
    }

    /// Looks a factory up by type name.
    pub fn get(&self, name: &str) -> Option<F> {
        self.factories.lock().get(name).copied()
    }

    /// The registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl<T> FactoryRegistry<fn(&Properties) -> anyhow::Result<T>> {
    /// Resolves `name` and runs the factory on `properties`.
    pub fn create(&self, name: &str, properties: &Properties) -> anyhow::Result<T> {
        match self.get(name) {
            Some(factory) => factory(properties),
            None => Err(FactoryError::UnknownFactory {
                registry: self.registry,
                name: name.to_owned(),
            }
            .into()),
        }
    }
}

fn console_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(ConsoleAppender::from_properties(properties)),
        properties,
    ))
}

fn null_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(NullAppender::from_properties(properties)),
        properties,
    ))
}

fn custom_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(CustomAppender::from_properties(properties)),
        properties,
    ))
}

fn file_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(FileAppender::from_properties(properties)?),
        properties,
    ))
}

fn rolling_file_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(RollingFileAppender::from_properties(properties)?),
        properties,
    ))
}

fn daily_rolling_file_appender(properties: &Properties) -> anyhow::Result<SharedAppender> {
    Ok(Appender::from_properties(
        Box::new(DailyRollingFileAppender::from_properties(properties)?),
        properties,
    ))
}

fn simple_layout(_properties: &Properties) -> anyhow::Result<Box<dyn Layout>> {
    Ok(Box::new(SimpleLayout::new()))
}

fn pattern_layout(properties: &Properties) -> anyhow::Result<Box<dyn Layout>> {
    Ok(Box::new(PatternLayout::from_properties(properties)?))
}

fn deny_all_filter(properties: &Properties) -> anyhow::Result<Box<dyn Filter>> {
    Ok(Box::new(DenyAllFilter::from_properties(properties)))
}

fn level_match_filter(properties: &Properties) -> anyhow::Result<Box<dyn Filter>> {
    Ok(Box::new(LogLevelMatchFilter::from_properties(properties)))
}

fn level_range_filter(properties: &Properties) -> anyhow::Result<Box<dyn Filter>> {
    Ok(Box::new(LogLevelRangeFilter::from_properties(properties)))
}

pub(crate) fn default_appender_factories() -> FactoryRegistry<AppenderFactory> {
    let registry = FactoryRegistry::new("appender");
    registry.register("log4cplus::ConsoleAppender", console_appender as AppenderFactory);
    registry.register("log4cplus::NullAppender", null_appender as AppenderFactory);
    registry.register("log4cplus::CustomAppender", custom_appender as AppenderFactory);
    registry.register("log4cplus::FileAppender", file_appender as AppenderFactory);
    registry.register(
        "log4cplus::RollingFileAppender",
        rolling_file_appender as AppenderFactory,
    );
    registry.register(
        "log4cplus::DailyRollingFileAppender",
        daily_rolling_file_appender as AppenderFactory,
    );
    registry
}

pub(crate) fn default_layout_factories() -> FactoryRegistry<LayoutFactory> {
    let registry = FactoryRegistry::new("layout");
    registry.register("log4cplus::SimpleLayout", simple_layout as LayoutFactory);
    registry.register("log4cplus::PatternLayout", pattern_layout as LayoutFactory);
    registry
}

pub(crate) fn default_filter_factories() -> FactoryRegistry<FilterFactory> {
    let registry = FactoryRegistry::new("filter");
    registry.register("log4cplus::DenyAllFilter", deny_all_filter as FilterFactory);
    registry.register(
        "log4cplus::LogLevelMatchFilter",
        level_match_filter as FilterFactory,
    );
    registry.register(
        "log4cplus::LogLevelRangeFilter",
        level_range_filter as FilterFactory,
    );
    registry
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let appenders = default_appender_factories();
        for name in [
            "log4cplus::ConsoleAppender",
            "log4cplus::NullAppender",
            "log4cplus::CustomAppender",
            "log4cplus::FileAppender",
            "log4cplus::RollingFileAppender",
            "log4cplus::DailyRollingFileAppender",
        ] {
            assert!(appenders.get(name).is_some(), "missing {name}");
        }

        assert_eq!(default_layout_factories().names().len(), 2);
        assert_eq!(default_filter_factories().names().len(), 3);
    }

    #[test]
    fn unknown_factory_is_an_error() {
        let layouts = default_layout_factories();
        let err = layouts
            .create("log4cplus::NoSuchLayout", &Properties::new())
            .unwrap_err();
        assert!(err.to_string().contains("NoSuchLayout"));
    }

    #[test]
    fn user_factories_can_be_registered() {
        let layouts = default_layout_factories();
        layouts.register("custom::Layout", simple_layout as LayoutFactory);
        assert!(layouts.create("custom::Layout", &Properties::new()).is_ok());
    }

    #[test]
    fn create_runs_the_factory() {
        let filters = default_filter_factories();
        let mut props = Properties::new();
        props.set("LogLevelToMatch", "ERROR");
        let filter = filters
            .create("log4cplus::LogLevelMatchFilter", &props)
            .unwrap();
        let event = crate::event::LoggingEvent::new("t", crate::level::LogLevel::ERROR, "m");
        assert_eq!(
            filter.decide(&event),
            crate::filter::FilterResult::Accept
        );
    }
}
