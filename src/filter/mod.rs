//! Filters
//!
//! Filters are attached to appenders in an ordered chain and limit the
//! events that reach the sink beyond what the threshold allows.

use std::fmt;

use crate::config::properties::Properties;
use crate::event::LoggingEvent;

pub mod level;

pub use self::level::{LogLevelMatchFilter, LogLevelRangeFilter};

/// The decision returned by a filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterResult {
    /// Drop the event immediately, bypassing any remaining filters.
    Deny,
    /// Take no position; the next filter in the chain decides.
    Neutral,
    /// Commit the event immediately, bypassing any remaining filters.
    Accept,
}

/// A per-event predicate evaluated by an appender before it commits an
/// event.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Judges a single event.
    fn decide(&self, event: &LoggingEvent) -> FilterResult;
}

/// Evaluates an ordered chain: the first non-neutral decision wins, and an
/// exhausted (or empty) chain accepts.
pub fn check_filter(filters: &[Box<dyn Filter>], event: &LoggingEvent) -> FilterResult {
    for filter in filters {
        match filter.decide(event) {
            FilterResult::Neutral => {}
            decision => return decision,
        }
    }
    FilterResult::Accept
}

/// A filter that denies every event.
///
/// Useful as a chain terminator behind accepting filters.
#[derive(Clone, Copy, Default, Debug)]
pub struct DenyAllFilter;

impl DenyAllFilter {
    /// Creates a `DenyAllFilter`; it takes no configuration.
    pub fn from_properties(_properties: &Properties) -> DenyAllFilter {
        DenyAllFilter
    }
}

impl Filter for DenyAllFilter {
    fn decide(&self, _event: &LoggingEvent) -> FilterResult {
        FilterResult::Deny
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::level::LogLevel;

    #[derive(Debug)]
    struct Fixed(FilterResult);

    impl Filter for Fixed {
        fn decide(&self, _: &LoggingEvent) -> FilterResult {
            self.0
        }
    }

    fn event() -> LoggingEvent {
        LoggingEvent::new("test", LogLevel::INFO, "msg")
    }

    #[test]
    fn empty_chain_accepts() {
        assert_eq!(check_filter(&[], &event()), FilterResult::Accept);
    }

    #[test]
    fn first_non_neutral_wins() {
        let chain: Vec<Box<dyn Filter>> = vec![
            Box::new(Fixed(FilterResult::Neutral)),
            Box::new(Fixed(FilterResult::Deny)),
            Box::new(Fixed(FilterResult::Accept)),
        ];
        assert_eq!(check_filter(&chain, &event()), FilterResult::Deny);

        let chain: Vec<Box<dyn Filter>> = vec![
            Box::new(Fixed(FilterResult::Accept)),
            Box::new(Fixed(FilterResult::Deny)),
        ];
        assert_eq!(check_filter(&chain, &event()), FilterResult::Accept);
    }

    #[test]
    fn all_neutral_accepts() {
        let chain: Vec<Box<dyn Filter>> = vec![
            Box::new(Fixed(FilterResult::Neutral)),
            Box::new(Fixed(FilterResult::Neutral)),
        ];
        assert_eq!(check_filter(&chain, &event()), FilterResult::Accept);
    }

    #[test]
    fn deny_all() {
        assert_eq!(DenyAllFilter.decide(&event()), FilterResult::Deny);
    }
}
