//! Level-based filters.

use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::filter::{Filter, FilterResult};
use crate::level::LogLevel;

/// A filter that decides on an exact level match and stays neutral
/// otherwise.
#[derive(Clone, Copy, Debug)]
pub struct LogLevelMatchFilter {
    level_to_match: LogLevel,
    accept_on_match: bool,
}

impl LogLevelMatchFilter {
    /// Creates a filter matching `level_to_match` exactly.
    ///
    /// On a match the event is accepted when `accept_on_match` is set and
    /// denied otherwise; non-matching events pass through neutrally.
    pub fn new(level_to_match: LogLevel, accept_on_match: bool) -> LogLevelMatchFilter {
        LogLevelMatchFilter {
            level_to_match,
            accept_on_match,
        }
    }

    /// Builds the filter from `LogLevelToMatch` and `AcceptOnMatch`
    /// properties; both default unset (neutral filter, accepting match).
    pub fn from_properties(properties: &Properties) -> LogLevelMatchFilter {
        let level_to_match = properties
            .get("LogLevelToMatch")
            .map(LogLevel::from_name)
            .unwrap_or(LogLevel::NOT_SET);
        let accept_on_match = properties.get_bool("AcceptOnMatch").unwrap_or(true);
        LogLevelMatchFilter::new(level_to_match, accept_on_match)
    }
}

impl Filter for LogLevelMatchFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterResult {
        if self.level_to_match.is_not_set() {
            return FilterResult::Neutral;
        }

        if event.level() == self.level_to_match {
            if self.accept_on_match {
                FilterResult::Accept
            } else {
                FilterResult::Deny
            }
        } else {
            FilterResult::Neutral
        }
    }
}

/// A filter that denies events outside an inclusive level range and accepts
/// everything inside it.
///
/// An unset bound disables that side of the range.
#[derive(Clone, Copy, Debug)]
pub struct LogLevelRangeFilter {
    min: LogLevel,
    max: LogLevel,
}

impl LogLevelRangeFilter {
    /// Creates a range filter; pass [`LogLevel::NOT_SET`] to leave a bound
    /// open.
    pub fn new(min: LogLevel, max: LogLevel) -> LogLevelRangeFilter {
        LogLevelRangeFilter { min, max }
    }

    /// Builds the filter from `LogLevelMin` and `LogLevelMax` properties.
    pub fn from_properties(properties: &Properties) -> LogLevelRangeFilter {
        let min = properties
            .get("LogLevelMin")
            .map(LogLevel::from_name)
            .unwrap_or(LogLevel::NOT_SET);
        let max = properties
            .get("LogLevelMax")
            .map(LogLevel::from_name)
            .unwrap_or(LogLevel::NOT_SET);
        LogLevelRangeFilter::new(min, max)
    }
}

impl Filter for LogLevelRangeFilter {
    fn decide(&self, event: &LoggingEvent) -> FilterResult {
        if !self.min.is_not_set() && event.level() < self.min {
            return FilterResult::Deny;
        }

        if !self.max.is_not_set() && event.level() > self.max {
            return FilterResult::Deny;
        }

        FilterResult::Accept
    }
}
