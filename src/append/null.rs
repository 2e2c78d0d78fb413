//! The null appender.

use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::layout::Layout;

/// An appender that accepts and discards every event.
#[derive(Clone, Copy, Default, Debug)]
pub struct NullAppender;

impl NullAppender {
    /// Creates a `NullAppender`; it takes no configuration.
    pub fn from_properties(_properties: &Properties) -> NullAppender {
        NullAppender
    }
}

impl Append for NullAppender {
    fn append(
        &mut self,
        _event: &LoggingEvent,
        _layout: &dyn Layout,
        _errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
