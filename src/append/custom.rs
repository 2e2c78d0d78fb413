//! The custom-callback appender.

use parking_lot::Mutex;

use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::layout::Layout;

/// The process-wide callback invoked with each formatted line.
pub type CustomFunc = fn(&str);

static CUSTOM_FUNC: Mutex<Option<CustomFunc>> = Mutex::new(None);

/// An appender that hands formatted lines to a process-wide callback.
///
/// While no callback is installed, events are dropped silently.
#[derive(Clone, Copy, Default, Debug)]
pub struct CustomAppender;

impl CustomAppender {
    /// Creates a `CustomAppender`; it takes no configuration.
    pub fn from_properties(_properties: &Properties) -> CustomAppender {
        CustomAppender
    }

    /// Installs the callback shared by every `CustomAppender`.
    pub fn set_custom_func(func: CustomFunc) {
        *CUSTOM_FUNC.lock() = Some(func);
    }

    /// Removes the callback; subsequent events are dropped.
    pub fn clear_custom_func() {
        *CUSTOM_FUNC.lock() = None;
    }
}

impl Append for CustomAppender {
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        _errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        let Some(func) = *CUSTOM_FUNC.lock() else {
            return Ok(());
        };

        let mut buf = Vec::new();
        layout.format_and_append(&mut buf, event)?;
        func(&String::from_utf8_lossy(&buf));
        Ok(())
    }
}
