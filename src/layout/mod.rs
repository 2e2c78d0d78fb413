//! Layouts
//!
//! A layout renders a [`LoggingEvent`](crate::event::LoggingEvent) into one
//! line of text for a sink. [`SimpleLayout`] is the fixed default;
//! [`PatternLayout`](pattern::PatternLayout) compiles a user-supplied format
//! specification once and applies it per event.

use std::fmt;
use std::io;

use crate::context;
use crate::event::LoggingEvent;

pub mod pattern;

pub use self::pattern::PatternLayout;

/// A deterministic text renderer for events.
pub trait Layout: fmt::Debug + Send + Sync {
    /// Appends one rendered line for `event` to the writer.
    fn format_and_append(&self, w: &mut dyn io::Write, event: &LoggingEvent) -> io::Result<()>;
}

/// The default layout: `<ms since startup> - <LEVEL> - <message>`.
///
/// The time base is the process-global context's creation time, so the first
/// column reads as milliseconds since logging was initialized.
#[derive(Clone, Copy, Default, Debug)]
pub struct SimpleLayout;

impl SimpleLayout {
    /// Creates a `SimpleLayout`.
    pub fn new() -> SimpleLayout {
        SimpleLayout
    }
}

impl Layout for SimpleLayout {
    fn format_and_append(&self, w: &mut dyn io::Write, event: &LoggingEvent) -> io::Result<()> {
        let elapsed = event.timestamp().millis_since(context::time_base()).max(0);
        writeln!(w, "{} - {} - {}", elapsed, event.level(), event.message())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::level::LogLevel;

    #[test]
    fn simple_layout_shape() {
        let mut out = Vec::new();
        let event = LoggingEvent::new("a", LogLevel::WARN, "something happened");
        SimpleLayout::new().format_and_append(&mut out, &event).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with("- WARN - something happened\n"), "{line:?}");
        let millis: i64 = line.split(" - ").next().unwrap().trim().parse().unwrap();
        assert!(millis >= 0);
    }
}
