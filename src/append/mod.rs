//! Appenders
//!
//! An appender commits events to an output: the console, a file, a rolling
//! file, or a user callback. Every appender shares the same dispatch
//! skeleton — threshold check, filter chain, layout, sink — guarded by its
//! own mutex, and is closed exactly once over its lifetime.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::properties::Properties;
use crate::context;
use crate::event::LoggingEvent;
use crate::filter::{check_filter, Filter, FilterResult};
use crate::layout::{Layout, SimpleLayout};
use crate::level::LogLevel;
use crate::loglog::loglog;

pub mod console;
pub mod custom;
pub mod file;
pub mod null;
pub mod rolling_file;
pub mod daily_file;

pub use self::console::ConsoleAppender;
pub use self::custom::CustomAppender;
pub use self::daily_file::{DailyRollingFileAppender, RolloverSchedule};
pub use self::file::FileAppender;
pub use self::null::NullAppender;
pub use self::rolling_file::RollingFileAppender;

/// An appender shared between loggers; the last reference to drop closes the
/// sink.
pub type SharedAppender = Arc<Appender>;

/// The sink half of an appender: where formatted events actually go.
///
/// Implementations are driven under the owning [`Appender`]'s mutex, so they
/// take `&mut self` and need no locking of their own.
pub trait Append: fmt::Debug + Send {
    /// Commits one event, formatting it through `layout`.
    ///
    /// Recoverable output failures should be routed through `errors` (and
    /// `errors.reset()` once the sink recovers); returning `Err` reports
    /// through the same handler.
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()>;

    /// Releases the sink's resources. Called at most once.
    fn close(&mut self) {}
}

/// Receives output errors an appender could not surface to the caller.
pub trait ErrorHandler: fmt::Debug + Send {
    /// Reports one error.
    fn error(&mut self, message: &str);

    /// Re-arms the handler after the sink recovered.
    fn reset(&mut self);
}

/// The default handler: reports the first error through the diagnostic
/// logger and stays silent until [`ErrorHandler::reset`].
#[derive(Debug)]
pub struct OnlyOnceErrorHandler {
    first_time: bool,
}

impl OnlyOnceErrorHandler {
    /// Creates a fresh handler.
    pub fn new() -> OnlyOnceErrorHandler {
        OnlyOnceErrorHandler { first_time: true }
    }
}

impl Default for OnlyOnceErrorHandler {
    fn default() -> OnlyOnceErrorHandler {
        OnlyOnceErrorHandler::new()
    }
}

impl ErrorHandler for OnlyOnceErrorHandler {
    fn error(&mut self, message: &str) {
        if self.first_time {
            loglog().error(message);
            self.first_time = false;
        }
    }

    fn reset(&mut self) {
        self.first_time = true;
    }
}

struct Inner {
    sink: Box<dyn Append>,
    layout: Box<dyn Layout>,
    error_handler: Box<dyn ErrorHandler>,
}

/// A configured output: a sink plus the shared dispatch state (name,
/// threshold, filter chain, layout, error handler).
///
/// Appenders are referenced by any number of loggers through
/// [`SharedAppender`]; dropping the last reference closes the sink exactly
/// once.
pub struct Appender {
    name: Mutex<String>,
    threshold: AtomicI32,
    filters: Vec<Box<dyn Filter>>,
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

impl fmt::Debug for Appender {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Appender")
            .field("name", &*self.name.lock())
            .field("threshold", &self.threshold())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl Appender {
    /// Creates a new `AppenderBuilder`.
    pub fn builder() -> AppenderBuilder {
        AppenderBuilder {
            name: String::new(),
            threshold: LogLevel::NOT_SET,
            layout: None,
            filters: Vec::new(),
            error_handler: None,
        }
    }

    /// Builds the shared dispatch state from an appender's property subset:
    /// `layout` (with its `layout.` subset), `Threshold`, and the numbered
    /// `filters.N` chain.
    ///
    /// Filter numbering must be consecutive starting at 1; a gap terminates
    /// the chain. Unknown factories are reported and skipped.
    pub fn from_properties(
        sink: Box<dyn Append>,
        properties: &Properties,
    ) -> SharedAppender {
        let mut builder = Appender::builder();

        if let Some(layout_kind) = properties.get("layout") {
            match context::context()
                .layout_factories()
                .create(layout_kind, &properties.subset("layout."))
            {
                Ok(layout) => builder = builder.layout(layout),
                Err(err) => loglog().error(format!("error while creating layout: {}", err)),
            }
        }

        if let Some(threshold) = properties.get("Threshold") {
            builder = builder.threshold(LogLevel::from_name(&threshold.to_uppercase()));
        }

        let filter_props = properties.subset("filters.");
        for index in 1.. {
            let key = index.to_string();
            let Some(filter_kind) = filter_props.get(&key) else {
                break;
            };
            match context::context()
                .filter_factories()
                .create(filter_kind, &filter_props.subset(&format!("{}.", key)))
            {
                Ok(filter) => builder = builder.filter(filter),
                Err(err) => loglog().error(format!("error while creating filter: {}", err)),
            }
        }

        Arc::new(builder.build(sink))
    }

    /// The appender's name; unique within one configuration pass.
    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    /// Renames the appender.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.lock() = name.into();
    }

    /// The minimum level this appender commits; [`LogLevel::NOT_SET`] passes
    /// everything.
    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_value(self.threshold.load(Ordering::Relaxed))
    }

    /// Replaces the threshold.
    pub fn set_threshold(&self, threshold: LogLevel) {
        self.threshold.store(threshold.value(), Ordering::Relaxed);
    }

    /// Replaces the layout.
    pub fn set_layout(&self, layout: Box<dyn Layout>) {
        self.inner.lock().layout = layout;
    }

    /// Replaces the error handler.
    pub fn set_error_handler(&self, handler: Box<dyn ErrorHandler>) {
        self.inner.lock().error_handler = handler;
    }

    /// Whether `close` has already run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn is_as_severe_as_threshold(&self, level: LogLevel) -> bool {
        let threshold = self.threshold();
        threshold.is_not_set() || level >= threshold
    }

    /// Runs the dispatch pipeline for one event under the appender's mutex:
    /// closed check, threshold, filter chain, then the sink.
    pub fn do_append(&self, event: &LoggingEvent) {
        let mut inner = self.inner.lock();

        if self.is_closed() {
            loglog().error(format!(
                "attempted to append to closed appender named [{}]",
                self.name()
            ));
            return;
        }

        if !self.is_as_severe_as_threshold(event.level()) {
            return;
        }

        if check_filter(&self.filters, event) == FilterResult::Deny {
            return;
        }

        let Inner {
            sink,
            layout,
            error_handler,
        } = &mut *inner;
        if let Err(err) = sink.append(event, layout.as_ref(), error_handler.as_mut()) {
            error_handler.error(&format!(
                "appender [{}] failed to append: {}",
                self.name.lock(),
                err
            ));
        }
    }

    /// Closes the sink. Further events are rejected and reported.
    ///
    /// Safe to call redundantly; only the first call reaches the sink, and
    /// dropping the last [`SharedAppender`] reference closes implicitly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.lock().sink.close();
    }
}

impl Drop for Appender {
    fn drop(&mut self) {
        loglog().debug(format!("destroying appender named [{}]", self.name()));
        self.close();
    }
}

/// A builder for `Appender`s.
pub struct AppenderBuilder {
    name: String,
    threshold: LogLevel,
    layout: Option<Box<dyn Layout>>,
    filters: Vec<Box<dyn Filter>>,
    error_handler: Option<Box<dyn ErrorHandler>>,
}

impl AppenderBuilder {
    /// Sets the appender's name.
    pub fn name(mut self, name: impl Into<String>) -> AppenderBuilder {
        self.name = name.into();
        self
    }

    /// Sets the threshold level.
    ///
    /// Defaults to [`LogLevel::NOT_SET`], which passes every event.
    pub fn threshold(mut self, threshold: LogLevel) -> AppenderBuilder {
        self.threshold = threshold;
        self
    }

    /// Sets the layout.
    ///
    /// Defaults to [`SimpleLayout`].
    pub fn layout(mut self, layout: Box<dyn Layout>) -> AppenderBuilder {
        self.layout = Some(layout);
        self
    }

    /// Appends a filter to the chain.
    pub fn filter(mut self, filter: Box<dyn Filter>) -> AppenderBuilder {
        self.filters.push(filter);
        self
    }

    /// Sets the error handler.
    ///
    /// Defaults to [`OnlyOnceErrorHandler`].
    pub fn error_handler(mut self, handler: Box<dyn ErrorHandler>) -> AppenderBuilder {
        self.error_handler = Some(handler);
        self
    }

    /// Consumes the builder, wrapping `sink` into an [`Appender`].
    pub fn build(self, sink: Box<dyn Append>) -> Appender {
        Appender {
            name: Mutex::new(self.name),
            threshold: AtomicI32::new(self.threshold.value()),
            filters: self.filters,
            inner: Mutex::new(Inner {
                sink,
                layout: self
                    .layout
                    .unwrap_or_else(|| Box::new(SimpleLayout::new())),
                error_handler: self
                    .error_handler
                    .unwrap_or_else(|| Box::new(OnlyOnceErrorHandler::new())),
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Builds and wraps the appender for sharing between loggers.
    pub fn build_shared(self, sink: Box<dyn Append>) -> SharedAppender {
        Arc::new(self.build(sink))
    }
}
