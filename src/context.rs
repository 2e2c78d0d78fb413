//! The process-global context.
//!
//! All singletons live here: the default hierarchy, the three factory
//! registries, the console-serialization lock and the layout time base. The
//! context is created by [`initialize`] (implicitly on first use) and torn
//! down by [`shutdown`]; a monotonic lifecycle state guards against silent
//! re-initialization after teardown.

use std::cell::RefCell;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::registry::{
    default_appender_factories, default_filter_factories, default_layout_factories,
    AppenderFactory, FactoryRegistry, FilterFactory, LayoutFactory,
};
use crate::event::LoggingEvent;
use crate::hierarchy::Hierarchy;
use crate::level::LogLevel;
use crate::loglog::loglog;
use crate::time::Timestamp;

/// The container for every process-wide singleton.
pub struct Context {
    hierarchy: Hierarchy,
    appender_factories: FactoryRegistry<AppenderFactory>,
    layout_factories: FactoryRegistry<LayoutFactory>,
    filter_factories: FactoryRegistry<FilterFactory>,
    time_base: Timestamp,
}

impl Context {
    fn new() -> Context {
        Context {
            hierarchy: Hierarchy::new(),
            appender_factories: default_appender_factories(),
            layout_factories: default_layout_factories(),
            filter_factories: default_filter_factories(),
            time_base: Timestamp::now(),
        }
    }

    /// The default logger hierarchy.
    pub fn hierarchy(&self) -> Hierarchy {
        self.hierarchy.clone()
    }

    /// The registry configuration resolves appender type names against.
    pub fn appender_factories(&self) -> &FactoryRegistry<AppenderFactory> {
        &self.appender_factories
    }

    /// The registry configuration resolves layout type names against.
    pub fn layout_factories(&self) -> &FactoryRegistry<LayoutFactory> {
        &self.layout_factories
    }

    /// The registry configuration resolves filter type names against.
    pub fn filter_factories(&self) -> &FactoryRegistry<FilterFactory> {
        &self.filter_factories
    }

    /// The instant this context was created; [`crate::layout::SimpleLayout`]
    /// renders times relative to it.
    pub fn time_base(&self) -> Timestamp {
        self.time_base
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initialized,
    Destroyed,
}

static CONTEXT: ArcSwapOption<Context> = ArcSwapOption::const_empty();
static LIFECYCLE: Mutex<Lifecycle> = Mutex::new(Lifecycle::Uninitialized);
static CONSOLE_MUTEX: Mutex<()> = Mutex::new(());

/// The lock serializing console output between [`crate::loglog`] and the
/// console appender.
pub(crate) fn console_lock() -> &'static Mutex<()> {
    &CONSOLE_MUTEX
}

/// Creates the global context if it does not exist yet.
///
/// Idempotent while the context is alive. Re-initializing after [`shutdown`]
/// is reported (the destroyed context's resources were already released and
/// cannot be reclaimed) and then proceeds with a fresh context.
pub fn initialize() {
    let mut lifecycle = LIFECYCLE.lock();
    match *lifecycle {
        Lifecycle::Initialized => {}
        Lifecycle::Uninitialized => {
            CONTEXT.store(Some(Arc::new(Context::new())));
            *lifecycle = Lifecycle::Initialized;
        }
        Lifecycle::Destroyed => {
            loglog().warn("re-initializing after shutdown, the destroyed context leaked");
            CONTEXT.store(Some(Arc::new(Context::new())));
            *lifecycle = Lifecycle::Initialized;
        }
    }
}

/// Closes every appender attached in the default hierarchy and tears the
/// global context down.
pub fn shutdown() {
    let mut lifecycle = LIFECYCLE.lock();
    if *lifecycle != Lifecycle::Initialized {
        return;
    }

    if let Some(context) = CONTEXT.swap(None) {
        context.hierarchy().close_all_appenders();
    }
    *lifecycle = Lifecycle::Destroyed;
}

/// Returns the global context, initializing on first use.
pub fn context() -> Arc<Context> {
    loop {
        if let Some(context) = CONTEXT.load_full() {
            return context;
        }
        initialize();
    }
}

/// The time base used for relative timestamps.
pub(crate) fn time_base() -> Timestamp {
    context().time_base()
}

thread_local! {
    static SCRATCH_EVENT: RefCell<LoggingEvent> =
        RefCell::new(LoggingEvent::new("", LogLevel::NOT_SET, ""));
    static SCRATCH_BUF: RefCell<String> = RefCell::new(String::new());
}

/// Hands out this thread's reusable event.
///
/// A sink that logs while an event is being dispatched (re-entrancy) gets a
/// fresh event instead of the borrowed scratch one.
pub(crate) fn with_scratch_event<R>(f: impl FnOnce(&mut LoggingEvent) -> R) -> R {
    SCRATCH_EVENT.with(|cell| match cell.try_borrow_mut() {
        Ok(mut event) => f(&mut event),
        Err(_) => f(&mut LoggingEvent::new("", LogLevel::NOT_SET, "")),
    })
}

/// Hands out this thread's reusable format buffer, cleared.
pub(crate) fn with_scratch_buf<R>(f: impl FnOnce(&mut String) -> R) -> R {
    SCRATCH_BUF.with(|cell| match cell.try_borrow_mut() {
        Ok(mut buf) => {
            buf.clear();
            f(&mut buf)
        }
        Err(_) => f(&mut String::new()),
    })
}
