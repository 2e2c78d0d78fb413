//! Loggers
//!
//! A logger is a named dispatch point in the hierarchy. Its effective level
//! is inherited from the nearest ancestor with an explicit level, and events
//! it accepts are handed to every appender attached along the walk from the
//! logger up to the root.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::append::SharedAppender;
use crate::context;
use crate::event::LoggingEvent;
use crate::hierarchy::HierarchyShared;
use crate::level::LogLevel;
use crate::loglog::loglog;

pub(crate) struct LoggerNode {
    pub(crate) name: String,
    level: AtomicI32,
    additive: AtomicBool,
    pub(crate) parent: ArcSwapOption<LoggerNode>,
    appenders: Mutex<Vec<SharedAppender>>,
    shared: Weak<HierarchyShared>,
}

impl LoggerNode {
    pub(crate) fn new(
        name: impl Into<String>,
        level: LogLevel,
        shared: Weak<HierarchyShared>,
    ) -> LoggerNode {
        LoggerNode {
            name: name.into(),
            level: AtomicI32::new(level.value()),
            additive: AtomicBool::new(true),
            parent: ArcSwapOption::const_empty(),
            appenders: Mutex::new(Vec::new()),
            shared,
        }
    }

    pub(crate) fn level(&self) -> LogLevel {
        LogLevel::from_value(self.level.load(Ordering::Relaxed))
    }

    fn append_to_attached(&self, event: &LoggingEvent) -> usize {
        let appenders = self.appenders.lock();
        for appender in appenders.iter() {
            appender.do_append(event);
        }
        appenders.len()
    }
}

/// A handle on one named logger.
///
/// Handles are cheap to clone and share the underlying node, so levels and
/// appender lists set through one handle are visible through all of them.
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Logger")
            .field("name", &self.node.name)
            .field("level", &self.level())
            .finish()
    }
}

impl Logger {
    pub(crate) fn from_node(node: Arc<LoggerNode>) -> Logger {
        Logger { node }
    }

    pub(crate) fn node(&self) -> &Arc<LoggerNode> {
        &self.node
    }

    /// The fully qualified dotted name; empty for the root logger.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    fn is_root(&self) -> bool {
        self.node.name.is_empty()
    }

    /// This logger's own level, [`LogLevel::NOT_SET`] when inherited.
    pub fn level(&self) -> LogLevel {
        self.node.level()
    }

    /// Sets this logger's own level.
    ///
    /// The root logger must always carry a concrete level; attempts to set
    /// [`LogLevel::NOT_SET`] on it are rejected with a warning.
    pub fn set_level(&self, level: LogLevel) {
        if self.is_root() && level.is_not_set() {
            loglog().error("NOTSET level cannot be set on the root logger");
            return;
        }
        self.node.level.store(level.value(), Ordering::Relaxed);
    }

    /// The logger's additivity flag.
    ///
    /// Reserved for a future extension; dispatch currently behaves as if
    /// every logger were additive, propagating events to ancestor appenders
    /// regardless of this flag.
    pub fn additivity(&self) -> bool {
        self.node.additive.load(Ordering::Relaxed)
    }

    /// Records the additivity flag; see [`Logger::additivity`].
    pub fn set_additivity(&self, additive: bool) {
        self.node.additive.store(additive, Ordering::Relaxed);
    }

    /// The parent logger; `None` only for the root.
    pub fn parent(&self) -> Option<Logger> {
        self.node.parent.load_full().map(Logger::from_node)
    }

    /// The level this logger gates on: the nearest ancestor's explicit
    /// level, starting with this logger itself.
    pub fn effective_level(&self) -> LogLevel {
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            let level = node.level();
            if !level.is_not_set() {
                return level;
            }
            current = node.parent.load_full();
        }

        // Unreachable as long as the root invariant holds.
        loglog().error("no explicit level found on the path to the root logger");
        LogLevel::NOT_SET
    }

    /// Whether an event at `level` would be dispatched from this logger.
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        if let Some(shared) = self.node.shared.upgrade() {
            if shared.is_disabled(level) {
                return false;
            }
        }
        level >= self.effective_level()
    }

    /// Whether [`LogLevel::TRACE`] events would be dispatched.
    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled_for(LogLevel::TRACE)
    }

    /// Whether [`LogLevel::DEBUG`] events would be dispatched.
    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled_for(LogLevel::DEBUG)
    }

    /// Whether [`LogLevel::INFO`] events would be dispatched.
    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled_for(LogLevel::INFO)
    }

    /// Logs a pre-rendered message with no source location.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if self.is_enabled_for(level) {
            self.forced_log_at(level, format_args!("{}", message.as_ref()), "", None, "");
        }
    }

    /// Gates and dispatches an already-built event.
    pub fn log_event(&self, event: &LoggingEvent) {
        if self.is_enabled_for(event.level()) {
            self.forced_log(event);
        }
    }

    /// Dispatches an event without the level check.
    pub fn forced_log(&self, event: &LoggingEvent) {
        self.call_appenders(event);
    }

    /// Dispatches with call-site metadata, bypassing the level check.
    ///
    /// This is the entry point the logging macros expand to after their own
    /// fast-path check; the per-thread scratch event is reused so the hot
    /// path does not allocate.
    pub fn forced_log_at(
        &self,
        level: LogLevel,
        message: fmt::Arguments<'_>,
        file: &str,
        line: Option<u32>,
        function: &str,
    ) {
        context::with_scratch_event(|event| {
            event.rewrite(self.name(), level, message, file, line, function);
            self.call_appenders(event);
        });
    }

    fn call_appenders(&self, event: &LoggingEvent) {
        let mut writes = 0;
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            writes += node.append_to_attached(event);
            current = node.parent.load_full();
        }

        if writes == 0 {
            if let Some(shared) = self.node.shared.upgrade() {
                if !shared.take_no_appender_warning() {
                    loglog().error(format!(
                        "no appenders could be found for logger ({})",
                        self.name()
                    ));
                    loglog().error("please initialize the logging system properly");
                }
            }
        }
    }

    /// Attaches an appender; already-attached appenders are not duplicated.
    pub fn add_appender(&self, appender: SharedAppender) {
        let mut appenders = self.node.appenders.lock();
        if !appenders.iter().any(|a| Arc::ptr_eq(a, &appender)) {
            appenders.push(appender);
        }
    }

    /// A snapshot of the attached appenders.
    pub fn get_all_appenders(&self) -> Vec<SharedAppender> {
        self.node.appenders.lock().clone()
    }

    /// Looks an attached appender up by name.
    pub fn get_appender(&self, name: &str) -> Option<SharedAppender> {
        self.node
            .appenders
            .lock()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    /// Detaches the named appender, returning whether it was attached.
    pub fn remove_appender(&self, name: &str) -> bool {
        let mut appenders = self.node.appenders.lock();
        let before = appenders.len();
        appenders.retain(|a| a.name() != name);
        appenders.len() != before
    }

    /// Detaches every appender.
    pub fn remove_all_appenders(&self) {
        self.node.appenders.lock().clear();
    }

    /// Closes every attached appender that is not already closed.
    pub fn close_nested_appenders(&self) {
        for appender in self.get_all_appenders() {
            if !appender.is_closed() {
                appender.close();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::append::{Append, Appender, ErrorHandler};
    use crate::hierarchy::Hierarchy;
    use crate::layout::Layout;

    #[derive(Debug, Default)]
    struct CountingSink(Arc<AtomicI32>);

    impl Append for CountingSink {
        fn append(
            &mut self,
            _event: &LoggingEvent,
            _layout: &dyn Layout,
            _errors: &mut dyn ErrorHandler,
        ) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting_appender() -> (SharedAppender, Arc<AtomicI32>) {
        let count = Arc::new(AtomicI32::new(0));
        let appender = Appender::builder().build_shared(Box::new(CountingSink(count.clone())));
        (appender, count)
    }

    #[test]
    fn events_propagate_to_ancestors() {
        let hierarchy = Hierarchy::new();
        let (root_appender, root_count) = counting_appender();
        let (child_appender, child_count) = counting_appender();

        hierarchy.root().add_appender(root_appender);
        let child = hierarchy.get("a.b");
        child.add_appender(child_appender);

        child.log(LogLevel::INFO, "to both");
        assert_eq!(child_count.load(Ordering::SeqCst), 1);
        assert_eq!(root_count.load(Ordering::SeqCst), 1);

        hierarchy.get("a").log(LogLevel::INFO, "root only");
        assert_eq!(child_count.load(Ordering::SeqCst), 1);
        assert_eq!(root_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn additivity_flag_is_recorded_but_does_not_gate_dispatch() {
        let hierarchy = Hierarchy::new();
        let (root_appender, root_count) = counting_appender();
        let (child_appender, child_count) = counting_appender();

        hierarchy.root().add_appender(root_appender);
        let child = hierarchy.get("quiet");
        child.add_appender(child_appender);

        assert!(child.additivity());
        child.set_additivity(false);
        assert!(!child.additivity());

        // The walk still reaches the root's appenders.
        child.log(LogLevel::INFO, "propagated");
        assert_eq!(child_count.load(Ordering::SeqCst), 1);
        assert_eq!(root_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn gating_respects_effective_level() {
        let hierarchy = Hierarchy::new();
        let (appender, count) = counting_appender();
        hierarchy.root().add_appender(appender);
        hierarchy.root().set_level(LogLevel::WARN);

        let logger = hierarchy.get("gated");
        logger.log(LogLevel::INFO, "dropped");
        logger.log(LogLevel::WARN, "kept");
        logger.log(LogLevel::ERROR, "kept");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_appenders_are_not_attached_twice() {
        let hierarchy = Hierarchy::new();
        let (appender, count) = counting_appender();
        let logger = hierarchy.get("dup");
        logger.add_appender(appender.clone());
        logger.add_appender(appender);

        logger.log(LogLevel::INFO, "once");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(logger.get_all_appenders().len(), 1);
    }

    #[test]
    fn appender_management() {
        let hierarchy = Hierarchy::new();
        let (appender, _) = counting_appender();
        appender.set_name("sink");

        let logger = hierarchy.get("mgmt");
        logger.add_appender(appender);
        assert!(logger.get_appender("sink").is_some());
        assert!(logger.remove_appender("sink"));
        assert!(!logger.remove_appender("sink"));
        assert!(logger.get_all_appenders().is_empty());
    }

    #[test]
    fn root_rejects_not_set() {
        let hierarchy = Hierarchy::new();
        hierarchy.root().set_level(LogLevel::NOT_SET);
        assert_eq!(hierarchy.root().level(), LogLevel::DEBUG);
    }
}
