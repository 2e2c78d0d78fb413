//! The logger hierarchy.
//!
//! Loggers form a forest rooted at the empty-name logger. Creating a logger
//! whose dotted ancestors do not exist yet parks it in a *provision node*
//! under each missing ancestor name; when that ancestor is eventually
//! materialized, the parked children are re-parented onto it.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use fnv::FnvHashMap;
use parking_lot::Mutex;

use crate::level::LogLevel;
use crate::logger::{Logger, LoggerNode};

#[derive(Default)]
struct Tables {
    loggers: FnvHashMap<String, Arc<LoggerNode>>,
    provision: FnvHashMap<String, Vec<Arc<LoggerNode>>>,
}

pub(crate) struct HierarchyShared {
    root: Arc<LoggerNode>,
    tables: Mutex<Tables>,
    disable: AtomicI32,
    emitted_no_appender_warning: AtomicBool,
}

impl HierarchyShared {
    pub(crate) fn is_disabled(&self, level: LogLevel) -> bool {
        self.disable.load(Ordering::Relaxed) >= level.value()
    }

    /// Returns the previous value of the one-shot warning flag, raising it.
    pub(crate) fn take_no_appender_warning(&self) -> bool {
        self.emitted_no_appender_warning.swap(true, Ordering::Relaxed)
    }
}

/// A handle on one logger forest plus its process-wide gating state.
///
/// Handles are cheap to clone; the default hierarchy lives in the global
/// context and is what [`crate::logger`] and the configurators operate on.
#[derive(Clone)]
pub struct Hierarchy {
    shared: Arc<HierarchyShared>,
}

impl Default for Hierarchy {
    fn default() -> Hierarchy {
        Hierarchy::new()
    }
}

impl Hierarchy {
    /// Creates an empty hierarchy whose root logger starts at
    /// [`LogLevel::DEBUG`].
    pub fn new() -> Hierarchy {
        let shared = Arc::new_cyclic(|weak| HierarchyShared {
            root: Arc::new(LoggerNode::new("", LogLevel::DEBUG, weak.clone())),
            tables: Mutex::new(Tables::default()),
            disable: AtomicI32::new(LogLevel::NOT_SET.value()),
            emitted_no_appender_warning: AtomicBool::new(false),
        });
        Hierarchy { shared }
    }

    /// The root logger.
    pub fn root(&self) -> Logger {
        Logger::from_node(self.shared.root.clone())
    }

    /// Returns the named logger, creating it (and wiring its parentage) if
    /// absent. The empty name designates the root.
    pub fn get(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.root();
        }

        let mut tables = self.shared.tables.lock();
        if let Some(node) = tables.loggers.get(name) {
            return Logger::from_node(node.clone());
        }

        let node = Arc::new(LoggerNode::new(
            name,
            LogLevel::NOT_SET,
            Arc::downgrade(&self.shared),
        ));
        tables.loggers.insert(name.to_owned(), node.clone());

        if let Some(children) = tables.provision.remove(name) {
            update_children(&children, &node);
        }
        update_parents(&mut tables, &self.shared.root, &node);

        Logger::from_node(node)
    }

    /// Whether a logger with this name has been materialized. The root
    /// always exists.
    pub fn exists(&self, name: &str) -> bool {
        name.is_empty() || self.shared.tables.lock().loggers.contains_key(name)
    }

    /// A snapshot of all materialized loggers, excluding the root.
    pub fn current_loggers(&self) -> Vec<Logger> {
        self.shared
            .tables
            .lock()
            .loggers
            .values()
            .cloned()
            .map(Logger::from_node)
            .collect()
    }

    /// Drops every logger and provision node, keeping the root.
    pub fn clear(&self) {
        let mut tables = self.shared.tables.lock();
        tables.loggers.clear();
        tables.provision.clear();
    }

    /// Restores the default gating state: the root back to
    /// [`LogLevel::DEBUG`], every other logger to [`LogLevel::NOT_SET`], all
    /// appender lists emptied, and the disable watermark cleared.
    pub fn reset_configuration(&self) {
        let root = self.root();
        root.set_level(LogLevel::DEBUG);
        root.remove_all_appenders();
        self.enable_all();

        for logger in self.current_loggers() {
            logger.set_level(LogLevel::NOT_SET);
            logger.remove_all_appenders();
        }
    }

    /// Sets the process-wide watermark: events at or below `level` are
    /// dropped before the hierarchy walk.
    ///
    /// Once the watermark has been pinned by the configurator's
    /// `disableOverride`, later calls have no effect.
    pub fn disable(&self, level: LogLevel) {
        if LogLevel::from_value(self.shared.disable.load(Ordering::Relaxed))
            != LogLevel::DISABLE_OVERRIDE
        {
            self.shared.disable.store(level.value(), Ordering::Relaxed);
        }
    }

    /// Drops every event regardless of level.
    pub fn disable_all(&self) {
        self.disable(LogLevel::from_value(i32::MAX));
    }

    /// Drops [`LogLevel::DEBUG`] events and below.
    pub fn disable_debug(&self) {
        self.disable(LogLevel::DEBUG);
    }

    /// Drops [`LogLevel::INFO`] events and below.
    pub fn disable_info(&self) {
        self.disable(LogLevel::INFO);
    }

    /// Clears the watermark, restoring normal level gating. Also unpins a
    /// watermark locked by `disableOverride`.
    pub fn enable_all(&self) {
        self.shared
            .disable
            .store(LogLevel::NOT_SET.value(), Ordering::Relaxed);
    }

    /// Whether the watermark currently swallows `level`.
    pub fn is_disabled(&self, level: LogLevel) -> bool {
        self.shared.is_disabled(level)
    }

    /// Closes the appenders of the root and of every logger.
    pub(crate) fn close_all_appenders(&self) {
        self.root().close_nested_appenders();
        for logger in self.current_loggers() {
            logger.close_nested_appenders();
        }
    }
}

/// Hooks a freshly created logger to its closest materialized ancestor,
/// leaving a provision entry under every missing ancestor name on the way.
fn update_parents(tables: &mut Tables, root: &Arc<LoggerNode>, node: &Arc<LoggerNode>) {
    let name = &node.name;
    let mut parent_found = false;

    // For "w.x.y.z" visit "w.x.y", "w.x" and "w", longest first.
    let mut end = name.rfind('.');
    while let Some(idx) = end {
        if idx == 0 {
            break;
        }
        let prefix = &name[..idx];

        if let Some(parent) = tables.loggers.get(prefix) {
            node.parent.store(Some(parent.clone()));
            parent_found = true;
            // No need to touch the ancestors of the closest ancestor.
            break;
        }
        tables
            .provision
            .entry(prefix.to_owned())
            .or_default()
            .push(node.clone());

        end = prefix.rfind('.');
    }

    if !parent_found {
        node.parent.store(Some(root.clone()));
    }
}

/// Re-parents provision-node children onto a newly materialized ancestor.
///
/// A child whose current parent already lies below the new logger keeps it;
/// every other child is rewired through the new logger.
fn update_children(children: &[Arc<LoggerNode>], node: &Arc<LoggerNode>) {
    for child in children {
        let child_parent = child.parent.load_full();
        let already_below = child_parent
            .as_ref()
            .map_or(false, |p| p.name.len() > node.name.len() && p.name.starts_with(&node.name));
        if !already_below {
            node.parent.store(child_parent);
            child.parent.store(Some(node.clone()));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_is_idempotent() {
        let hierarchy = Hierarchy::new();
        let first = hierarchy.get("a.b");
        let second = hierarchy.get("a.b");
        assert!(Arc::ptr_eq(first.node(), second.node()));
    }

    #[test]
    fn exists_and_current_loggers() {
        let hierarchy = Hierarchy::new();
        assert!(hierarchy.exists(""));
        assert!(!hierarchy.exists("a"));

        hierarchy.get("a");
        hierarchy.get("a.b");
        assert!(hierarchy.exists("a"));
        assert!(hierarchy.exists("a.b"));

        let names: Vec<String> = hierarchy
            .current_loggers()
            .iter()
            .map(|l| l.name().to_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&String::new()));
    }

    #[test]
    fn in_order_creation_links_parents() {
        let hierarchy = Hierarchy::new();
        let a = hierarchy.get("a");
        let ab = hierarchy.get("a.b");
        let abc = hierarchy.get("a.b.c");

        assert!(Arc::ptr_eq(abc.parent().unwrap().node(), ab.node()));
        assert!(Arc::ptr_eq(ab.parent().unwrap().node(), a.node()));
        assert!(Arc::ptr_eq(
            a.parent().unwrap().node(),
            hierarchy.root().node()
        ));
    }

    #[test]
    fn skipped_generations_link_to_nearest_ancestor() {
        let hierarchy = Hierarchy::new();
        let a = hierarchy.get("a");
        let abc = hierarchy.get("a.b.c");
        // "a.b" was never materialized.
        assert!(Arc::ptr_eq(abc.parent().unwrap().node(), a.node()));
    }

    #[test]
    fn provision_node_rewires_late_ancestor() {
        let hierarchy = Hierarchy::new();
        let xyz = hierarchy.get("x.y.z");
        assert!(Arc::ptr_eq(
            xyz.parent().unwrap().node(),
            hierarchy.root().node()
        ));

        let x = hierarchy.get("x");
        // The child chain now reaches "x" with no intervening real node.
        assert!(Arc::ptr_eq(xyz.parent().unwrap().node(), x.node()));
        assert!(Arc::ptr_eq(
            x.parent().unwrap().node(),
            hierarchy.root().node()
        ));

        // Materializing the middle name rewires only the deeper child.
        let xy = hierarchy.get("x.y");
        assert!(Arc::ptr_eq(xyz.parent().unwrap().node(), xy.node()));
        assert!(Arc::ptr_eq(xy.parent().unwrap().node(), x.node()));
    }

    #[test]
    fn effective_level_inheritance() {
        let hierarchy = Hierarchy::new();
        hierarchy.root().set_level(LogLevel::WARN);
        let ab = hierarchy.get("a.b");
        assert_eq!(ab.effective_level(), LogLevel::WARN);

        // Materializing "a" with an explicit level changes the chain.
        hierarchy.get("a").set_level(LogLevel::DEBUG);
        assert_eq!(ab.effective_level(), LogLevel::DEBUG);
        assert_eq!(hierarchy.get("a.b.c").effective_level(), LogLevel::DEBUG);

        ab.set_level(LogLevel::ERROR);
        assert_eq!(ab.effective_level(), LogLevel::ERROR);
    }

    #[test]
    fn late_ancestor_enables_dropped_events() {
        // Root at WARN, "a.b" inherited: INFO from "a.b.c" is dropped until
        // a DEBUG-level "a" materializes.
        let hierarchy = Hierarchy::new();
        hierarchy.root().set_level(LogLevel::WARN);
        hierarchy.get("a.b");
        let abc = hierarchy.get("a.b.c");
        assert!(!abc.is_enabled_for(LogLevel::INFO));

        hierarchy.get("a").set_level(LogLevel::DEBUG);
        assert!(abc.is_enabled_for(LogLevel::INFO));
    }

    #[test]
    fn disable_watermark() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get("w");
        assert!(logger.is_enabled_for(LogLevel::INFO));

        hierarchy.disable(LogLevel::INFO);
        assert!(!logger.is_enabled_for(LogLevel::INFO));
        assert!(!logger.is_enabled_for(LogLevel::DEBUG));
        assert!(logger.is_enabled_for(LogLevel::WARN));

        hierarchy.disable_all();
        assert!(!logger.is_enabled_for(LogLevel::FATAL));

        hierarchy.enable_all();
        assert!(logger.is_enabled_for(LogLevel::INFO));
    }

    #[test]
    fn disable_off_silences_everything() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get("w");
        hierarchy.disable(LogLevel::OFF);
        assert!(!logger.is_enabled_for(LogLevel::FATAL));
        hierarchy.enable_all();
        assert!(logger.is_enabled_for(LogLevel::FATAL));
    }

    #[test]
    fn pinned_watermark_ignores_later_disables() {
        let hierarchy = Hierarchy::new();
        hierarchy.disable(LogLevel::DISABLE_OVERRIDE);
        hierarchy.disable(LogLevel::OFF);
        // The pin itself disables nothing.
        assert!(!hierarchy.is_disabled(LogLevel::TRACE));

        hierarchy.enable_all();
        hierarchy.disable(LogLevel::INFO);
        assert!(hierarchy.is_disabled(LogLevel::INFO));
    }

    #[test]
    fn reset_configuration_restores_defaults() {
        let hierarchy = Hierarchy::new();
        hierarchy.root().set_level(LogLevel::ERROR);
        hierarchy.get("a").set_level(LogLevel::TRACE);
        hierarchy.disable(LogLevel::OFF);

        hierarchy.reset_configuration();

        assert_eq!(hierarchy.root().level(), LogLevel::DEBUG);
        assert_eq!(hierarchy.get("a").level(), LogLevel::NOT_SET);
        assert!(!hierarchy.is_disabled(LogLevel::TRACE));
    }

    #[test]
    fn clear_forgets_loggers() {
        let hierarchy = Hierarchy::new();
        hierarchy.get("a.b");
        hierarchy.clear();
        assert!(!hierarchy.exists("a.b"));
        assert!(hierarchy.current_loggers().is_empty());
    }
}
