//! App state - the reactive nested store
//!
//! Values live in a `serde_json::Value` tree addressed by dotted paths.
//! Reads hand out deep copies; writes notify listeners on the written path
//! and on every ancestor path, synchronously and in registration order.

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::app::registry::{Listener, Registry};
use crate::host::{Host, NoopHost};
use crate::models::{StateChange, SubscriptionId};
use crate::path::StatePath;

/// Main application state - one per running session
pub struct AppState {
    tree: Value,
    registry: Registry,
    host: Box<dyn Host>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_host(Box::new(NoopHost))
    }

    /// Store attached to a host event object
    pub fn with_host(host: Box<dyn Host>) -> Self {
        AppState {
            tree: Value::Object(Map::new()),
            registry: Registry::new(),
            host,
        }
    }

    /// Deep copy of the value at `path`, `None` if absent or malformed
    pub fn get(&self, path: &str) -> Option<Value> {
        let path = StatePath::parse(path).ok()?;
        lookup(&self.tree, &path).cloned()
    }

    /// Deep copy of the whole tree
    pub fn snapshot(&self) -> Value {
        self.tree.clone()
    }

    /// Write `value` at `path`, notifying listeners only if it differs from what is stored
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.write(path, value.into(), false)
    }

    /// Write `value` at `path` and notify listeners unconditionally
    pub fn dispatch(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.write(path, value.into(), true)
    }

    /// Subscribe to writes at `path` or any path below it
    pub fn on<F>(&mut self, path: &str, listener: F) -> Result<SubscriptionId>
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        let parsed = StatePath::parse(path)?;
        let boxed: Listener = Box::new(listener);
        let id = self.registry.add(&parsed.to_string(), boxed);
        tracing::debug!(%id, path, "Listener registered");
        Ok(id)
    }

    /// Unsubscribe, returns false if the id was unknown
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let removed = self.registry.remove(id);
        tracing::debug!(%id, removed, "Listener removed");
        removed
    }

    pub fn listener_count(&self, path: &str) -> usize {
        self.registry.count(path)
    }

    fn write(&mut self, path: &str, value: Value, forced: bool) -> Result<()> {
        let target = StatePath::parse(path)?;
        let previous = lookup(&self.tree, &target).cloned();

        if !forced && previous.as_ref().is_some_and(|old| values_equal(old, &value)) {
            tracing::trace!(path, "Value unchanged, skipping notification");
            return Ok(());
        }

        // Exact path first, then ancestors nearest to root
        let watched: Vec<StatePath> = std::iter::once(target.clone())
            .chain(target.ancestors())
            .filter(|p| self.registry.has_listeners(&p.to_string()))
            .collect();
        let before: Vec<Option<Value>> = watched
            .iter()
            .map(|p| lookup(&self.tree, p).cloned())
            .collect();

        insert(&mut self.tree, &target, value);
        tracing::debug!(path, forced, listeners = watched.len(), "State written");

        let at = Utc::now();
        let origin = target.to_string();

        let new_exact = lookup(&self.tree, &target).cloned().unwrap_or(Value::Null);
        let host_change = StateChange {
            path: origin.clone(),
            origin: origin.clone(),
            old_value: if forced { Some(new_exact.clone()) } else { previous },
            new_value: new_exact,
            forced,
            at,
        };
        self.host.state_changed(&host_change);

        for (watched_path, old) in watched.into_iter().zip(before) {
            let new_value = lookup(&self.tree, &watched_path)
                .cloned()
                .unwrap_or(Value::Null);
            let change = StateChange {
                path: watched_path.to_string(),
                origin: origin.clone(),
                old_value: if forced { Some(new_value.clone()) } else { old },
                new_value,
                forced,
                at,
            };
            self.notify(&change);
        }

        Ok(())
    }

    /// Run every listener at `change.path`; a panicking listener does not stop the rest
    fn notify(&mut self, change: &StateChange) {
        for (id, listener) in self.registry.listeners_mut(&change.path) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(change)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                tracing::error!(%id, path = %change.path, %message, "State listener panicked");
                self.host.listener_failed(&change.path, &message);
            }
        }
    }
}

fn lookup<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Write `value` at `path`, creating or overwriting intermediate mappings
fn insert(root: &mut Value, path: &StatePath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.clone(), value);
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

/// Deep equality where numbers compare by value, so `1920` equals `1920.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("listener panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<StateChange>>>, impl FnMut(&StateChange) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |c: &StateChange| sink.lock().unwrap().push(c.clone()))
    }

    #[test]
    fn test_set_builds_nested_tree() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        assert_eq!(state.snapshot(), json!({"foo": {"bar": 1}}));
        assert_eq!(state.get("foo.bar"), Some(json!(1)));
    }

    #[test]
    fn test_get_unknown_path_is_none() {
        let mut state = AppState::new();
        assert_eq!(state.get("nope"), None);
        state.set("foo.bar", 1).unwrap();
        assert_eq!(state.get("foo.bar.baz"), None);
        assert_eq!(state.get("foo..bar"), None);
    }

    #[test]
    fn test_set_then_get_roundtrips_structures() {
        let mut state = AppState::new();
        let value = json!({"stages": [{"name": "Main Stage"}], "duration": 1920.0});
        state.set("program", value.clone()).unwrap();
        assert_eq!(state.get("program"), Some(value));
    }

    #[test]
    fn test_listener_receives_new_and_old() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        let (seen, cb) = recorder();
        state.on("foo.bar", cb).unwrap();
        state.set("foo.bar", 2).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].new_value, json!(2));
        assert_eq!(seen[0].old_value, Some(json!(1)));
        assert_eq!(seen[0].path, "foo.bar");
        assert!(!seen[0].forced);
    }

    #[test]
    fn test_ancestor_listener_gets_subtree() {
        let mut state = AppState::new();
        let (foo_seen, foo_cb) = recorder();
        let (bar_seen, bar_cb) = recorder();
        state.on("foo", foo_cb).unwrap();
        state.on("foo.bar", bar_cb).unwrap();
        state.set("foo.bar", 1).unwrap();

        let foo_seen = foo_seen.lock().unwrap();
        assert_eq!(foo_seen.len(), 1);
        assert_eq!(foo_seen[0].path, "foo");
        assert_eq!(foo_seen[0].origin, "foo.bar");
        assert_eq!(foo_seen[0].new_value, json!({"bar": 1}));
        assert_eq!(foo_seen[0].old_value, None);
        assert!(!foo_seen[0].is_exact());

        let bar_seen = bar_seen.lock().unwrap();
        assert_eq!(bar_seen.len(), 1);
        assert_eq!(bar_seen[0].new_value, json!(1));
        assert_eq!(bar_seen[0].old_value, None);
        assert!(bar_seen[0].is_exact());
    }

    #[test]
    fn test_ancestor_old_value_is_previous_subtree() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        state.set("foo.baz", true).unwrap();
        let (seen, cb) = recorder();
        state.on("foo", cb).unwrap();
        state.set("foo.bar", 2).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].old_value, Some(json!({"bar": 1, "baz": true})));
        assert_eq!(seen[0].new_value, json!({"bar": 2, "baz": true}));
    }

    #[test]
    fn test_descendant_listener_not_notified() {
        let mut state = AppState::new();
        let (seen, cb) = recorder();
        state.on("foo.bar", cb).unwrap();
        state.set("foo", json!({"bar": 1})).unwrap();
        state.set("food", 1).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_same_value_does_not_notify() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        let (seen, cb) = recorder();
        state.on("foo.bar", cb).unwrap();
        state.set("foo.bar", 1).unwrap();
        state.set("foo.bar", json!(1)).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_deep_equal_structure_does_not_notify() {
        let mut state = AppState::new();
        state.set("camera", json!({"type": "Orbit", "speed": [1, 2]})).unwrap();
        let (seen, cb) = recorder();
        state.on("camera", cb).unwrap();
        state.set("camera", json!({"speed": [1, 2], "type": "Orbit"})).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_always_notifies() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        let (seen, cb) = recorder();
        state.on("foo.bar", cb).unwrap();
        state.dispatch("foo.bar", 1).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].old_value.as_ref(), Some(&seen[0].new_value));
        assert!(seen[0].forced);
    }

    #[test]
    fn test_integer_and_float_of_same_number_are_equal() {
        let mut state = AppState::new();
        state.set("program.duration", 1920.0).unwrap();
        let (seen, cb) = recorder();
        state.on("program.duration", cb).unwrap();

        state.set("program.duration", json!(1920)).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        state.set("program.duration", json!(1921)).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_values_equal_compares_structure() {
        assert!(values_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!values_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2, 3]})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"b": 1})));
        assert!(!values_equal(&json!("1"), &json!(1)));
        assert!(values_equal(&Value::Null, &Value::Null));
    }

    #[test]
    fn test_dispatch_over_different_value_reports_new_as_old() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        let (foo_seen, foo_cb) = recorder();
        let (bar_seen, bar_cb) = recorder();
        state.on("foo", foo_cb).unwrap();
        state.on("foo.bar", bar_cb).unwrap();

        state.dispatch("foo.bar", 2).unwrap();

        let bar_seen = bar_seen.lock().unwrap();
        assert_eq!(bar_seen.len(), 1);
        assert_eq!(bar_seen[0].new_value, json!(2));
        assert_eq!(bar_seen[0].old_value, Some(json!(2)));
        assert!(bar_seen[0].forced);

        let foo_seen = foo_seen.lock().unwrap();
        assert_eq!(foo_seen.len(), 1);
        assert_eq!(foo_seen[0].new_value, json!({"bar": 2}));
        assert_eq!(foo_seen[0].old_value, Some(json!({"bar": 2})));
        assert_eq!(foo_seen[0].origin, "foo.bar");
        assert!(foo_seen[0].forced);
    }

    #[test]
    fn test_dispatch_stores_value() {
        let mut state = AppState::new();
        state.set("narrative", "intro").unwrap();
        state.dispatch("narrative", "finale").unwrap();
        assert_eq!(state.get("narrative"), Some(json!("finale")));
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let mut state = AppState::new();
        state.set("foo.bar", json!({"baz": 1})).unwrap();
        let mut value = state.get("foo.bar").unwrap();
        value["baz"] = json!(2);
        assert_eq!(state.get("foo.bar.baz"), Some(json!(1)));
    }

    #[test]
    fn test_listener_order_matches_registration() {
        let mut state = AppState::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            state.on("time", move |_| order.lock().unwrap().push(n)).unwrap();
        }
        state.set("time", 10).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_exact_path_notified_before_ancestors() {
        let mut state = AppState::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for path in ["a", "a.b", "a.b.c"] {
            let order = Arc::clone(&order);
            state
                .on(path, move |c| order.lock().unwrap().push(c.path.clone()))
                .unwrap();
        }
        state.set("a.b.c", 1).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a.b.c", "a.b", "a"]);
    }

    #[test]
    fn test_scalar_intermediate_is_overwritten() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        state.set("foo.bar.baz", 2).unwrap();
        assert_eq!(state.snapshot(), json!({"foo": {"bar": {"baz": 2}}}));
    }

    #[test]
    fn test_no_replay_on_registration() {
        let mut state = AppState::new();
        state.set("time", 5).unwrap();
        let (seen, cb) = recorder();
        state.on("time", cb).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_off_stops_notifications() {
        let mut state = AppState::new();
        let (seen, cb) = recorder();
        let id = state.on("time", cb).unwrap();
        state.set("time", 1).unwrap();
        assert!(state.off(id));
        state.set("time", 2).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(state.listener_count("time"), 0);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let mut state = AppState::new();
        state.on("time", |_| panic!("boom")).unwrap();
        let (seen, cb) = recorder();
        state.on("time", cb).unwrap();

        assert!(state.set("time", 1).is_ok());
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(state.get("time"), Some(json!(1)));
    }

    #[test]
    fn test_malformed_path_is_rejected() {
        let mut state = AppState::new();
        assert!(state.set("", 1).is_err());
        assert!(state.dispatch("a..b", 1).is_err());
        assert!(state.on("a.", |_| {}).is_err());
        assert_eq!(state.snapshot(), json!({}));
    }

    #[derive(Clone, Default)]
    struct RecordingHost {
        changes: Arc<Mutex<Vec<String>>>,
        failures: Arc<Mutex<Vec<String>>>,
    }

    impl Host for RecordingHost {
        fn state_changed(&self, change: &StateChange) {
            self.changes.lock().unwrap().push(change.origin.clone());
        }

        fn listener_failed(&self, path: &str, message: &str) {
            self.failures.lock().unwrap().push(format!("{path}: {message}"));
        }
    }

    #[test]
    fn test_host_observes_writes_and_failures() {
        let host = RecordingHost::default();
        let mut state = AppState::with_host(Box::new(host.clone()));
        state.on("stage", |_| panic!("bad listener")).unwrap();

        state.set("stage", "Main Stage").unwrap();
        state.set("stage", "Main Stage").unwrap();
        state.dispatch("stage", "Main Stage").unwrap();

        assert_eq!(*host.changes.lock().unwrap(), vec!["stage", "stage"]);
        assert_eq!(
            *host.failures.lock().unwrap(),
            vec!["stage: bad listener", "stage: bad listener"]
        );
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut state = AppState::new();
        state.set("foo.bar", 1).unwrap();
        assert_eq!(state.snapshot(), json!({"foo": {"bar": 1}}));

        let (seen, cb) = recorder();
        state.on("foo.bar", cb).unwrap();
        state.set("foo.bar", 2).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            (&seen[0].new_value, seen[0].old_value.as_ref(), seen[0].path.as_str()),
            (&json!(2), Some(&json!(1)), "foo.bar")
        );
    }
}
