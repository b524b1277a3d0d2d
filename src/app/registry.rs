//! Subscription registry - ordered listeners per path

use std::collections::HashMap;

use crate::models::{StateChange, SubscriptionId};

/// Listener callback
pub type Listener = Box<dyn FnMut(&StateChange) + Send + 'static>;

struct Entry {
    id: SubscriptionId,
    listener: Listener,
}

/// Listeners keyed by the path string they were registered at
#[derive(Default)]
pub struct Registry {
    by_path: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; ids increase monotonically and are never reused
    pub fn add(&mut self, path: &str, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.by_path
            .entry(path.to_string())
            .or_default()
            .push(Entry { id, listener });
        id
    }

    /// Remove a listener by id, returns true if it existed
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let mut emptied = None;
        let mut found = false;

        for (path, entries) in self.by_path.iter_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                found = true;
                if entries.is_empty() {
                    emptied = Some(path.clone());
                }
                break;
            }
        }

        if let Some(path) = emptied {
            self.by_path.remove(&path);
        }
        found
    }

    pub fn has_listeners(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn count(&self, path: &str) -> usize {
        self.by_path.get(path).map_or(0, Vec::len)
    }

    /// Listeners at `path` in registration order
    pub fn listeners_mut(
        &mut self,
        path: &str,
    ) -> impl Iterator<Item = (SubscriptionId, &mut Listener)> + '_ {
        self.by_path
            .get_mut(path)
            .into_iter()
            .flat_map(|entries| entries.iter_mut().map(|e| (e.id, &mut e.listener)))
    }
}
