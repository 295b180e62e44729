//! Named-instance registry.
//!
//! An explicit registry owned by the composition root, instead of a global
//! table. Asking for the same name twice yields the same instance; anonymous
//! instances are never retained.

use crate::instance::Settle;
use std::collections::HashMap;
use std::sync::Mutex;

/// A singleton-by-name registry of [`Settle`] instances sharing one state
/// type.
pub struct Instances<S> {
    table: Mutex<HashMap<String, Settle<S>>>,
}

impl<S: Send + Sync + 'static> Instances<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Return the instance registered under `name`, constructing and
    /// registering a fresh one if the slot is free.
    pub fn named(&self, name: &str) -> Settle<S> {
        let mut table = self.table.lock().unwrap();
        if let Some(existing) = table.get(name) {
            return existing.clone();
        }
        let instance = Settle::new();
        instance.set_name(name);
        table.insert(name.to_string(), instance.clone());
        instance
    }

    /// Construct a fresh anonymous instance. Every call returns a new one.
    pub fn anonymous(&self) -> Settle<S> {
        Settle::new()
    }

    /// Whether an instance is registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.table.lock().unwrap().contains_key(name)
    }

    /// Forget the instance registered under `name`, freeing the name for
    /// reuse.
    ///
    /// The instance is anonymised but keeps functioning: registrations and
    /// dispatches still work, it just can never be found under its old name
    /// again.
    pub fn remove(&self, name: &str) -> Option<Settle<S>> {
        let removed = self.table.lock().unwrap().remove(name);
        if let Some(instance) = &removed {
            instance.clear_name();
        }
        removed
    }
}

impl<S: Send + Sync + 'static> Default for Instances<S> {
    fn default() -> Self {
        Self::new()
    }
}
