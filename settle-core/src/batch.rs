//! Named batches of units for registration.
//!
//! A batch preserves the order its entries were added in; that order becomes
//! the execution order of calculations and side effects, concatenated across
//! batches. Requirement declarations are only checked against strictly
//! earlier batches, so units that depend on each other must be registered in
//! separate calls.

use crate::dispatch::Dispatcher;
use crate::instance::Settle;
use crate::unit::{Action, Calculation, SideEffect};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Builds a boxed, payload-type-erased dispatcher once the owning instance
/// and final name are known.
pub(crate) type InstallDispatcher<S> =
    Box<dyn FnOnce(&Settle<S>, &str) -> Box<dyn Any + Send + Sync> + Send>;

/// A named batch of actions.
///
/// Each action may carry its own payload type; the type is erased here and
/// recovered by [`Settle::dispatcher`](crate::Settle::dispatcher) lookups.
pub struct Actions<S> {
    pub(crate) entries: Vec<(String, InstallDispatcher<S>)>,
}

impl<S: Send + Sync + 'static> Actions<S> {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an action under `name`.
    pub fn add<P>(mut self, name: impl Into<String>, action: Action<S, P>) -> Self
    where
        P: fmt::Debug + Send + Sync + 'static,
    {
        let install: InstallDispatcher<S> = Box::new(move |instance, name| {
            Box::new(Dispatcher::new(instance.clone(), name, Arc::new(action)))
        });
        self.entries.push((name.into(), install));
        self
    }
}

impl<S: Send + Sync + 'static> Default for Actions<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A named batch of calculations.
pub struct Calculations<S> {
    pub(crate) entries: Vec<(String, Calculation<S>)>,
}

impl<S> Calculations<S> {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a calculation under `name`.
    pub fn add(mut self, name: impl Into<String>, calculation: Calculation<S>) -> Self {
        self.entries.push((name.into(), calculation));
        self
    }
}

impl<S> Default for Calculations<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A named batch of side effects.
pub struct SideEffects<S> {
    pub(crate) entries: Vec<(String, SideEffect<S>)>,
}

impl<S> SideEffects<S> {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a side effect under `name`.
    pub fn add(mut self, name: impl Into<String>, side_effect: SideEffect<S>) -> Self {
        self.entries.push((name.into(), side_effect));
        self
    }
}

impl<S> Default for SideEffects<S> {
    fn default() -> Self {
        Self::new()
    }
}
