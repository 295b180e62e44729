//! Testing utilities.
//!
//! - [`RecordingHooks`]: a hook module that records every hook point it is
//!   fired at, in order.
//! - [`CountingEffect`]: a counter backing a side-effect unit, for asserting
//!   how often the notification chain ran.

use settle_core::{
    ActionEvent, Batch, BoxError, CalculationEvent, ChainEvent, DispatchEvent, HookContext, Hooks,
    PostHook, SideEffect, SideEffectEvent,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A hook module recording the names of the hook points fired on it.
///
/// Clones share the same recording, so a test can keep one handle and
/// subscribe another.
pub struct RecordingHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingHooks {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The recorded hook point names, in firing order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// The number of recorded firings.
    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Clear the recording.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, point: impl Into<String>) {
        self.events.lock().unwrap().push(point.into());
    }
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RecordingHooks {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> Hooks<S> for RecordingHooks {
    fn register_state(&self, _ctx: &HookContext<'_>) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        self.record("register_state");
        Ok(None)
    }

    fn register_actions(&self, _ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
        self.record(format!("register_actions:{}", batch.joined_names()));
        Ok(())
    }

    fn register_action(&self, _ctx: &HookContext<'_>, name: &str) -> Result<(), BoxError> {
        self.record(format!("register_action:{name}"));
        Ok(())
    }

    fn register_dispatcher(
        &self,
        _ctx: &HookContext<'_>,
        name: &str,
        _dispatcher: &(dyn Any + Send + Sync),
    ) -> Result<(), BoxError> {
        self.record(format!("register_dispatcher:{name}"));
        Ok(())
    }

    fn register_calculations(
        &self,
        _ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        self.record(format!("register_calculations:{}", batch.joined_names()));
        Ok(())
    }

    fn register_side_effects(
        &self,
        _ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        self.record(format!("register_side_effects:{}", batch.joined_names()));
        Ok(())
    }

    fn dispatch(
        &self,
        _ctx: &HookContext<'_>,
        event: &DispatchEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        self.record(format!("dispatch:{}", event.action));
        let recorder = self.clone();
        Ok(Some(Box::new(move |state| {
            recorder.record("dispatch:post");
            Ok(state)
        })))
    }

    fn action(
        &self,
        _ctx: &HookContext<'_>,
        event: &ActionEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        self.record(format!("action:{}", event.action));
        Ok(None)
    }

    fn calculations(
        &self,
        _ctx: &HookContext<'_>,
        _event: &ChainEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        self.record("calculations");
        Ok(None)
    }

    fn calculation(
        &self,
        _ctx: &HookContext<'_>,
        event: &CalculationEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        self.record(format!("calculation:{}", event.name));
        Ok(None)
    }

    fn side_effects(
        &self,
        _ctx: &HookContext<'_>,
        _event: &ChainEvent<'_, S>,
    ) -> Result<(), BoxError> {
        self.record("side_effects");
        Ok(())
    }

    fn side_effect(
        &self,
        _ctx: &HookContext<'_>,
        event: &SideEffectEvent<'_, S>,
    ) -> Result<(), BoxError> {
        self.record(format!("side_effect:{}", event.name));
        Ok(())
    }
}

/// A shared counter wrapped as a side-effect unit.
pub struct CountingEffect {
    calls: Arc<AtomicUsize>,
}

impl CountingEffect {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times the side effect ran.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Build the side-effect unit. May be called more than once; all units
    /// feed the same counter.
    pub fn unit<S: Send + Sync + 'static>(&self) -> SideEffect<S> {
        let calls = Arc::clone(&self.calls);
        SideEffect::new(move |_, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }
}

impl Default for CountingEffect {
    fn default() -> Self {
        Self::new()
    }
}
