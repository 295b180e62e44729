//! State validation hook module.
//!
//! Runs a caller-supplied validator over every state an instance is about to
//! accept: the initial state, the output of each action, and the output of
//! each calculation that actually produced a new state. A failing validator
//! aborts the operation before the bad state can be committed.

use settle_core::{ActionEvent, BoxError, CalculationEvent, HookContext, Hooks, PostHook};
use std::sync::Arc;
use thiserror::Error;

/// Convenience error type for validators that only have a message to report.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct InvalidState(pub String);

impl InvalidState {
    /// Build a validator failure from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The validation module.
///
/// The validator runs against the initial state and against every state
/// produced by an action or calculation. States a unit passed through
/// untouched are not re-validated.
pub struct Validation<S> {
    validator: Arc<dyn Fn(&S) -> Result<(), BoxError> + Send + Sync>,
}

impl<S> Validation<S> {
    /// Wrap `validator` as a hook module.
    pub fn new(validator: impl Fn(&S) -> Result<(), BoxError> + Send + Sync + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }

    fn post(&self) -> PostHook<Arc<S>>
    where
        S: Send + Sync + 'static,
    {
        let validator = Arc::clone(&self.validator);
        Box::new(move |state: Arc<S>| {
            validator(&state)?;
            Ok(state)
        })
    }

    fn post_if_changed(&self, baseline: &Arc<S>) -> PostHook<Arc<S>>
    where
        S: Send + Sync + 'static,
    {
        let validator = Arc::clone(&self.validator);
        let baseline = Arc::clone(baseline);
        Box::new(move |state: Arc<S>| {
            if !Arc::ptr_eq(&state, &baseline) {
                validator(&state)?;
            }
            Ok(state)
        })
    }
}

impl<S: Send + Sync + 'static> Hooks<S> for Validation<S> {
    fn register_state(
        &self,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(Some(self.post()))
    }

    fn action(
        &self,
        _ctx: &HookContext<'_>,
        event: &ActionEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(Some(self.post_if_changed(event.start)))
    }

    fn calculation(
        &self,
        _ctx: &HookContext<'_>,
        event: &CalculationEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(Some(self.post_if_changed(event.prior)))
    }
}
