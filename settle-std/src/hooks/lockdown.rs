//! Lockdown hook module.
//!
//! Freezes an instance's shape on its first dispatch: once any action has
//! been dispatched, further state initialisation and registration of actions,
//! calculations or side effects is refused. The flag lives in the shared hook
//! scratch so other modules can observe it.

use settle_core::{Batch, BoxError, DispatchEvent, HookContext, Hooks, PostHook};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use thiserror::Error;

/// Raised when registration or state-setting happens after the first
/// dispatch.
#[derive(Error, Debug)]
pub enum LockdownError {
    /// State was set after the first dispatch.
    #[error("Attempt to set state of {instance} after the first action was dispatched")]
    State {
        /// Diagnostic label of the instance.
        instance: String,
    },

    /// Units were registered after the first dispatch.
    #[error("Attempt to add {kind} {names} to {instance} after the first action was dispatched")]
    Register {
        /// The unit kind, plural.
        kind: &'static str,
        /// The names the rejected batch carried.
        names: String,
        /// Diagnostic label of the instance.
        instance: String,
    },
}

/// The lockdown module. Subscribe it before dispatching anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lockdown;

fn check_batch(ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
    if ctx.shared.lockdown.load(Ordering::SeqCst) {
        return Err(LockdownError::Register {
            kind: batch.kind.plural(),
            names: batch.joined_names(),
            instance: ctx.label.to_string(),
        }
        .into());
    }
    Ok(())
}

impl<S> Hooks<S> for Lockdown {
    fn dispatch(
        &self,
        ctx: &HookContext<'_>,
        _event: &DispatchEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        ctx.shared.lockdown.store(true, Ordering::SeqCst);
        Ok(None)
    }

    fn register_state(&self, ctx: &HookContext<'_>) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        if ctx.shared.lockdown.load(Ordering::SeqCst) {
            return Err(LockdownError::State {
                instance: ctx.label.to_string(),
            }
            .into());
        }
        Ok(None)
    }

    fn register_actions(&self, ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
        check_batch(ctx, batch)
    }

    fn register_calculations(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        check_batch(ctx, batch)
    }

    fn register_side_effects(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        check_batch(ctx, batch)
    }
}
