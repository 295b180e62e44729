//! Logging hook module.
//!
//! Emits `tracing` events for registrations, dispatch cycles and individual
//! unit calls. Each category can be switched off independently; a disabled
//! category is silent, the points are still traversed.

use settle_core::{
    ActionEvent, Batch, BoxError, CalculationEvent, DispatchEvent, HookContext, Hooks, PostHook,
    SideEffectEvent,
};
use std::fmt;
use std::sync::Arc;

/// The logging module.
#[derive(Debug, Clone, Copy)]
pub struct Logging {
    /// Log registration of state, actions, calculations and side effects.
    pub registrations: bool,
    /// Log the start and committed end of every enabled dispatch cycle.
    pub dispatches: bool,
    /// Log each enabled calculation and side-effect call.
    pub calls: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            registrations: true,
            dispatches: true,
            calls: true,
        }
    }
}

impl Logging {
    /// Log everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Log only dispatch cycles.
    pub fn dispatches_only() -> Self {
        Self {
            registrations: false,
            dispatches: true,
            calls: false,
        }
    }
}

impl<S: fmt::Debug + Send + Sync + 'static> Hooks<S> for Logging {
    fn register_state(&self, ctx: &HookContext<'_>) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        if self.registrations {
            tracing::debug!(target: "settle", instance = %ctx.label, "register state");
        }
        Ok(None)
    }

    fn register_actions(&self, ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
        if self.registrations {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                names = %batch.joined_names(),
                "register actions"
            );
        }
        Ok(())
    }

    fn register_calculations(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        if self.registrations {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                names = %batch.joined_names(),
                "register calculations"
            );
        }
        Ok(())
    }

    fn register_side_effects(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        if self.registrations {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                names = %batch.joined_names(),
                "register side effects"
            );
        }
        Ok(())
    }

    fn dispatch(
        &self,
        ctx: &HookContext<'_>,
        event: &DispatchEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        if !self.dispatches {
            return Ok(None);
        }
        if !event.enable {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                action = %event.action,
                "dispatch skipped by guard"
            );
            return Ok(None);
        }
        tracing::info!(
            target: "settle",
            instance = %ctx.label,
            action = %event.action,
            args = ?event.args,
            start = ?event.start,
            "dispatch"
        );
        let label = ctx.label.to_string();
        let action = event.action.to_string();
        Ok(Some(Box::new(move |state: Arc<S>| {
            tracing::info!(
                target: "settle",
                instance = %label,
                action = %action,
                state = ?state,
                "settled"
            );
            Ok(state)
        })))
    }

    fn action(
        &self,
        ctx: &HookContext<'_>,
        event: &ActionEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        if self.calls {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                action = %event.action,
                args = ?event.args,
                "action"
            );
        }
        Ok(None)
    }

    fn calculation(
        &self,
        ctx: &HookContext<'_>,
        event: &CalculationEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        if self.calls && event.enable {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                action = %event.action,
                calculation = %event.name,
                "calculation"
            );
        }
        Ok(None)
    }

    fn side_effect(
        &self,
        ctx: &HookContext<'_>,
        event: &SideEffectEvent<'_, S>,
    ) -> Result<(), BoxError> {
        if self.calls && event.enable {
            tracing::debug!(
                target: "settle",
                instance = %ctx.label,
                action = %event.action,
                side_effect = %event.name,
                state = ?event.locked,
                "side effect"
            );
        }
        Ok(())
    }
}
