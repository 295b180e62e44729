//! De-duplication hook module.
//!
//! Rejects registration of an action, calculation or side-effect name that
//! already exists on the instance, using the instance surface's existence
//! queries. The second registration never replaces the first.

use settle_core::{Batch, BoxError, HookContext, Hooks, UnitKind};
use thiserror::Error;

/// Raised when a batch carries a name that is already registered.
#[derive(Error, Debug)]
#[error("Attempt to add an existing {kind} '{name}' to {instance}")]
pub struct DuplicateError {
    /// The unit kind.
    pub kind: &'static str,
    /// The duplicate name.
    pub name: String,
    /// Diagnostic label of the instance.
    pub instance: String,
}

/// The de-duplication module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dedupe;

fn check_batch(ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
    for entry in &batch.entries {
        let exists = match batch.kind {
            UnitKind::Action => ctx.surface.has_action(entry.name),
            UnitKind::Calculation => ctx.surface.has_calculation(entry.name),
            UnitKind::SideEffect => ctx.surface.has_side_effect(entry.name),
        };
        if exists {
            return Err(DuplicateError {
                kind: batch.kind.singular(),
                name: entry.name.to_string(),
                instance: ctx.label.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

impl<S> Hooks<S> for Dedupe {
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

#[cfg(test)]
mod tests {
    use super::*;
    use settle_core::{Action, Actions, Calculation, Calculations, Settle, SideEffect, SideEffects};
    use std::sync::Arc;

    #[test]
    fn existing_action_name_is_rejected() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Dedupe);
        settle
            .register_actions(Actions::new().add("existing", Action::new(|_: &(), s: &Arc<i32>| s.clone())))
            .unwrap();

        let err = settle
            .register_actions(Actions::new().add("existing", Action::new(|_: &(), s: &Arc<i32>| s.clone())))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to add an existing action 'existing' to settle:(anon)"
        );
    }

    #[test]
    fn first_registration_survives_a_rejected_duplicate() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Dedupe);
        settle.set_state(0).unwrap();
        settle
            .register_actions(Actions::new().add("value", Action::new(|_: &(), _| Arc::new(1))))
            .unwrap();

        settle
            .register_actions(Actions::new().add("value", Action::new(|_: &(), _| Arc::new(2))))
            .unwrap_err();

        settle.dispatch("value", ()).unwrap();
        assert_eq!(*settle.current_state().unwrap(), 1);
    }

    #[test]
    fn existing_calculation_name_is_rejected() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Dedupe);
        settle
            .register_calculations(
                Calculations::new().add("carry", Calculation::new(|prior: &Arc<i32>, _| prior.clone())),
            )
            .unwrap();

        let err = settle
            .register_calculations(
                Calculations::new().add("carry", Calculation::new(|prior: &Arc<i32>, _| prior.clone())),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to add an existing calculation 'carry' to settle:(anon)"
        );
    }

    #[test]
    fn existing_side_effect_name_is_rejected_with_hyphenated_noun() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Dedupe);
        settle
            .register_side_effects(SideEffects::new().add("render", SideEffect::new(|_, _, _| {})))
            .unwrap();

        let err = settle
            .register_side_effects(SideEffects::new().add("render", SideEffect::new(|_, _, _| {})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to add an existing side-effect 'render' to settle:(anon)"
        );
    }
}
