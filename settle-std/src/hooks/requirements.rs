//! Requirements hook module.
//!
//! Calculations and side effects may declare that they depend on other
//! calculations or side effects; this module fails the registration fast if a
//! required name has not been registered yet. It does not resolve or reorder
//! dependencies; execution order is always registration order.
//!
//! Requirements are checked against the registered-names index in the shared
//! scratch, which the engine updates only after a batch's bulk hook has run.
//! A required name must therefore come from a strictly earlier registration
//! call; same-batch siblings are not visible to each other. Units that depend
//! on one another belong in separate batches:
//!
//! ```rust,ignore
//! settle.register_calculations(
//!     Calculations::new().add("important", important),
//! )?;
//! settle.register_calculations(
//!     Calculations::new().add(
//!         "dependent",
//!         Calculation::new(dependent).requires_calculations(["important"]),
//!     ),
//! )?;
//! ```

use settle_core::{Batch, BatchEntry, BoxError, HookContext, Hooks, UnitKind};
use thiserror::Error;

/// Raised when a declared requirement has not been registered in an earlier
/// batch.
#[derive(Error, Debug)]
#[error("{kind} '{name}' requires the {required_kind} '{requirement}' in {instance}")]
pub struct RequirementError {
    /// The kind of the unit being registered, capitalised.
    pub kind: &'static str,
    /// The unit being registered.
    pub name: String,
    /// The kind of the missing requirement.
    pub required_kind: &'static str,
    /// The missing name.
    pub requirement: String,
    /// Diagnostic label of the instance.
    pub instance: String,
}

/// The requirements module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Requirements;

fn check_entry(
    ctx: &HookContext<'_>,
    kind: &'static str,
    entry: &BatchEntry<'_>,
    required_kind: UnitKind,
    requirements: &[String],
) -> Result<(), BoxError> {
    let registered = ctx.shared.registered.lock().unwrap();
    for requirement in requirements {
        if !registered.contains(required_kind, requirement) {
            return Err(RequirementError {
                kind,
                name: entry.name.to_string(),
                required_kind: required_kind.singular(),
                requirement: requirement.clone(),
                instance: ctx.label.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

impl<S> Hooks<S> for Requirements {
    fn register_calculations(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        for entry in &batch.entries {
            check_entry(
                ctx,
                "Calculation",
                entry,
                UnitKind::Calculation,
                entry.requires_calculations,
            )?;
        }
        Ok(())
    }

    fn register_side_effects(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        for entry in &batch.entries {
            check_entry(
                ctx,
                "Side effect",
                entry,
                UnitKind::Calculation,
                entry.requires_calculations,
            )?;
            check_entry(
                ctx,
                "Side effect",
                entry,
                UnitKind::SideEffect,
                entry.requires_side_effects,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_core::{Calculation, Calculations, Settle, SideEffect, SideEffects};
    use std::sync::Arc;

    #[test]
    fn missing_calculation_requirement_fails_registration() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Requirements);

        let err = settle
            .register_calculations(Calculations::new().add(
                "dependent",
                Calculation::new(|prior: &Arc<i32>, _| prior.clone()).requires_calculations(["missing"]),
            ))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Calculation 'dependent' requires the calculation 'missing' in settle:(anon)"
        );
    }

    #[test]
    fn requirement_from_an_earlier_batch_is_satisfied() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Requirements);
        settle
            .register_calculations(
                Calculations::new().add("existing", Calculation::new(|prior: &Arc<i32>, _| prior.clone())),
            )
            .unwrap();

        settle
            .register_calculations(Calculations::new().add(
                "dependent",
                Calculation::new(|prior: &Arc<i32>, _| prior.clone()).requires_calculations(["existing"]),
            ))
            .unwrap();
        assert_eq!(settle.calculation_names(), ["existing", "dependent"]);
    }

    #[test]
    fn same_batch_siblings_are_not_visible() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Requirements);

        let err = settle
            .register_calculations(
                Calculations::new()
                    .add("important", Calculation::new(|prior: &Arc<i32>, _| prior.clone()))
                    .add(
                        "dependent",
                        Calculation::new(|prior: &Arc<i32>, _| prior.clone())
                            .requires_calculations(["important"]),
                    ),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Calculation 'dependent' requires the calculation 'important' in settle:(anon)"
        );
    }

    #[test]
    fn side_effects_may_require_calculations_and_side_effects() {
        let settle: Settle<i32> = Settle::new();
        settle.hooks(Requirements);
        settle
            .register_calculations(
                Calculations::new().add("important", Calculation::new(|prior: &Arc<i32>, _| prior.clone())),
            )
            .unwrap();
        settle
            .register_side_effects(
                SideEffects::new().add("render", SideEffect::new(|_, _, _| {})),
            )
            .unwrap();

        settle
            .register_side_effects(SideEffects::new().add(
                "report",
                SideEffect::new(|_, _, _| {})
                    .requires_calculations(["important"])
                    .requires_side_effects(["render"]),
            ))
            .unwrap();

        let err = settle
            .register_side_effects(SideEffects::new().add(
                "broken",
                SideEffect::new(|_, _, _| {}).requires_side_effects(["missing"]),
            ))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Side effect 'broken' requires the side-effect 'missing' in settle:(anon)"
        );
    }
}
