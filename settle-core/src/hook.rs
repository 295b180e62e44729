//! The hook pipeline: pre/post interception for every registration and every
//! dispatch step.
//!
//! Cross-cutting concerns (logging, validation, deduplication, requirement
//! checking, lockdown) are composed additively without the dispatcher knowing
//! which are present. A hook module is any type implementing a subset of the
//! [`Hooks`] methods; every method defaults to a no-op, so overriding one
//! method subscribes to exactly one hook point.
//!
//! # Post-hooks
//!
//! A hook method may return a [`PostHook`]: a one-shot transform applied to
//! the value the hook point threads (a state for the dispatch-phase points, a
//! unit for the per-item registration points). Returning `Ok(None)` declines
//! to transform. Post-hooks from multiple modules are applied in subscription
//! order, each seeing the previous one's output; a failing post-hook aborts
//! the operation at the point of detection.

use crate::error::BoxError;
use crate::unit::{Calculation, SideEffect, UnitKind};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// A one-shot transform returned by a hook subscriber, applied later to the
/// value its hook point threads.
pub type PostHook<T> = Box<dyn FnOnce(T) -> Result<T, BoxError> + Send>;

/// Apply collected post-hooks to `value`, in subscription order.
///
/// An empty collection is the identity. The first failing post-hook
/// short-circuits.
pub fn apply_post_hooks<T>(posts: Vec<PostHook<T>>, value: T) -> Result<T, BoxError> {
    posts.into_iter().try_fold(value, |value, post| post(value))
}

/// Names registered on an instance so far, per unit kind.
///
/// Populated by the engine after each batch's bulk hook has run, and never
/// pruned. Requirement-checking hooks read this, which is why a unit can only
/// require names registered in a strictly earlier batch call.
#[derive(Default)]
pub struct RegisteredNames {
    /// Registered action names.
    pub actions: HashSet<String>,
    /// Registered calculation names.
    pub calculations: HashSet<String>,
    /// Registered side-effect names.
    pub side_effects: HashSet<String>,
}

impl RegisteredNames {
    /// Whether `name` is registered under `kind`.
    pub fn contains(&self, kind: UnitKind, name: &str) -> bool {
        match kind {
            UnitKind::Action => self.actions.contains(name),
            UnitKind::Calculation => self.calculations.contains(name),
            UnitKind::SideEffect => self.side_effects.contains(name),
        }
    }

    pub(crate) fn insert(&mut self, kind: UnitKind, name: String) {
        match kind {
            UnitKind::Action => self.actions.insert(name),
            UnitKind::Calculation => self.calculations.insert(name),
            UnitKind::SideEffect => self.side_effects.insert(name),
        };
    }
}

/// Mutable scratch shared by all hook modules of one instance.
///
/// The field set is fixed and documented; cooperating modules use it to pass
/// information to each other (the lockdown module raises `lockdown`, the
/// requirements module reads `registered`).
pub struct SharedBag {
    /// Raised on the first dispatch; registration hooks may refuse further
    /// mutation once set.
    pub lockdown: AtomicBool,
    /// The registered-names index.
    pub registered: Mutex<RegisteredNames>,
}

impl SharedBag {
    pub(crate) fn new() -> Self {
        Self {
            lockdown: AtomicBool::new(false),
            registered: Mutex::new(RegisteredNames::default()),
        }
    }
}

/// Existence queries over an instance's registries, for duplicate-checking
/// hooks.
pub trait Introspect: Send + Sync {
    /// Whether an action is registered under `name`.
    fn has_action(&self, name: &str) -> bool;
    /// Whether a calculation is registered under `name`.
    fn has_calculation(&self, name: &str) -> bool;
    /// Whether a side effect is registered under `name`.
    fn has_side_effect(&self, name: &str) -> bool;
}

/// Parameter bag passed to every hook invocation.
pub struct HookContext<'a> {
    /// Stable diagnostic label, `settle:{name}` or `settle:(anon)`.
    pub label: &'a str,
    /// The instance's public existence queries.
    pub surface: &'a dyn Introspect,
    /// The cross-module scratch object.
    pub shared: &'a SharedBag,
}

/// One entry of a registration batch, as seen by bulk registration hooks.
pub struct BatchEntry<'a> {
    /// The name being registered.
    pub name: &'a str,
    /// Calculations the unit declared it requires.
    pub requires_calculations: &'a [String],
    /// Side effects the unit declared it requires.
    pub requires_side_effects: &'a [String],
}

/// Manifest of one bulk registration call.
pub struct Batch<'a> {
    /// The kind of unit being registered.
    pub kind: UnitKind,
    /// The batch entries, in registration order.
    pub entries: Vec<BatchEntry<'a>>,
}

impl Batch<'_> {
    /// The batch's names, joined for diagnostics.
    pub fn joined_names(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Fired at the start of a dispatch cycle.
pub struct DispatchEvent<'a, S> {
    /// The dispatched action's name.
    pub action: &'a str,
    /// The caller-supplied payload.
    pub args: &'a dyn fmt::Debug,
    /// The locked state the cycle starts from.
    pub start: &'a Arc<S>,
    /// Whether the action's guard enabled this cycle.
    pub enable: bool,
}

/// Fired just before the action's transform runs.
pub struct ActionEvent<'a, S> {
    /// The dispatched action's name.
    pub action: &'a str,
    /// The caller-supplied payload.
    pub args: &'a dyn fmt::Debug,
    /// The pre-cycle state.
    pub start: &'a Arc<S>,
}

/// Fired before the calculation chain and before the side-effect chain.
pub struct ChainEvent<'a, S> {
    /// The dispatched action's name.
    pub action: &'a str,
    /// The pre-cycle state.
    pub start: &'a Arc<S>,
    /// The transient state entering the calculation chain, or the freshly
    /// committed state entering the side-effect chain.
    pub state: &'a Arc<S>,
}

/// Fired before each individual calculation.
pub struct CalculationEvent<'a, S> {
    /// The dispatched action's name.
    pub action: &'a str,
    /// The calculation's name.
    pub name: &'a str,
    /// The pre-cycle state.
    pub start: &'a Arc<S>,
    /// The output of the previous chain element.
    pub prior: &'a Arc<S>,
    /// Whether the calculation's guard enabled it.
    pub enable: bool,
}

/// Fired before each individual side effect.
pub struct SideEffectEvent<'a, S> {
    /// The dispatched action's name.
    pub action: &'a str,
    /// The side effect's name.
    pub name: &'a str,
    /// The pre-cycle state.
    pub start: &'a Arc<S>,
    /// The committed state.
    pub locked: &'a Arc<S>,
    /// Whether the side effect's guard enabled it.
    pub enable: bool,
}

/// A cross-cutting hook module.
///
/// Implement the methods for the hook points you care about; the rest default
/// to no-ops. Modules run in subscription order at every point. Returning
/// `Err` from a registration point rejects the registration; returning `Err`
/// from a dispatch point aborts the cycle (the dispatching flag is still
/// released and the `dispatch` post-hooks still run).
#[allow(unused_variables)]
pub trait Hooks<S>: Send + Sync {
    /// Before initial or updated state is stored. The post-hook receives the
    /// new state.
    fn register_state(&self, ctx: &HookContext<'_>) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(None)
    }

    /// Once per action batch, before per-item processing. Subscribers may
    /// reject the whole batch.
    fn register_actions(&self, ctx: &HookContext<'_>, batch: &Batch<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Once per individual action name.
    fn register_action(&self, ctx: &HookContext<'_>, name: &str) -> Result<(), BoxError> {
        Ok(())
    }

    /// After a dispatcher has been created for an action. The erased handle
    /// can be downcast to the concrete
    /// [`Dispatcher<S, P>`](crate::Dispatcher) by modules that gather
    /// dispatchers for wiring outside the instance.
    fn register_dispatcher(
        &self,
        ctx: &HookContext<'_>,
        name: &str,
        dispatcher: &(dyn Any + Send + Sync),
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Once per calculation batch, before per-item processing.
    fn register_calculations(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Once per individual calculation name. The post-hook receives the unit
    /// and may wrap it.
    fn register_calculation(
        &self,
        ctx: &HookContext<'_>,
        name: &str,
    ) -> Result<Option<PostHook<Calculation<S>>>, BoxError> {
        Ok(None)
    }

    /// Once per side-effect batch, before per-item processing.
    fn register_side_effects(
        &self,
        ctx: &HookContext<'_>,
        batch: &Batch<'_>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Once per individual side-effect name. The post-hook receives the unit
    /// and may wrap it.
    fn register_side_effect(
        &self,
        ctx: &HookContext<'_>,
        name: &str,
    ) -> Result<Option<PostHook<SideEffect<S>>>, BoxError> {
        Ok(None)
    }

    /// At the start of every dispatch cycle. The post-hook fires at cycle end
    /// with the final locked state; whatever it returns becomes the locked
    /// state, a last-write-wins override after commit. It fires on success,
    /// guard-skip and error alike.
    fn dispatch(
        &self,
        ctx: &HookContext<'_>,
        event: &DispatchEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(None)
    }

    /// Just before the action's transform. The post-hook receives the
    /// transient state the action produced.
    fn action(
        &self,
        ctx: &HookContext<'_>,
        event: &ActionEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(None)
    }

    /// Before the calculation chain. The post-hook receives the transient
    /// state after the whole chain, not after each step.
    fn calculations(
        &self,
        ctx: &HookContext<'_>,
        event: &ChainEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(None)
    }

    /// Before each individual calculation. The post-hook receives the
    /// transient state after that one calculation.
    fn calculation(
        &self,
        ctx: &HookContext<'_>,
        event: &CalculationEvent<'_, S>,
    ) -> Result<Option<PostHook<Arc<S>>>, BoxError> {
        Ok(None)
    }

    /// Before the side-effect chain; only fired when the cycle committed.
    fn side_effects(&self, ctx: &HookContext<'_>, event: &ChainEvent<'_, S>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Before each individual side effect.
    fn side_effect(
        &self,
        ctx: &HookContext<'_>,
        event: &SideEffectEvent<'_, S>,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}
