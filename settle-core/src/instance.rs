//! The engine instance.
//!
//! A [`Settle`] owns one application state plus everything that revolves
//! around it: the dispatching flag, the ordered unit registries, the hook
//! subscriptions and the shared hook scratch. The handle is a cheap clone
//! over an `Arc`; dispatchers capture a handle rather than independent copies
//! of any cell.

use crate::batch::{Actions, Calculations, SideEffects};
use crate::dispatch::{Dispatcher, Dispatchers};
use crate::error::{DispatchError, RegistrationError, SettleError};
use crate::hook::{
    Batch, BatchEntry, HookContext, Hooks, Introspect, SharedBag, apply_post_hooks,
};
use crate::registry::OrderedRegistry;
use crate::unit::{Calculation, SideEffect, UnitKind};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

pub(crate) struct Inner<S> {
    pub(crate) name: Mutex<Option<String>>,
    pub(crate) state: Mutex<Option<Arc<S>>>,
    pub(crate) dispatching: Mutex<Option<String>>,
    pub(crate) calculations: Mutex<OrderedRegistry<Arc<Calculation<S>>>>,
    pub(crate) side_effects: Mutex<OrderedRegistry<Arc<SideEffect<S>>>>,
    pub(crate) dispatchers: Mutex<OrderedRegistry<Box<dyn Any + Send + Sync>>>,
    pub(crate) hooks: Mutex<Vec<Arc<dyn Hooks<S>>>>,
    pub(crate) shared: SharedBag,
}

/// One engine context: a handle to the instance owning the locked state,
/// the registries and the hook pipeline.
///
/// Cloning is O(1) and yields a handle to the same instance.
pub struct Settle<S> {
    pub(crate) inner: Arc<Inner<S>>,
}

impl<S> Clone for Settle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + Sync + 'static> Default for Settle<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync + 'static> Settle<S> {
    /// Create a fresh anonymous instance.
    ///
    /// Named instances are handed out by [`Instances`](crate::Instances);
    /// anonymous ones are not retained anywhere.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                name: Mutex::new(None),
                state: Mutex::new(None),
                dispatching: Mutex::new(None),
                calculations: Mutex::new(OrderedRegistry::new()),
                side_effects: Mutex::new(OrderedRegistry::new()),
                dispatchers: Mutex::new(OrderedRegistry::new()),
                hooks: Mutex::new(Vec::new()),
                shared: SharedBag::new(),
            }),
        }
    }

    pub(crate) fn set_name(&self, name: &str) {
        *self.inner.name.lock().unwrap() = Some(name.to_string());
    }

    pub(crate) fn clear_name(&self) {
        *self.inner.name.lock().unwrap() = None;
    }

    /// The instance's name, if it is (still) a named instance.
    pub fn name(&self) -> Option<String> {
        self.inner.name.lock().unwrap().clone()
    }

    /// Stable diagnostic label: `settle:{name}` or `settle:(anon)`.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => format!("settle:{name}"),
            None => "settle:(anon)".to_string(),
        }
    }

    /// Whether two handles refer to the same instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Subscribe a hook module. Modules run in subscription order at every
    /// hook point they implement.
    pub fn hooks(&self, module: impl Hooks<S> + 'static) -> &Self {
        self.inner.hooks.lock().unwrap().push(Arc::new(module));
        self
    }

    pub(crate) fn hooks_snapshot(&self) -> Vec<Arc<dyn Hooks<S>>> {
        self.inner.hooks.lock().unwrap().clone()
    }

    /// Set the locked state, routing it through the `register_state` hook
    /// point.
    pub fn set_state(&self, state: S) -> Result<(), SettleError> {
        self.store_state(Arc::new(state))
    }

    /// Set the locked state from a function over the existing state (which is
    /// `None` until first initialised).
    pub fn set_state_with(
        &self,
        f: impl FnOnce(Option<Arc<S>>) -> Arc<S>,
    ) -> Result<(), SettleError> {
        let current = self.inner.state.lock().unwrap().clone();
        self.store_state(f(current))
    }

    fn store_state(&self, state: Arc<S>) -> Result<(), SettleError> {
        let label = self.label();
        let hooks = self.hooks_snapshot();
        let ctx = HookContext {
            label: &label,
            surface: self,
            shared: &self.inner.shared,
        };
        let mut posts = Vec::new();
        for hook in &hooks {
            if let Some(post) = hook
                .register_state(&ctx)
                .map_err(RegistrationError::Rejected)?
            {
                posts.push(post);
            }
        }
        let state = apply_post_hooks(posts, state).map_err(RegistrationError::Rejected)?;
        *self.inner.state.lock().unwrap() = Some(state);
        Ok(())
    }

    /// Register a batch of actions. Each action gets a dispatcher; the batch
    /// and every item are routed through their hook points first.
    pub fn register_actions(&self, batch: Actions<S>) -> Result<(), SettleError> {
        let label = self.label();
        let hooks = self.hooks_snapshot();
        let ctx = HookContext {
            label: &label,
            surface: self,
            shared: &self.inner.shared,
        };
        {
            let manifest = Batch {
                kind: UnitKind::Action,
                entries: batch
                    .entries
                    .iter()
                    .map(|(name, _)| BatchEntry {
                        name,
                        requires_calculations: &[],
                        requires_side_effects: &[],
                    })
                    .collect(),
            };
            for hook in &hooks {
                hook.register_actions(&ctx, &manifest)
                    .map_err(RegistrationError::Rejected)?;
            }
        }
        for (name, install) in batch.entries {
            for hook in &hooks {
                hook.register_action(&ctx, &name)
                    .map_err(RegistrationError::Rejected)?;
            }
            let dispatcher = install(self, &name);
            for hook in &hooks {
                hook.register_dispatcher(&ctx, &name, dispatcher.as_ref())
                    .map_err(RegistrationError::Rejected)?;
            }
            self.inner
                .dispatchers
                .lock()
                .unwrap()
                .set(name.clone(), dispatcher);
            self.inner
                .shared
                .registered
                .lock()
                .unwrap()
                .insert(UnitKind::Action, name);
        }
        Ok(())
    }

    /// Register a batch of calculations, appended to the derivation chain in
    /// batch order.
    pub fn register_calculations(&self, batch: Calculations<S>) -> Result<(), SettleError> {
        let label = self.label();
        let hooks = self.hooks_snapshot();
        let ctx = HookContext {
            label: &label,
            surface: self,
            shared: &self.inner.shared,
        };
        {
            let manifest = Batch {
                kind: UnitKind::Calculation,
                entries: batch
                    .entries
                    .iter()
                    .map(|(name, calculation)| BatchEntry {
                        name,
                        requires_calculations: calculation.required_calculations(),
                        requires_side_effects: &[],
                    })
                    .collect(),
            };
            for hook in &hooks {
                hook.register_calculations(&ctx, &manifest)
                    .map_err(RegistrationError::Rejected)?;
            }
        }
        for (name, calculation) in batch.entries {
            let mut posts = Vec::new();
            for hook in &hooks {
                if let Some(post) = hook
                    .register_calculation(&ctx, &name)
                    .map_err(RegistrationError::Rejected)?
                {
                    posts.push(post);
                }
            }
            let calculation =
                apply_post_hooks(posts, calculation).map_err(RegistrationError::Rejected)?;
            self.inner
                .calculations
                .lock()
                .unwrap()
                .set(name.clone(), Arc::new(calculation));
            self.inner
                .shared
                .registered
                .lock()
                .unwrap()
                .insert(UnitKind::Calculation, name);
        }
        Ok(())
    }

    /// Register a batch of side effects, appended to the notification chain
    /// in batch order.
    pub fn register_side_effects(&self, batch: SideEffects<S>) -> Result<(), SettleError> {
        let label = self.label();
        let hooks = self.hooks_snapshot();
        let ctx = HookContext {
            label: &label,
            surface: self,
            shared: &self.inner.shared,
        };
        {
            let manifest = Batch {
                kind: UnitKind::SideEffect,
                entries: batch
                    .entries
                    .iter()
                    .map(|(name, side_effect)| BatchEntry {
                        name,
                        requires_calculations: side_effect.required_calculations(),
                        requires_side_effects: side_effect.required_side_effects(),
                    })
                    .collect(),
            };
            for hook in &hooks {
                hook.register_side_effects(&ctx, &manifest)
                    .map_err(RegistrationError::Rejected)?;
            }
        }
        for (name, side_effect) in batch.entries {
            let mut posts = Vec::new();
            for hook in &hooks {
                if let Some(post) = hook
                    .register_side_effect(&ctx, &name)
                    .map_err(RegistrationError::Rejected)?
                {
                    posts.push(post);
                }
            }
            let side_effect =
                apply_post_hooks(posts, side_effect).map_err(RegistrationError::Rejected)?;
            self.inner
                .side_effects
                .lock()
                .unwrap()
                .set(name.clone(), Arc::new(side_effect));
            self.inner
                .shared
                .registered
                .lock()
                .unwrap()
                .insert(UnitKind::SideEffect, name);
        }
        Ok(())
    }

    /// Hand every registered dispatcher to `f`, typically to wire external
    /// event sources during startup.
    pub fn init(&self, f: impl FnOnce(&Dispatchers<S>)) {
        f(&Dispatchers::new(self.clone()))
    }

    /// Look up the typed dispatcher for `name`.
    ///
    /// Fails if no action is registered under `name`, or if `P` is not the
    /// payload type the action was registered with.
    pub fn dispatcher<P>(&self, name: &str) -> Result<Dispatcher<S, P>, SettleError>
    where
        P: fmt::Debug + Send + Sync + 'static,
    {
        let registry = self.inner.dispatchers.lock().unwrap();
        let entry = registry
            .get(name)
            .ok_or_else(|| DispatchError::UnknownAction {
                instance: self.label(),
                name: name.to_string(),
            })?;
        entry
            .downcast_ref::<Dispatcher<S, P>>()
            .cloned()
            .ok_or_else(|| {
                DispatchError::PayloadType {
                    instance: self.label(),
                    action: name.to_string(),
                }
                .into()
            })
    }

    /// Dispatch `name` with `payload`: look up the dispatcher and run one
    /// full cycle.
    pub fn dispatch<P>(&self, name: &str, payload: P) -> Result<(), SettleError>
    where
        P: fmt::Debug + Send + Sync + 'static,
    {
        self.dispatcher::<P>(name)?.call(payload)
    }

    /// Names of all registered actions, in registration order.
    pub fn dispatchers(&self) -> Vec<String> {
        let registry = self.inner.dispatchers.lock().unwrap();
        registry.names().map(str::to_string).collect()
    }

    /// Names of all registered calculations, in execution order.
    pub fn calculation_names(&self) -> Vec<String> {
        let registry = self.inner.calculations.lock().unwrap();
        registry.names().map(str::to_string).collect()
    }

    /// Names of all registered side effects, in execution order.
    pub fn side_effect_names(&self) -> Vec<String> {
        let registry = self.inner.side_effects.lock().unwrap();
        registry.names().map(str::to_string).collect()
    }

    /// The current locked state, or `None` before initialisation.
    ///
    /// Reads between cycles observe only fully committed states; a cycle's
    /// partial updates are never visible here.
    pub fn current_state(&self) -> Option<Arc<S>> {
        self.inner.state.lock().unwrap().clone()
    }

    /// The name of the action currently dispatching, if any.
    pub fn dispatching(&self) -> Option<String> {
        self.inner.dispatching.lock().unwrap().clone()
    }

    /// Whether a dispatch cycle is in flight.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.lock().unwrap().is_some()
    }
}

impl<S: Send + Sync + 'static> Introspect for Settle<S> {
    fn has_action(&self, name: &str) -> bool {
        self.inner.dispatchers.lock().unwrap().has(name)
    }

    fn has_calculation(&self, name: &str) -> bool {
        self.inner.calculations.lock().unwrap().has(name)
    }

    fn has_side_effect(&self, name: &str) -> bool {
        self.inner.side_effects.lock().unwrap().has(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Action;

    #[test]
    fn label_reflects_name() {
        let settle: Settle<i32> = Settle::new();
        assert_eq!(settle.label(), "settle:(anon)");
        settle.set_name("demo");
        assert_eq!(settle.label(), "settle:demo");
    }

    #[test]
    fn registration_is_visible_through_introspection() {
        let settle: Settle<i32> = Settle::new();
        settle
            .register_actions(Actions::new().add("noop", Action::new(|_: &(), s: &Arc<i32>| s.clone())))
            .unwrap();
        settle
            .register_calculations(
                Calculations::new().add("carry", Calculation::new(|prior: &Arc<i32>, _| prior.clone())),
            )
            .unwrap();

        assert!(settle.has_action("noop"));
        assert!(settle.has_calculation("carry"));
        assert!(!settle.has_side_effect("noop"));
        assert_eq!(settle.dispatchers(), ["noop"]);
        assert_eq!(settle.calculation_names(), ["carry"]);
    }

    #[test]
    fn set_state_with_sees_existing_state() {
        let settle: Settle<i32> = Settle::new();
        settle.set_state(1).unwrap();
        settle
            .set_state_with(|current| {
                let current = current.expect("state was set");
                Arc::new(*current + 1)
            })
            .unwrap();
        assert_eq!(*settle.current_state().unwrap(), 2);
    }

    #[test]
    fn wrong_payload_type_is_rejected() {
        let settle: Settle<i32> = Settle::new();
        settle
            .register_actions(Actions::new().add("typed", Action::new(|_: &String, s: &Arc<i32>| s.clone())))
            .unwrap();
        let err = settle.dispatcher::<i32>("typed").unwrap_err();
        assert!(err.to_string().contains("wrong payload type"));
    }
}
