//! The dispatcher state machine.
//!
//! One dispatcher is bound to one registered action. Invoking it runs a full
//! cycle synchronously to completion: claim the state, run the action, run
//! the calculation chain, commit on an identity change, notify side effects,
//! release. Every step is threaded through the hook pipeline.
//!
//! The dispatching flag doubles as the "at most one in-flight cycle per
//! instance" lock: a second dispatch, reentrant on the same call stack or
//! racing from another thread, fails fast instead of queueing. Release is
//! guaranteed by a drop guard, so a panicking user closure cannot wedge the
//! instance.

use crate::error::{BoxError, DispatchError, SettleError};
use crate::hook::{
    ActionEvent, CalculationEvent, ChainEvent, DispatchEvent, HookContext, Hooks, PostHook,
    SideEffectEvent, apply_post_hooks,
};
use crate::instance::Settle;
use crate::unit::{Action, Calculation, SideEffect};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// The callable bound to one action name.
///
/// Cloning is cheap; clones dispatch on the same instance.
pub struct Dispatcher<S, P> {
    instance: Settle<S>,
    name: Arc<str>,
    action: Arc<Action<S, P>>,
}

impl<S, P> Clone for Dispatcher<S, P> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            name: Arc::clone(&self.name),
            action: Arc::clone(&self.action),
        }
    }
}

impl<S, P> fmt::Debug for Dispatcher<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S, P> Dispatcher<S, P>
where
    S: Send + Sync + 'static,
    P: fmt::Debug + Send + Sync + 'static,
{
    pub(crate) fn new(instance: Settle<S>, name: &str, action: Arc<Action<S, P>>) -> Self {
        Self {
            instance,
            name: Arc::from(name),
            action,
        }
    }

    /// The action name this dispatcher is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one full dispatch cycle with `payload`.
    ///
    /// Returns normally after a committed or guard-skipped cycle. On error
    /// the dispatching flag is released and the `dispatch` post-hooks have
    /// run before the error propagates; the instance stays usable.
    pub fn call(&self, payload: P) -> Result<(), SettleError> {
        let inner = &self.instance.inner;

        // Reentrancy check, before any hook fires. The flag is never set for
        // a rejected call.
        {
            let mut flag = inner.dispatching.lock().unwrap();
            if let Some(in_flight) = flag.as_deref() {
                return Err(DispatchError::Reentrant {
                    instance: self.instance.label(),
                    attempted: self.name.to_string(),
                    in_flight: in_flight.to_string(),
                }
                .into());
            }
            *flag = Some(self.name.to_string());
        }
        let release = ReleaseGuard {
            flag: &inner.dispatching,
        };

        let Some(start) = self.instance.current_state() else {
            return Err(DispatchError::NoState {
                instance: self.instance.label(),
            }
            .into());
        };

        let label = self.instance.label();
        let hooks = self.instance.hooks_snapshot();
        let ctx = HookContext {
            label: &label,
            surface: &self.instance,
            shared: &inner.shared,
        };

        // Guard evaluation against the pre-cycle state, never a partial one.
        let enable = self.action.enabled(&start, &payload);

        let mut dispatch_posts: Vec<PostHook<Arc<S>>> = Vec::new();
        let result = self.run_cycle(&ctx, &hooks, &payload, &start, enable, &mut dispatch_posts);

        // The flag clears before the dispatch post-hooks observe the final
        // state, on success, guard-skip and error alike.
        drop(release);
        let post_result = self.apply_dispatch_posts(dispatch_posts);

        result?;
        post_result
    }

    /// Apply the `dispatch` post-hooks to the locked state and store the
    /// outcome: the documented last-write-wins override after commit.
    fn apply_dispatch_posts(&self, posts: Vec<PostHook<Arc<S>>>) -> Result<(), SettleError> {
        if posts.is_empty() {
            return Ok(());
        }
        let current = self.instance.inner.state.lock().unwrap().clone();
        let Some(current) = current else {
            return Ok(());
        };
        let final_state = apply_post_hooks(posts, current).map_err(hook_err)?;
        *self.instance.inner.state.lock().unwrap() = Some(final_state);
        Ok(())
    }

    fn run_cycle(
        &self,
        ctx: &HookContext<'_>,
        hooks: &[Arc<dyn Hooks<S>>],
        payload: &P,
        start: &Arc<S>,
        enable: bool,
        dispatch_posts: &mut Vec<PostHook<Arc<S>>>,
    ) -> Result<(), SettleError> {
        {
            let event = DispatchEvent {
                action: &self.name,
                args: payload,
                start,
                enable,
            };
            for hook in hooks {
                if let Some(post) = hook.dispatch(ctx, &event).map_err(hook_err)? {
                    dispatch_posts.push(post);
                }
            }
        }
        if !enable {
            return Ok(());
        }

        // Action phase.
        let mut transient = {
            let mut posts = Vec::new();
            let event = ActionEvent {
                action: &self.name,
                args: payload,
                start,
            };
            for hook in hooks {
                if let Some(post) = hook.action(ctx, &event).map_err(hook_err)? {
                    posts.push(post);
                }
            }
            let raw = self.action.run(payload, start);
            apply_post_hooks(posts, raw).map_err(hook_err)?
        };

        // Calculation chain, in registration order across all batches.
        let calculations: Vec<(String, Arc<Calculation<S>>)> = {
            let registry = self.instance.inner.calculations.lock().unwrap();
            registry
                .iter()
                .map(|(name, calculation)| (name.to_string(), Arc::clone(calculation)))
                .collect()
        };
        let mut chain_posts = Vec::new();
        {
            let event = ChainEvent {
                action: &self.name,
                start,
                state: &transient,
            };
            for hook in hooks {
                if let Some(post) = hook.calculations(ctx, &event).map_err(hook_err)? {
                    chain_posts.push(post);
                }
            }
        }
        for (name, calculation) in &calculations {
            let enabled = calculation.enabled(&transient, start);
            let mut posts = Vec::new();
            {
                let event = CalculationEvent {
                    action: &self.name,
                    name,
                    start,
                    prior: &transient,
                    enable: enabled,
                };
                for hook in hooks {
                    if let Some(post) = hook.calculation(ctx, &event).map_err(hook_err)? {
                        posts.push(post);
                    }
                }
            }
            let next = if enabled {
                calculation.run(&transient, start)
            } else {
                transient.clone()
            };
            transient = apply_post_hooks(posts, next).map_err(hook_err)?;
        }
        let transient = apply_post_hooks(chain_posts, transient).map_err(hook_err)?;

        // Commit test: identity inequality, never deep equality. No change
        // means no commit and no side effects.
        if Arc::ptr_eq(&transient, start) {
            return Ok(());
        }
        *self.instance.inner.state.lock().unwrap() = Some(transient.clone());
        let locked = transient;

        let side_effects: Vec<(String, Arc<SideEffect<S>>)> = {
            let registry = self.instance.inner.side_effects.lock().unwrap();
            registry
                .iter()
                .map(|(name, side_effect)| (name.to_string(), Arc::clone(side_effect)))
                .collect()
        };
        {
            let event = ChainEvent {
                action: &self.name,
                start,
                state: &locked,
            };
            for hook in hooks {
                hook.side_effects(ctx, &event).map_err(hook_err)?;
            }
        }
        let dispatchers = Dispatchers::new(self.instance.clone());
        for (name, side_effect) in &side_effects {
            let enabled = side_effect.enabled(&locked, start);
            {
                let event = SideEffectEvent {
                    action: &self.name,
                    name,
                    start,
                    locked: &locked,
                    enable: enabled,
                };
                for hook in hooks {
                    hook.side_effect(ctx, &event).map_err(hook_err)?;
                }
            }
            if enabled {
                side_effect.run(&locked, start, &dispatchers);
            }
        }
        Ok(())
    }
}

fn hook_err(err: BoxError) -> SettleError {
    DispatchError::Hook(err).into()
}

/// Clears the dispatching flag when the cycle unwinds, by any path.
struct ReleaseGuard<'a> {
    flag: &'a Mutex<Option<String>>,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        *flag = None;
    }
}

/// Lookup handle over an instance's dispatchers, handed to side effects and
/// [`Settle::init`] callbacks.
pub struct Dispatchers<S> {
    instance: Settle<S>,
}

impl<S> Clone for Dispatchers<S> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> Dispatchers<S> {
    pub(crate) fn new(instance: Settle<S>) -> Self {
        Self { instance }
    }

    /// Registered action names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.instance.dispatchers()
    }

    /// Look up the typed dispatcher for `name`.
    pub fn get<P>(&self, name: &str) -> Result<Dispatcher<S, P>, SettleError>
    where
        P: fmt::Debug + Send + Sync + 'static,
    {
        self.instance.dispatcher(name)
    }

    /// Dispatch `name` with `payload`.
    ///
    /// Called synchronously from within a side effect this fails as
    /// reentrant; hand the dispatcher to an external scheduler instead.
    pub fn dispatch<P>(&self, name: &str, payload: P) -> Result<(), SettleError>
    where
        P: fmt::Debug + Send + Sync + 'static,
    {
        self.get(name)?.call(payload)
    }
}
