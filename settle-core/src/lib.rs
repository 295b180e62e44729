//! # settle-core
//!
//! Core engine for the Settle state-transition framework.
//!
//! Settle is a single-threaded, synchronous state-transition engine: invoking
//! a named action produces a new immutable application state by running the
//! action, then a fixed chain of derived calculations, and finally notifying
//! a fixed chain of side effects, enforcing strict invariants about
//! reentrancy, ordering and dependency registration along the way.
//!
//! # Architecture
//!
//! - **[`OrderedRegistry`]**: an insertion-ordered name→value map backing
//!   every registry on an instance.
//! - **Units** ([`Action`], [`Calculation`], [`SideEffect`]): the registered
//!   behaviours, each a transform plus an optional guard resolved once at
//!   construction time.
//! - **[`Hooks`]**: the extension seam: cross-cutting modules observe and
//!   transform every registration and every dispatch step through typed hook
//!   points with an explicit post-hook value-passing contract.
//! - **[`Settle`]**: one engine instance, owning the locked state, the
//!   dispatching flag, the registries and the hook subscriptions.
//! - **[`Dispatcher`]**: the per-action state machine running the
//!   claim → act → calculate → commit → effect → release protocol.
//! - **[`Instances`]**: the explicit singleton-by-name factory.
//!
//! # State identity
//!
//! State is held as `Arc<S>` and is semantically opaque. "Changed" always
//! means `Arc::ptr_eq` inequality: transforms return a new `Arc` to signal a
//! change and the same `Arc` to signal a no-op. Deep equality is never
//! consulted.
//!
//! # What the core does *not* enforce
//!
//! Duplicate names, dependency requirements and post-lockdown staleness are
//! checked by pluggable hook modules (see the `settle-std` crate), not here.
//! The core enforces only reentrancy protection and its own bookkeeping; that
//! split is the system's key extensibility design.

#![warn(missing_docs)]

mod batch;
mod dispatch;
mod error;
mod factory;
mod hook;
mod instance;
mod registry;
mod unit;

pub use batch::{Actions, Calculations, SideEffects};
pub use dispatch::{Dispatcher, Dispatchers};
pub use error::{BoxError, DispatchError, RegistrationError, SettleError};
pub use factory::Instances;
pub use hook::{
    ActionEvent, Batch, BatchEntry, CalculationEvent, ChainEvent, DispatchEvent, HookContext,
    Hooks, Introspect, PostHook, RegisteredNames, SharedBag, SideEffectEvent, apply_post_hooks,
};
pub use instance::Settle;
pub use registry::OrderedRegistry;
pub use unit::{Action, ActionGuard, Calculation, SideEffect, StateGuard, UnitKind};
