//! # settle: a single-threaded state-transition engine
//!
//! Settle holds one immutable application state and changes it only through
//! named **actions**. Dispatching an action runs one synchronous cycle:
//!
//! 1. claim the state and the dispatching flag,
//! 2. run the action's transform,
//! 3. run every registered **calculation** over the transient state, in
//!    registration order,
//! 4. commit iff the final state is a different `Arc` than the starting one,
//! 5. notify every registered **side effect** of the committed state,
//! 6. release the flag.
//!
//! Dispatching from inside a cycle is an error; side effects reach the
//! outside world and feed new dispatches back in from external events, never
//! synchronously.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use settle::{Action, Actions, Settle};
//! use std::sync::Arc;
//!
//! let engine: Settle<Model> = settle::development();
//! engine.set_state(Model::default())?;
//! engine.register_actions(Actions::new().add(
//!     "set_words",
//!     Action::new(|words: &String, state: &Arc<Model>| {
//!         Arc::new(Model { words: words.clone(), ..(**state).clone() })
//!     }),
//! ))?;
//! engine.dispatch("set_words", "hello world".to_string())?;
//! ```
//!
//! Cross-cutting behaviour (logging, duplicate rejection, dependency
//! checking, post-dispatch lockdown, validation) is layered on through the
//! [`Hooks`] pipeline; see the `settle-std` re-exports below.

#![warn(missing_docs)]

mod development;

pub use development::{attach, development};

pub use settle_core::{
    // Units
    Action,
    ActionGuard,
    // Batches
    Actions,
    // Error types
    BoxError,
    Calculation,
    Calculations,
    DispatchError,
    // Dispatch
    Dispatcher,
    Dispatchers,
    // Factory
    Instances,
    // Hook pipeline
    Batch,
    BatchEntry,
    HookContext,
    Hooks,
    Introspect,
    PostHook,
    RegisteredNames,
    RegistrationError,
    // Engine
    Settle,
    SettleError,
    SharedBag,
    SideEffect,
    SideEffects,
    StateGuard,
    UnitKind,
};

pub use settle_core::{
    ActionEvent, CalculationEvent, ChainEvent, DispatchEvent, SideEffectEvent,
};

pub use settle_std::{
    Dedupe, DuplicateError, InvalidState, Lockdown, LockdownError, Logging, RequirementError,
    Requirements, Validation,
};

pub use settle_std::testing;
