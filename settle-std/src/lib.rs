//! # settle-std
//!
//! Standard hook modules for the Settle state-transition engine.
//!
//! This crate provides:
//! - **[`Logging`]**: `tracing` events for registrations, dispatches and calls
//! - **[`Lockdown`]**: freeze the instance's shape on first dispatch
//! - **[`Dedupe`]**: reject re-registration of an existing name
//! - **[`Requirements`]**: fail fast on missing declared dependencies
//! - **[`Validation`]**: run a state validator over every produced state
//! - **Testing utilities**: [`testing::RecordingHooks`] and
//!   [`testing::CountingEffect`]
//!
//! Everything here is built purely on the public hook pipeline of
//! `settle-core`; none of these modules has privileged access to the engine.

#![warn(missing_docs)]

pub use settle_core;

pub mod hooks;
pub mod testing;

pub use hooks::dedupe::{Dedupe, DuplicateError};
pub use hooks::lockdown::{Lockdown, LockdownError};
pub use hooks::logging::Logging;
pub use hooks::requirements::{RequirementError, Requirements};
pub use hooks::validation::{InvalidState, Validation};
