//! Development-mode construction.
//!
//! Saves importing and subscribing the standard guard-rail modules one by
//! one when standing up an instance during development.

use settle_core::Settle;
use settle_std::{Dedupe, Lockdown, Logging, Requirements};
use std::fmt;

/// Create an anonymous instance with the development guard rails subscribed:
/// full [`Logging`], [`Lockdown`], [`Dedupe`] and [`Requirements`].
///
/// Production code typically constructs a bare [`Settle`] and picks modules
/// itself.
pub fn development<S: fmt::Debug + Send + Sync + 'static>() -> Settle<S> {
    let instance = Settle::new();
    attach(&instance);
    instance
}

/// Subscribe the development modules to an existing instance, for instances
/// handed out by an [`Instances`](settle_core::Instances) registry.
pub fn attach<S: fmt::Debug + Send + Sync + 'static>(instance: &Settle<S>) {
    instance
        .hooks(Logging::all())
        .hooks(Lockdown)
        .hooks(Dedupe)
        .hooks(Requirements);
}
