//! Error types for Settle.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`SettleError`] - Top-level error type for all engine operations
//! - [`DispatchError`] - Errors during a dispatch cycle
//! - [`RegistrationError`] - Errors while registering units or state
//!
//! The engine itself performs no recovery: every failure aborts the current
//! call and propagates to the caller, after the guaranteed cleanup (release of
//! the dispatching flag, dispatch post-hooks) has run.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
///
/// Hook modules report failures as `BoxError`; the engine wraps them into
/// [`DispatchError::Hook`] or [`RegistrationError::Rejected`] depending on
/// where they surfaced.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Settle operations.
#[derive(Error, Debug)]
pub enum SettleError {
    /// An error occurred during a dispatch cycle.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// An error occurred during registration.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Errors that can occur during a dispatch cycle.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A dispatch was attempted while another was already in flight on the
    /// same instance. The dispatching flag is never set for the rejected
    /// call, so the instance state is not corrupted.
    #[error("Attempt to dispatch action '{attempted}' within action '{in_flight}' in {instance}")]
    Reentrant {
        /// Diagnostic label of the instance.
        instance: String,
        /// The action whose dispatch was rejected.
        attempted: String,
        /// The action currently holding the dispatching flag.
        in_flight: String,
    },

    /// A dispatch was attempted before any state was set on the instance.
    #[error("No state has been set on {instance}")]
    NoState {
        /// Diagnostic label of the instance.
        instance: String,
    },

    /// No dispatcher is registered under the given action name.
    #[error("No dispatcher registered for action '{name}' in {instance}")]
    UnknownAction {
        /// Diagnostic label of the instance.
        instance: String,
        /// The unknown action name.
        name: String,
    },

    /// A dispatcher was looked up with a payload type other than the one its
    /// action was registered with.
    #[error("Dispatcher for action '{action}' in {instance} was requested with the wrong payload type")]
    PayloadType {
        /// Diagnostic label of the instance.
        instance: String,
        /// The action whose dispatcher was looked up.
        action: String,
    },

    /// A hook subscriber failed mid-cycle (e.g. a state validator).
    #[error(transparent)]
    Hook(BoxError),
}

/// Errors that can occur during registration.
///
/// The core enforces nothing at registration time beyond its own bookkeeping;
/// duplicate names, missing requirements, post-lockdown mutation and the like
/// are raised by hook modules and surface here unmodified.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A registration hook refused the batch, an individual unit, or a new
    /// state value.
    #[error(transparent)]
    Rejected(BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentrancy_error_names_both_actions() {
        let err = DispatchError::Reentrant {
            instance: "settle:(anon)".into(),
            attempted: "inner".into(),
            in_flight: "outer".into(),
        };
        assert_eq!(
            err.to_string(),
            "Attempt to dispatch action 'inner' within action 'outer' in settle:(anon)"
        );
    }

    #[test]
    fn rejection_is_transparent() {
        let source: BoxError = "duplicate name".into();
        let err = SettleError::from(RegistrationError::Rejected(source));
        assert_eq!(err.to_string(), "duplicate name");
    }
}
