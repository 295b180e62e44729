//! Unit shapes: actions, calculations and side effects.
//!
//! A unit is its transform plus an optional guard, resolved once at
//! construction time, so the dispatcher's hot path never re-inspects shape.
//! A unit whose guard returns `false` is skipped for that cycle and the
//! prior state passes through unchanged.

use crate::dispatch::Dispatchers;
use std::sync::Arc;

/// Guard over `(state, payload)` deciding whether an action runs.
pub type ActionGuard<S, P> = dyn Fn(&S, &P) -> bool + Send + Sync;

/// Guard over two states, `(prior, start)` for calculations and
/// `(locked, start)` for side effects.
pub type StateGuard<S> = dyn Fn(&S, &S) -> bool + Send + Sync;

/// A named unit that computes a new state from a caller-supplied payload.
///
/// The transform receives the payload and the state the cycle started from,
/// and returns the next state. Returning the same `Arc` signals "no change";
/// state change is always detected by identity (`Arc::ptr_eq`), never by
/// value equality.
pub struct Action<S, P> {
    then: Box<dyn Fn(&P, &Arc<S>) -> Arc<S> + Send + Sync>,
    when: Option<Box<ActionGuard<S, P>>>,
}

impl<S, P> Action<S, P> {
    /// Create an unconditional action from its transform.
    pub fn new(then: impl Fn(&P, &Arc<S>) -> Arc<S> + Send + Sync + 'static) -> Self {
        Self {
            then: Box::new(then),
            when: None,
        }
    }

    /// Gate the action on a guard evaluated against the pre-cycle state and
    /// the payload.
    pub fn when(mut self, when: impl Fn(&S, &P) -> bool + Send + Sync + 'static) -> Self {
        self.when = Some(Box::new(when));
        self
    }

    /// Evaluate the guard; unconditional actions are always enabled.
    pub fn enabled(&self, state: &S, payload: &P) -> bool {
        self.when.as_ref().is_none_or(|when| when(state, payload))
    }

    /// Run the transform.
    pub fn run(&self, payload: &P, start: &Arc<S>) -> Arc<S> {
        (self.then)(payload, start)
    }
}

/// A named unit in the ordered derivation chain run after every enabled
/// action.
///
/// The transform receives `(prior, start)`: the output of the previous
/// calculation (or the action) and the untouched pre-cycle state.
pub struct Calculation<S> {
    then: Box<dyn Fn(&Arc<S>, &Arc<S>) -> Arc<S> + Send + Sync>,
    when: Option<Box<StateGuard<S>>>,
    requires_calculations: Vec<String>,
}

impl<S> Calculation<S> {
    /// Create an unconditional calculation from its transform.
    pub fn new(then: impl Fn(&Arc<S>, &Arc<S>) -> Arc<S> + Send + Sync + 'static) -> Self {
        Self {
            then: Box::new(then),
            when: None,
            requires_calculations: Vec::new(),
        }
    }

    /// Gate the calculation on a guard over `(prior, start)`.
    pub fn when(mut self, when: impl Fn(&S, &S) -> bool + Send + Sync + 'static) -> Self {
        self.when = Some(Box::new(when));
        self
    }

    /// Declare calculations this one depends on. Checked at registration time
    /// by the requirements hook module, against strictly earlier batches.
    pub fn requires_calculations<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.requires_calculations
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Declared calculation requirements.
    pub fn required_calculations(&self) -> &[String] {
        &self.requires_calculations
    }

    /// Evaluate the guard over `(prior, start)`.
    pub fn enabled(&self, prior: &S, start: &S) -> bool {
        self.when.as_ref().is_none_or(|when| when(prior, start))
    }

    /// Run the transform over `(prior, start)`.
    pub fn run(&self, prior: &Arc<S>, start: &Arc<S>) -> Arc<S> {
        (self.then)(prior, start)
    }
}

/// A named unit in the ordered chain of externally observable work, run only
/// when a cycle committed a changed state.
///
/// Receives `(locked, start, dispatchers)`. Side effects cannot change state;
/// they may hand work to an external scheduler that dispatches a new cycle
/// later, but dispatching synchronously from within one fails as reentrant.
pub struct SideEffect<S> {
    then: Box<dyn Fn(&Arc<S>, &Arc<S>, &Dispatchers<S>) + Send + Sync>,
    when: Option<Box<StateGuard<S>>>,
    requires_calculations: Vec<String>,
    requires_side_effects: Vec<String>,
}

impl<S> SideEffect<S> {
    /// Create an unconditional side effect.
    pub fn new(then: impl Fn(&Arc<S>, &Arc<S>, &Dispatchers<S>) + Send + Sync + 'static) -> Self {
        Self {
            then: Box::new(then),
            when: None,
            requires_calculations: Vec::new(),
            requires_side_effects: Vec::new(),
        }
    }

    /// Gate the side effect on a guard over `(locked, start)`.
    pub fn when(mut self, when: impl Fn(&S, &S) -> bool + Send + Sync + 'static) -> Self {
        self.when = Some(Box::new(when));
        self
    }

    /// Declare calculations this side effect depends on.
    pub fn requires_calculations<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.requires_calculations
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare side effects this side effect depends on.
    pub fn requires_side_effects<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.requires_side_effects
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Declared calculation requirements.
    pub fn required_calculations(&self) -> &[String] {
        &self.requires_calculations
    }

    /// Declared side-effect requirements.
    pub fn required_side_effects(&self) -> &[String] {
        &self.requires_side_effects
    }

    /// Evaluate the guard over `(locked, start)`.
    pub fn enabled(&self, locked: &S, start: &S) -> bool {
        self.when.as_ref().is_none_or(|when| when(locked, start))
    }

    /// Run the side effect.
    pub fn run(&self, locked: &Arc<S>, start: &Arc<S>, dispatchers: &Dispatchers<S>) {
        (self.then)(locked, start, dispatchers)
    }
}

/// The three unit categories, used in hook manifests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// An action (dispatcher-backed).
    Action,
    /// A calculation in the derivation chain.
    Calculation,
    /// A side effect in the notification chain.
    SideEffect,
}

impl UnitKind {
    /// Singular diagnostic noun, e.g. `"calculation"`. The side-effect noun
    /// is hyphenated in the singular only.
    pub fn singular(&self) -> &'static str {
        match self {
            UnitKind::Action => "action",
            UnitKind::Calculation => "calculation",
            UnitKind::SideEffect => "side-effect",
        }
    }

    /// Plural diagnostic noun, e.g. `"calculations"`.
    pub fn plural(&self) -> &'static str {
        match self {
            UnitKind::Action => "actions",
            UnitKind::Calculation => "calculations",
            UnitKind::SideEffect => "side effects",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.singular())
    }
}
