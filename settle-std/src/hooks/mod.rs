//! The standard hook modules.
//!
//! Each module lives in its own file and subscribes to the subset of hook
//! points it needs. Modules are independent; subscribe any combination in any
//! order, bearing in mind that post-hooks apply in subscription order.

pub mod dedupe;
pub mod lockdown;
pub mod logging;
pub mod requirements;
pub mod validation;
