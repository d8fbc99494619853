//! # homewire-adapter-system
//!
//! Components every hub runs regardless of its hardware.
//!
//! ## Responsibilities
//! - [`Clock`]: publish the wall-clock time as global variables and raise a
//!   `cron-event` at every minute boundary
//! - [`Runlevel`]: hold the hub's run level (`home`, `away`, …) as a global
//!   variable, change it on request and persist it across restarts
//!
//! ## Dependency rule
//! Depends on `homewire-app` (for the component port) and `homewire-domain`.

pub mod clock;
pub mod error;
pub mod runlevel;

pub use clock::Clock;
pub use error::SystemError;
pub use runlevel::{Runlevel, RunlevelParams};
