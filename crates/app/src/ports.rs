//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engines and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod component;
pub mod rule_source;
pub mod signal_store;
pub mod signal_transport;

pub use component::{Component, DO_RELOAD, ReloadOutcome};
pub use rule_source::{RuleEntry, RuleSource};
pub use signal_store::SignalStore;
pub use signal_transport::{Frame, SignalTransport};
