//! # homewire-app
//!
//! Application layer: the intercom, the component contract, and the two
//! stateful engines that sit on top of it.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Component`: a unit registered on the intercom
//!   - `RuleSource`: where rule definitions come from
//!   - `SignalStore`: persistence for learned signals
//!   - `SignalTransport`: a radio bridge delivering frames and sending dumps
//! - Provide the **in-process infrastructure**:
//!   - `Registry`: components keyed by code and grouped by type tag
//!   - `Intercom`: synchronous, re-entrant fan-out dispatch and the global
//!     variable pool
//! - Provide the built-in engines:
//!   - `RuleEngine`: evaluates every message against the loaded rules
//!   - `SignalReceiver`: debounce, learn mode and serialized transmission
//!
//! ## Dependency rule
//! Depends on `homewire-domain` only (plus `tokio` for tasks, timers and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod intercom;
pub mod ports;
pub mod registry;
pub mod rule_engine;
pub mod signal;

pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
