//! # homewire-domain
//!
//! Pure domain model for the homewire home automation hub.
//!
//! ## Responsibilities
//! - Foundational types: component and rule codes, error conventions
//! - Define **Messages** (typed requests routed by the intercom) and their
//!   **Recipients** (single code, list, broadcast-all, broadcast-by-type)
//! - Define **Replies** and the aggregation rule used for fan-out delivery
//! - Provide the **template engine** (`%name%` substitution) and the
//!   **pattern operators** used by rule events and conditions
//! - Define **Rules** (event → condition → action bindings)
//! - Define **Signals** (raw RF codes bound to named devices) and the catalog
//!   that persists them
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod code;
pub mod error;

pub mod message;
pub mod pattern;
pub mod reply;
pub mod rule;
pub mod signal;
pub mod template;
