//! # homewire-adapter-ook
//!
//! Bridge to an on-off-keying (433 MHz) radio dongle speaking a line
//! protocol over a serial port.
//!
//! ## Protocol
//! - Every received frame is one line `code:dump`. Lines without exactly one
//!   `:` are noise and ignored.
//! - Transmitting writes the recorded `dump` followed by a newline.
//!
//! ## Responsibilities
//! - Implement `SignalTransport` over any async byte stream ([`LineLink`])
//! - Open the serial device ([`SerialLink::open`])
//! - Map `[[components]]` params to receiver settings ([`OokParams`])
//!
//! ## Dependency rule
//! Depends on `homewire-app` (for port traits) and `homewire-domain` (for domain types).

pub mod config;
pub mod error;
pub mod frame;
pub mod link;

pub use config::OokParams;
pub use error::OokError;
pub use frame::parse_frame;
pub use link::{LineLink, SerialLink};
