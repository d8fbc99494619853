//! # homewire-adapter-http-axum
//!
//! HTTP gateway built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Map `GET|POST /{component}/{task}` (optional JSON body) to an intercom
//!   [`Message`](homewire_domain::message::Message) sent by the gateway
//! - Map the aggregated reply to an HTTP response: the reply payload as
//!   JSON body, `404` when nobody handled the message, `200` on success,
//!   `500` otherwise
//! - Run as a component whose background task serves the router
//!
//! ## Dependency rule
//! Depends on `homewire-app` (for the intercom and component port) and
//! `homewire-domain`. Never leaks axum types into the domain.

pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod state;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{HTTP_GATEWAY_KIND, HttpGateway};
