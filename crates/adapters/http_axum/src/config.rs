//! HTTP gateway configuration.

use serde::Deserialize;

/// `params` table of an `http-gateway` component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// `host:port` to listen on.
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}
