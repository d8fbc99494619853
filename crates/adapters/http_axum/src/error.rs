//! Gateway error type.

use homewire_domain::error::HomewireError;

/// Errors raised while serving HTTP.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The listening socket could not be bound.
    #[error("unable to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("http server failed")]
    Serve(#[source] std::io::Error),
}

impl From<GatewayError> for HomewireError {
    fn from(err: GatewayError) -> Self {
        Self::Transport(Box::new(err))
    }
}
