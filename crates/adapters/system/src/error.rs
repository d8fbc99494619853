//! Errors of the system components.

use std::path::PathBuf;

use homewire_domain::error::HomewireError;

/// Errors raised while persisting component state.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Reading or writing the state file failed.
    #[error("unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file is not a valid document.
    #[error("invalid state file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The state could not be encoded.
    #[error("unable to encode state")]
    Encode(#[from] toml::ser::Error),
}

impl From<SystemError> for HomewireError {
    fn from(err: SystemError) -> Self {
        Self::Storage(Box::new(err))
    }
}
