//! Storage-specific error type wrapping file and TOML errors.

use std::path::PathBuf;

use homewire_domain::error::HomewireError;

/// Errors originating from the TOML storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the document failed.
    #[error("unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML.
    #[error("invalid TOML in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The catalog could not be encoded.
    #[error("unable to encode document")]
    Encode(#[from] toml::ser::Error),
}

impl From<StorageError> for HomewireError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
