//! OOK-specific error type.

use std::path::PathBuf;

use homewire_domain::error::HomewireError;

/// Errors originating from the radio link.
#[derive(Debug, thiserror::Error)]
pub enum OokError {
    /// The serial device could not be opened.
    #[error("unable to open serial device {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the link failed.
    #[error("serial link I/O error")]
    Io(#[from] std::io::Error),
}

impl From<OokError> for HomewireError {
    fn from(err: OokError) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_device_path_when_open_fails() {
        let err = OokError::Open {
            path: PathBuf::from("/dev/ttyUSB0"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "unable to open serial device /dev/ttyUSB0");
    }

    #[test]
    fn should_convert_to_transport_error() {
        let err: HomewireError = OokError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).into();
        assert!(matches!(err, HomewireError::Transport(_)));
    }
}
