//! Signal transport port — the radio bridge behind a signal receiver.

use std::future::Future;

use homewire_domain::error::HomewireError;

/// One frame decoded by the radio hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw code identifying the remote button.
    pub code: String,
    /// Hardware-specific payload needed to replay the frame.
    pub dump: String,
}

impl Frame {
    #[must_use]
    pub fn new(code: impl Into<String>, dump: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            dump: dump.into(),
        }
    }
}

/// Bidirectional radio link.
///
/// Implementations live in adapter crates (e.g. `ook`).
pub trait SignalTransport: Send + Sync + 'static {
    /// Wait for the next received frame.
    ///
    /// Returns `Ok(None)` once the link is closed.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Transport`] on I/O failure; the receiver's read
    /// loop stops on the first error.
    fn next_frame(&self) -> impl Future<Output = Result<Option<Frame>, HomewireError>> + Send;

    /// Transmit a previously recorded dump.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Transport`] when the write fails.
    fn transmit(&self, dump: &str) -> impl Future<Output = Result<(), HomewireError>> + Send;
}
