//! Signal store port — persistence for learned signals.

use homewire_domain::error::HomewireError;
use homewire_domain::signal::{Signal, SignalCatalog};

/// Persistent catalog of learned signals.
pub trait SignalStore: Send + Sync {
    /// Read the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Storage`] when the backing document cannot be
    /// read. Malformed devices are skipped, not reported.
    fn load(&self) -> Result<SignalCatalog, HomewireError>;

    /// Persist a learned signal, replacing any entry with the same
    /// device/sub codes.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Storage`] when the document cannot be written.
    fn append(&self, signal: &Signal) -> Result<(), HomewireError>;
}

impl<T: SignalStore + ?Sized> SignalStore for std::sync::Arc<T> {
    fn load(&self) -> Result<SignalCatalog, HomewireError> {
        (**self).load()
    }

    fn append(&self, signal: &Signal) -> Result<(), HomewireError> {
        (**self).append(signal)
    }
}
