//! TOML-backed [`SignalStore`].
//!
//! One table per device, one sub-table per learned sub:
//!
//! ```toml
//! [gate]
//! name = "Gate"
//!
//! [gate.subs.open]
//! name = "Open"
//! manager = "ook"
//! code = "A1B2"
//! dump = "0101…"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use homewire_app::ports::SignalStore;
use homewire_domain::error::HomewireError;
use homewire_domain::signal::{DeviceEntry, Signal, SignalCatalog};

use crate::error::StorageError;
use crate::read_table;

/// Learned signals persisted in a TOML document.
#[derive(Debug)]
pub struct TomlSignalStore {
    path: PathBuf,
    write: Mutex<()>,
}

impl TomlSignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SignalCatalog, StorageError> {
        let Some(table) = read_table(&self.path)? else {
            return Ok(SignalCatalog::new());
        };

        let devices = table.into_iter().filter_map(|(code, value)| {
            match value.try_into::<DeviceEntry>() {
                Ok(device) => Some((code, device)),
                Err(err) => {
                    tracing::warn!(device = %code, error = %err, "skipping malformed signal device");
                    None
                }
            }
        });
        Ok(SignalCatalog::from_devices(devices))
    }

    fn write(&self, catalog: &SignalCatalog) -> Result<(), StorageError> {
        let text = toml::to_string_pretty(&catalog.to_devices())?;
        std::fs::write(&self.path, text).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SignalStore for TomlSignalStore {
    fn load(&self) -> Result<SignalCatalog, HomewireError> {
        let catalog = self.read()?;
        tracing::debug!(path = %self.path.display(), count = catalog.len(), "signals read");
        Ok(catalog)
    }

    fn append(&self, signal: &Signal) -> Result<(), HomewireError> {
        let _write = self
            .write
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut catalog = self.read()?;
        catalog.upsert(signal.clone());
        self.write(&catalog)?;
        tracing::info!(path = %self.path.display(), signal = %signal, "signal stored");
        Ok(())
    }
}
