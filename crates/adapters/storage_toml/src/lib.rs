//! # homewire-adapter-storage-toml
//!
//! File persistence for the homewire configuration documents.
//!
//! ## Responsibilities
//! - Implement `RuleSource` over a TOML rules document (one table per rule,
//!   declaration order preserved)
//! - Implement `SignalStore` over a TOML signals document (one table per
//!   device, one sub-table per sub)
//! - Skip malformed entries with a warning instead of failing the whole load
//!
//! ## Dependency rule
//! Depends on `homewire-app` (for port traits) and `homewire-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod rule_source;
pub mod signal_store;

pub use error::StorageError;
pub use rule_source::TomlRuleSource;
pub use signal_store::TomlSignalStore;

use std::path::Path;

/// Read a TOML document as a table; a missing file reads as empty.
fn read_table(path: &Path) -> Result<Option<toml::Table>, StorageError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let table = text.parse::<toml::Table>().map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(table))
}
