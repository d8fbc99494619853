//! Run-level component — the hub's current mode (`home`, `away`, `night`, …).
//!
//! The level is exposed as the `runlevel` variable so rule conditions can
//! depend on it, and persisted to a small TOML file:
//!
//! ```toml
//! runlevel = "away"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use homewire_app::intercom::IntercomLink;
use homewire_app::ports::{Component, ReloadOutcome};
use homewire_domain::code::ComponentCode;
use homewire_domain::error::HomewireError;
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::template::Variables;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SystemError;

/// Type tag of run-level components.
pub const RUNLEVEL_KIND: &str = "runlevel-manager";

/// Command changing the level: `{runlevel}`.
pub const DO_CHANGE: &str = "runlevel-do-change";

/// Event broadcast after the level changed: `{runlevel}`.
pub const EVENT_CHANGE: &str = "runlevel-event-change";

/// `params` table of a `runlevel-manager` component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunlevelParams {
    /// File holding the persisted level.
    pub file: PathBuf,
    /// Level used when the file is missing or unreadable.
    pub initial: String,
}

impl Default for RunlevelParams {
    fn default() -> Self {
        Self {
            file: PathBuf::from("runlevel.toml"),
            initial: "default".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RunlevelFile {
    runlevel: String,
}

/// Holds and persists the current run level.
pub struct Runlevel {
    code: ComponentCode,
    name: String,
    file: PathBuf,
    current: Mutex<String>,
    link: IntercomLink,
}

impl Runlevel {
    /// Create the component with the persisted level.
    ///
    /// A missing or unreadable file falls back to `params.initial`, which is
    /// written back.
    pub fn new(
        code: impl Into<ComponentCode>,
        name: impl Into<String>,
        params: RunlevelParams,
        link: IntercomLink,
    ) -> Self {
        let code = code.into();
        let current = match read(&params.file) {
            Ok(level) => {
                tracing::info!(component = %code, runlevel = %level, "runlevel loaded");
                level
            }
            Err(err) => {
                tracing::warn!(component = %code, error = %err, "unable to load runlevel, using initial");
                if let Err(err) = write(&params.file, &params.initial) {
                    tracing::error!(component = %code, error = %err, "unable to save runlevel");
                }
                params.initial
            }
        };
        Self {
            code,
            name: name.into(),
            file: params.file,
            current: Mutex::new(current),
            link,
        }
    }

    #[must_use]
    pub fn current(&self) -> String {
        self.lock().clone()
    }

    /// Switch to `level`, persist it and broadcast the change.
    ///
    /// Returns `false` without doing anything when `level` is already current.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Storage`] when the level cannot be persisted;
    /// the previous level is then kept.
    pub fn set(&self, level: &str) -> Result<bool, HomewireError> {
        {
            let mut current = self.lock();
            if *current == level {
                return Ok(false);
            }
            write(&self.file, level)?;
            *current = level.to_string();
        }
        tracing::info!(component = %self.code, runlevel = %level, "runlevel changed");
        self.link
            .send(&self.code, EVENT_CHANGE, json!({ "runlevel": level }));
        Ok(true)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, String> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn read(path: &Path) -> Result<String, SystemError> {
    let text = std::fs::read_to_string(path).map_err(|source| SystemError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: RunlevelFile = toml::from_str(&text).map_err(|source| SystemError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.runlevel)
}

fn write(path: &Path, level: &str) -> Result<(), SystemError> {
    let text = toml::to_string(&RunlevelFile {
        runlevel: level.to_string(),
    })?;
    std::fs::write(path, text).map_err(|source| SystemError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Component for Runlevel {
    fn code(&self) -> &ComponentCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RUNLEVEL_KIND
    }

    fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
        if message.message_type != DO_CHANGE {
            return Ok(Reply::not_found());
        }
        let level = message.require_text("runlevel")?;
        self.set(&level)?;
        Ok(Reply::success())
    }

    fn variables(&self) -> Variables {
        let mut vars = Variables::new();
        vars.insert("runlevel".to_string(), self.current().into());
        vars
    }

    fn reload(&self) -> ReloadOutcome {
        match read(&self.file) {
            Ok(level) => {
                *self.lock() = level;
                ReloadOutcome::Reloaded
            }
            Err(err) => ReloadOutcome::Failed(err.to_string()),
        }
    }
}
