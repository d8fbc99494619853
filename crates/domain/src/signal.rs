//! Signal — a raw radio code, optionally bound to a named device.
//!
//! Receivers turn every hardware frame into a transient [`Signal`] carrying
//! only the receiver code, the raw code and the transmit dump. Learned
//! signals additionally carry a device/sub identity and live in the
//! [`SignalCatalog`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::{ComponentCode, slugify};

/// A raw code plus, once learned, the device/sub it triggers.
///
/// Two signals are equal iff their receiver (`manager`) and raw `code` are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signal {
    /// Code of the receiver component that heard (or transmits) the signal.
    pub manager: ComponentCode,
    /// Raw hardware identifier.
    pub code: String,
    /// Hardware-specific payload replayed on transmit.
    pub dump: Option<String>,
    pub device_name: Option<String>,
    pub device_code: Option<String>,
    pub sub_name: Option<String>,
    pub sub_code: Option<String>,
}

impl Signal {
    /// A signal just heard by `manager`.
    #[must_use]
    pub fn received(
        manager: impl Into<ComponentCode>,
        code: impl Into<String>,
        dump: impl Into<String>,
    ) -> Self {
        Self {
            manager: manager.into(),
            code: code.into(),
            dump: Some(dump.into()),
            ..Self::default()
        }
    }

    /// A named signal with no raw code yet, as created by learn mode.
    /// Device and sub codes are slugs of the names.
    #[must_use]
    pub fn named(device_name: impl Into<String>, sub_name: impl Into<String>) -> Self {
        let device_name = device_name.into();
        let sub_name = sub_name.into();
        Self {
            device_code: Some(slugify(&device_name)),
            sub_code: Some(slugify(&sub_name)),
            device_name: Some(device_name),
            sub_name: Some(sub_name),
            ..Self::default()
        }
    }

    /// Copy receiver, raw code and dump from a received signal.
    pub fn bind(&mut self, received: &Signal) {
        self.manager = received.manager.clone();
        self.code.clone_from(&received.code);
        self.dump.clone_from(&received.dump);
    }

    /// `true` when this signal names the given device and sub codes.
    #[must_use]
    pub fn is(&self, device_code: &str, sub_code: &str) -> bool {
        self.device_code.as_deref() == Some(device_code)
            && self.sub_code.as_deref() == Some(sub_code)
    }

    /// JSON payload used by signal events.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "manager": self.manager,
            "code": self.code,
            "dump": self.dump,
            "device_code": self.device_code,
            "device_name": self.device_name,
            "sub_code": self.sub_code,
            "sub_name": self.sub_name,
        })
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.manager == other.manager && self.code == other.code
    }
}

impl Eq for Signal {}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_code = !self.code.is_empty();
        if has_code {
            write!(f, "{}/{}", self.manager, self.code)?;
        }
        match (&self.device_name, &self.sub_name) {
            (Some(device), sub) => {
                if has_code {
                    f.write_str(": ")?;
                }
                write!(f, "{device} / {}", sub.as_deref().unwrap_or(""))
            }
            (None, _) if has_code => Ok(()),
            (None, _) => f.write_str("Unknown"),
        }
    }
}

/// One device of the persisted signals document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    #[serde(default)]
    pub subs: BTreeMap<String, SubEntry>,
}

/// One sub (button, channel, …) of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEntry {
    pub name: String,
    /// Receiver component owning the signal.
    pub manager: ComponentCode,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
}

/// In-memory set of learned signals.
#[derive(Debug, Clone, Default)]
pub struct SignalCatalog {
    signals: Vec<Signal>,
}

impl SignalCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from persisted device entries.
    pub fn from_devices<I>(devices: I) -> Self
    where
        I: IntoIterator<Item = (String, DeviceEntry)>,
    {
        let mut signals = Vec::new();
        for (device_code, device) in devices {
            for (sub_code, sub) in device.subs {
                signals.push(Signal {
                    manager: sub.manager,
                    code: sub.code,
                    dump: sub.dump,
                    device_name: Some(device.name.clone()),
                    device_code: Some(device_code.clone()),
                    sub_name: Some(sub.name),
                    sub_code: Some(sub_code),
                });
            }
        }
        Self { signals }
    }

    /// Persistable form: device code → device entry.
    #[must_use]
    pub fn to_devices(&self) -> BTreeMap<String, DeviceEntry> {
        let mut out: BTreeMap<String, DeviceEntry> = BTreeMap::new();
        for signal in &self.signals {
            let (Some(device_code), Some(sub_code)) = (&signal.device_code, &signal.sub_code)
            else {
                continue;
            };
            let device = out
                .entry(device_code.clone())
                .or_insert_with(|| DeviceEntry {
                    name: signal
                        .device_name
                        .clone()
                        .unwrap_or_else(|| device_code.clone()),
                    subs: BTreeMap::new(),
                });
            device.subs.insert(
                sub_code.clone(),
                SubEntry {
                    name: signal.sub_name.clone().unwrap_or_else(|| sub_code.clone()),
                    manager: signal.manager.clone(),
                    code: signal.code.clone(),
                    dump: signal.dump.clone(),
                },
            );
        }
        out
    }

    /// The learned signal equal to `received` (same receiver and raw code).
    #[must_use]
    pub fn recognize(&self, received: &Signal) -> Option<&Signal> {
        self.signals.iter().find(|s| *s == received)
    }

    /// The learned signal for a device/sub pair.
    #[must_use]
    pub fn find(&self, device_code: &str, sub_code: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.is(device_code, sub_code))
    }

    /// Add `signal`, replacing any entry with the same device/sub codes.
    pub fn upsert(&mut self, signal: Signal) {
        let existing = match (&signal.device_code, &signal.sub_code) {
            (Some(d), Some(s)) => self.signals.iter().position(|x| x.is(d, s)),
            _ => None,
        };
        match existing {
            Some(i) => self.signals[i] = signal,
            None => self.signals.push(signal),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }
}
