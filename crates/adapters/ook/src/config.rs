//! OOK receiver parameters.

use std::path::PathBuf;
use std::time::Duration;

use homewire_app::signal::{ReceiverSettings, ReceptionPolicy};
use serde::Deserialize;

/// `params` table of an `ook-receiver` component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OokParams {
    /// Serial device of the radio dongle. Line settings (baud rate, raw
    /// mode) are expected to be configured on the device beforehand.
    pub serial: PathBuf,
    /// Document holding the learned signals.
    pub signals: PathBuf,
    /// Minimum spacing between transmissions, in milliseconds. Receiving a
    /// frame also occupies the channel for this long.
    pub signals_interval_ms: u64,
    /// Window in which a code must be heard twice to be raised, in milliseconds.
    pub confirmation_interval_ms: u64,
    /// Quiet period after a raised code, in milliseconds.
    pub debounce_interval_ms: u64,
    /// When set, raise codes on first sighting and suppress repeats for
    /// this many milliseconds instead of requiring a confirmation.
    pub anti_jam_ms: Option<u64>,
    /// Maximum delay between the two frames confirming a learned code, in
    /// milliseconds. Unset only requires them to be consecutive.
    pub learn_confirmation_ms: Option<u64>,
}

impl OokParams {
    /// Timing settings handed to the signal receiver.
    #[must_use]
    pub fn settings(&self) -> ReceiverSettings {
        let policy = match self.anti_jam_ms {
            Some(window) => ReceptionPolicy::AntiJam {
                window: Duration::from_millis(window),
            },
            None => ReceptionPolicy::Confirmed {
                confirmation: Duration::from_millis(self.confirmation_interval_ms),
                debounce: Duration::from_millis(self.debounce_interval_ms),
            },
        };
        ReceiverSettings {
            policy,
            busy_for: Duration::from_millis(self.signals_interval_ms),
            learn_confirmation: self.learn_confirmation_ms.map(Duration::from_millis),
        }
    }
}

impl Default for OokParams {
    fn default() -> Self {
        Self {
            serial: PathBuf::from("/dev/ttyUSB0"),
            signals: PathBuf::from("signals.toml"),
            signals_interval_ms: 500,
            confirmation_interval_ms: 1000,
            debounce_interval_ms: 3000,
            anti_jam_ms: None,
            learn_confirmation_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let params = OokParams::default();
        assert_eq!(params.serial, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(params.signals, PathBuf::from("signals.toml"));
        assert_eq!(params.settings(), ReceiverSettings::default());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            serial = "/dev/ttyACM1"
            signals = "/var/lib/homewire/signals.toml"
            signals_interval_ms = 800
            confirmation_interval_ms = 600
            debounce_interval_ms = 2000
            learn_confirmation_ms = 1500
        "#;
        let params: OokParams = toml::from_str(toml).unwrap();
        assert_eq!(params.serial, PathBuf::from("/dev/ttyACM1"));

        let settings = params.settings();
        assert_eq!(settings.busy_for, Duration::from_millis(800));
        assert_eq!(
            settings.policy,
            ReceptionPolicy::Confirmed {
                confirmation: Duration::from_millis(600),
                debounce: Duration::from_millis(2000),
            }
        );
        assert_eq!(settings.learn_confirmation, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let params: OokParams = toml::from_str(r#"serial = "/dev/ttyUSB3""#).unwrap();
        assert_eq!(params.serial, PathBuf::from("/dev/ttyUSB3"));
        assert_eq!(params.signals_interval_ms, 500);
        assert!(params.anti_jam_ms.is_none());
    }

    #[test]
    fn should_select_anti_jam_policy_when_window_is_set() {
        let params: OokParams = toml::from_str("anti_jam_ms = 5000").unwrap();
        assert_eq!(
            params.settings().policy,
            ReceptionPolicy::AntiJam {
                window: Duration::from_secs(5)
            }
        );
    }
}
