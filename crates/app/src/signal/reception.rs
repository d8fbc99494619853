//! Reception filter — tells new button presses apart from repeats and noise.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// How repeated raw codes are filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionPolicy {
    /// A code is new unless it was accepted less than `window` ago.
    AntiJam { window: Duration },
    /// A code is new when it is heard a second time within `confirmation`
    /// and was not already raised less than `debounce` ago.
    Confirmed {
        confirmation: Duration,
        debounce: Duration,
    },
}

impl Default for ReceptionPolicy {
    fn default() -> Self {
        Self::Confirmed {
            confirmation: Duration::from_secs(1),
            debounce: Duration::from_secs(3),
        }
    }
}

/// Recent-code tables of one receiver.
#[derive(Debug, Default)]
pub struct ReceptionFilter {
    policy: ReceptionPolicy,
    received: HashMap<String, Instant>,
    confirmed: HashMap<String, Instant>,
}

impl ReceptionFilter {
    #[must_use]
    pub fn new(policy: ReceptionPolicy) -> Self {
        Self {
            policy,
            received: HashMap::new(),
            confirmed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ReceptionPolicy {
        self.policy
    }

    /// Record a frame carrying `code` at `now`; `true` when it should be
    /// raised as an event.
    pub fn accept(&mut self, code: &str, now: Instant) -> bool {
        match self.policy {
            ReceptionPolicy::AntiJam { window } => {
                prune(&mut self.received, now, window);
                if self.received.contains_key(code) {
                    return false;
                }
                self.received.insert(code.to_string(), now);
                true
            }
            ReceptionPolicy::Confirmed {
                confirmation,
                debounce,
            } => {
                prune(&mut self.received, now, confirmation);
                prune(&mut self.confirmed, now, debounce);

                let heard_before = self.received.insert(code.to_string(), now).is_some();
                if !heard_before || self.confirmed.contains_key(code) {
                    return false;
                }
                self.confirmed.insert(code.to_string(), now);
                true
            }
        }
    }
}

fn prune(table: &mut HashMap<String, Instant>, now: Instant, window: Duration) {
    table.retain(|_, seen| now.saturating_duration_since(*seen) < window);
}
