//! Learn mode — binds the next confirmed raw code to a device/sub name.

use std::time::Duration;

use homewire_domain::signal::Signal;
use tokio::time::Instant;

/// An active learn request.
#[derive(Debug, Clone)]
pub struct LearningSession {
    pending: Signal,
    candidate: Option<(Signal, Instant)>,
}

impl LearningSession {
    /// Start learning `pending`, a named signal with no raw code yet.
    #[must_use]
    pub fn new(pending: Signal) -> Self {
        Self {
            pending,
            candidate: None,
        }
    }

    /// The signal being learned.
    #[must_use]
    pub fn pending(&self) -> &Signal {
        &self.pending
    }

    /// Offer a received frame.
    ///
    /// The frame is accepted when it repeats the previous candidate (and,
    /// with a `confirmation` window, arrives within it). On acceptance the
    /// completed signal is returned; otherwise the frame becomes the new
    /// candidate.
    pub fn offer(
        &mut self,
        received: Signal,
        now: Instant,
        confirmation: Option<Duration>,
    ) -> Option<Signal> {
        let repeated = self.candidate.as_ref().is_some_and(|(candidate, seen)| {
            *candidate == received
                && confirmation.is_none_or(|window| now.saturating_duration_since(*seen) <= window)
        });

        if repeated {
            let mut learned = self.pending.clone();
            learned.bind(&received);
            self.candidate = None;
            return Some(learned);
        }

        self.candidate = Some((received, now));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: &str, dump: &str) -> Signal {
        Signal::received("ook", code, dump)
    }

    fn session() -> LearningSession {
        LearningSession::new(Signal::named("gate", "open"))
    }

    #[test]
    fn should_learn_when_same_code_is_received_twice() {
        let mut session = session();
        let t0 = Instant::now();

        assert!(session.offer(frame("X", "dump1"), t0, None).is_none());
        let learned = session
            .offer(frame("X", "dump1"), t0 + Duration::from_millis(300), None)
            .unwrap();

        assert_eq!(learned.device_code.as_deref(), Some("gate"));
        assert_eq!(learned.sub_code.as_deref(), Some("open"));
        assert_eq!(learned.code, "X");
        assert_eq!(learned.dump.as_deref(), Some("dump1"));
        assert_eq!(learned.manager, "ook");
    }

    #[test]
    fn should_restart_candidate_when_codes_differ() {
        let mut session = session();
        let t0 = Instant::now();

        assert!(session.offer(frame("X", "d"), t0, None).is_none());
        assert!(session.offer(frame("Y", "d"), t0, None).is_none());
        assert!(session.offer(frame("X", "d"), t0, None).is_none());
        assert!(session.offer(frame("X", "d"), t0, None).is_some());
    }

    #[test]
    fn should_reject_repeat_outside_confirmation_window() {
        let mut session = session();
        let t0 = Instant::now();
        let window = Some(Duration::from_secs(1));

        assert!(session.offer(frame("X", "d"), t0, window).is_none());
        assert!(
            session
                .offer(frame("X", "d"), t0 + Duration::from_secs(2), window)
                .is_none()
        );
        assert!(
            session
                .offer(frame("X", "d"), t0 + Duration::from_millis(2500), window)
                .is_some()
        );
    }

    #[test]
    fn should_keep_pending_signal_untouched_until_learned() {
        let mut session = session();
        session.offer(frame("X", "d"), Instant::now(), None);
        assert!(session.pending().code.is_empty());
        assert_eq!(session.pending().to_string(), "gate / open");
    }
}
