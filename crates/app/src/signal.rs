//! Signal state machine — what an RF receiver does with raw frames.
//!
//! - [`ReceptionFilter`] decides whether a frame is a new press or a repeat
//!   (anti-jam window, or two-stage confirmation with debounce);
//! - [`LearningSession`] binds the next confirmed raw code to a device/sub name;
//! - [`ChannelGuard`] serializes transmissions and enforces the channel-busy
//!   delay between them;
//! - [`SignalReceiver`] is the component tying these to a transport and a
//!   signal store.

pub mod channel;
pub mod learning;
pub mod reception;
pub mod receiver;

pub use channel::ChannelGuard;
pub use learning::LearningSession;
pub use reception::{ReceptionFilter, ReceptionPolicy};
pub use receiver::{ReceiverSettings, SIGNAL_MANAGER_KIND, SignalReceiver};

/// Signal event and command types.
pub mod messages {
    pub const DO_LEARN: &str = "signal-do-learn";
    pub const DO_FIRE: &str = "signal-do-fire";
    pub const LEARN_START: &str = "signal-event-learn-start";
    pub const LEARN_NEW_SIGNAL: &str = "signal-event-learn-new-signal";
    pub const LEARN_END: &str = "signal-event-learn-end";
    pub const RECEIVED: &str = "signal-event-received";
    pub const RECOGNIZED: &str = "signal-event-recognized";
}
