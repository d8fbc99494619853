//! Signal receiver — the component behind an RF bridge.
//!
//! Raw frames come from a [`SignalTransport`]; while idle they go through
//! the [`ReceptionFilter`] and are broadcast as `signal-event-received`
//! (plus `signal-event-recognized` for learned ones). While a
//! [`LearningSession`] is active they are learn candidates instead.
//! Transmissions go through the [`ChannelGuard`] on their own tasks.
//!
//! State is computed under the receiver's lock; events are broadcast and
//! learned signals persisted after releasing it, since handlers of those
//! events may call back into the receiver.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use homewire_domain::code::{ComponentCode, slugify};
use homewire_domain::error::HomewireError;
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::signal::{Signal, SignalCatalog};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::messages;
use super::{ChannelGuard, LearningSession, ReceptionFilter, ReceptionPolicy};
use crate::intercom::IntercomLink;
use crate::lock;
use crate::ports::{Component, Frame, ReloadOutcome, SignalStore, SignalTransport};

/// Type tag of signal receiver components.
pub const SIGNAL_MANAGER_KIND: &str = "signal-manager";

/// Timing settings of a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverSettings {
    pub policy: ReceptionPolicy,
    /// Minimum spacing between two transmissions.
    pub busy_for: Duration,
    /// Maximum delay between the two frames confirming a learned code;
    /// `None` only requires them to be consecutive.
    pub learn_confirmation: Option<Duration>,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            policy: ReceptionPolicy::default(),
            busy_for: Duration::from_millis(500),
            learn_confirmation: None,
        }
    }
}

/// What a received frame led to.
enum Reaction {
    Ignored,
    Raised(Vec<(&'static str, serde_json::Value)>),
    Learned(Signal),
}

#[derive(Debug, Default)]
struct State {
    filter: ReceptionFilter,
    learning: Option<LearningSession>,
    catalog: SignalCatalog,
}

/// A receiver component bound to one radio transport.
pub struct SignalReceiver<T, S> {
    code: ComponentCode,
    name: String,
    settings: ReceiverSettings,
    transport: Arc<T>,
    store: S,
    state: Mutex<State>,
    channel: Arc<ChannelGuard>,
    link: IntercomLink,
}

impl<T, S> SignalReceiver<T, S>
where
    T: SignalTransport,
    S: SignalStore,
{
    /// Create a receiver and load the learned signals from `store`.
    ///
    /// An unreadable store starts the receiver with an empty catalog.
    pub fn new(
        code: impl Into<ComponentCode>,
        name: impl Into<String>,
        transport: T,
        store: S,
        settings: ReceiverSettings,
        link: IntercomLink,
    ) -> Self {
        let code = code.into();
        let catalog = store.load().unwrap_or_else(|err| {
            tracing::warn!(component = %code, error = %err, "unable to load signals, starting empty");
            SignalCatalog::new()
        });
        Self {
            name: name.into(),
            settings,
            transport: Arc::new(transport),
            store,
            state: Mutex::new(State {
                filter: ReceptionFilter::new(settings.policy),
                learning: None,
                catalog,
            }),
            channel: Arc::new(ChannelGuard::new(settings.busy_for)),
            link,
            code,
        }
    }

    #[must_use]
    pub fn is_learning(&self) -> bool {
        lock(&self.state).learning.is_some()
    }

    /// Snapshot of the learned signals.
    #[must_use]
    pub fn catalog(&self) -> SignalCatalog {
        lock(&self.state).catalog.clone()
    }

    /// Handle one frame received from the transport.
    ///
    /// Frames that raise an event or complete a learn request mark the
    /// channel busy; suppressed repeats do not.
    pub fn on_frame(&self, frame: Frame) {
        let received = Signal::received(self.code.clone(), frame.code, frame.dump);
        tracing::info!(component = %self.code, signal = %received, "signal received");

        match self.react(received, Instant::now()) {
            Reaction::Ignored => {}
            Reaction::Raised(events) => {
                self.channel.mark_busy();
                for (kind, payload) in events {
                    self.link.send(&self.code, kind, payload);
                }
            }
            Reaction::Learned(learned) => {
                self.channel.mark_busy();
                self.complete_learning(learned);
            }
        }
    }

    fn react(&self, received: Signal, now: Instant) -> Reaction {
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        if let Some(session) = state.learning.as_mut() {
            let Some(learned) = session.offer(received, now, self.settings.learn_confirmation)
            else {
                return Reaction::Ignored;
            };
            state.learning = None;
            return Reaction::Learned(learned);
        }

        if !state.filter.accept(&received.code, now) {
            tracing::debug!(component = %self.code, signal = %received, "repeated signal suppressed");
            return Reaction::Ignored;
        }

        let mut events = vec![(messages::RECEIVED, received.to_payload())];
        if let Some(known) = state.catalog.recognize(&received) {
            tracing::info!(component = %self.code, signal = %known, "signal recognized");
            events.push((messages::RECOGNIZED, known.to_payload()));
        }
        Reaction::Raised(events)
    }

    /// Persist a learned signal and announce it. Runs without the state lock.
    fn complete_learning(&self, learned: Signal) {
        tracing::info!(component = %self.code, signal = %learned, "signal learned");
        if let Err(err) = self.store.append(&learned) {
            tracing::error!(component = %self.code, signal = %learned, error = %err, "unable to persist learned signal");
        }
        let payload = learned.to_payload();
        lock(&self.state).catalog.upsert(learned);

        self.link.send(&self.code, messages::LEARN_NEW_SIGNAL, payload);
        self.link
            .send(&self.code, messages::LEARN_END, serde_json::Value::Null);
    }

    fn start_learning(&self, message: &Message) -> Result<Reply, HomewireError> {
        let device = message.require_text("device")?;
        let sub = message.require_text("sub")?;
        let pending = Signal::named(device, sub);
        let payload = pending.to_payload();

        tracing::info!(component = %self.code, signal = %pending, "learning start");
        lock(&self.state).learning = Some(LearningSession::new(pending));

        self.link.send(&self.code, messages::LEARN_START, payload);
        Ok(Reply::success())
    }

    fn stop_learning(&self) -> Reply {
        if lock(&self.state).learning.take().is_some() {
            tracing::info!(component = %self.code, "exiting learning mode");
        }
        Reply::success()
    }

    fn fire_by_name(&self, message: &Message) -> Result<Reply, HomewireError> {
        let device = slugify(&message.require_text("device")?);
        let sub = slugify(&message.require_text("sub")?);
        let signal = lock(&self.state).catalog.find(&device, &sub).cloned();

        match signal {
            Some(signal) if signal.manager == self.code => {
                self.fire(&signal);
                Ok(Reply::success_with(signal.to_payload()))
            }
            _ => Ok(Reply::not_found()),
        }
    }

    /// Queue `signal` for transmission without waiting for the channel.
    pub fn fire(&self, signal: &Signal) -> Option<JoinHandle<()>> {
        let dump = signal.dump.clone().unwrap_or_else(|| signal.code.clone());
        let transport = Arc::clone(&self.transport);
        let channel = Arc::clone(&self.channel);
        let code = self.code.clone();
        let label = signal.to_string();

        tracing::info!(component = %code, signal = %label, "queuing signal");
        self.link.spawn(async move {
            match channel.transmit(|| transport.transmit(&dump)).await {
                Ok(()) => tracing::info!(component = %code, signal = %label, "signal fired"),
                Err(err) => {
                    tracing::error!(component = %code, signal = %label, error = %err, "unable to fire signal");
                }
            }
        })
    }
}

impl<T, S> SignalReceiver<T, S>
where
    T: SignalTransport,
    S: SignalStore + 'static,
{
    async fn read_loop(self: Arc<Self>) {
        loop {
            match self.transport.next_frame().await {
                Ok(Some(frame)) => self.on_frame(frame),
                Ok(None) => {
                    tracing::info!(component = %self.code, "signal transport closed");
                    break;
                }
                Err(err) => {
                    tracing::error!(component = %self.code, error = %err, "signal transport failed, stopping read loop");
                    break;
                }
            }
        }
    }
}

impl<T, S> Component for SignalReceiver<T, S>
where
    T: SignalTransport,
    S: SignalStore + 'static,
{
    fn code(&self) -> &ComponentCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        SIGNAL_MANAGER_KIND
    }

    fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
        match message.message_type.as_str() {
            messages::DO_LEARN => self.start_learning(message),
            messages::LEARN_END => Ok(self.stop_learning()),
            messages::DO_FIRE => self.fire_by_name(message),
            _ => Ok(Reply::not_found()),
        }
    }

    fn reload(&self) -> ReloadOutcome {
        match self.store.load() {
            Ok(catalog) => {
                tracing::info!(component = %self.code, count = catalog.len(), "signals reloaded");
                lock(&self.state).catalog = catalog;
                ReloadOutcome::Reloaded
            }
            Err(err) => ReloadOutcome::Failed(err.to_string()),
        }
    }

    fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let link = self.link.clone();
        link.spawn(self.read_loop())
    }
}
