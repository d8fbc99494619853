//! Intercom — synchronous, re-entrant message dispatch between components.
//!
//! [`Intercom`] owns the installed [`Registry`] and the static variables from
//! configuration. Components never hold the intercom itself: they receive an
//! [`IntercomLink`], a weak handle that can dispatch, read the global
//! variable pool and spawn background tasks. Dropping the [`Intercom`] tears
//! everything down.
//!
//! Dispatch takes no lock: the registry is immutable once installed, so a
//! handler may dispatch again from inside its own `handle` call.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock, Weak};

use homewire_domain::code::ComponentCode;
use homewire_domain::error::{HomewireError, ValidationError};
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::template::{self, Variables};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::registry::{ComponentRecord, Registry};

struct Shared {
    registry: OnceLock<Registry>,
    statics: Variables,
    runtime: Option<Handle>,
}

impl Shared {
    fn dispatch(&self, message: &Message) -> Reply {
        let Some(registry) = self.registry.get() else {
            tracing::warn!(%message, "intercom not installed, dropping message");
            return Reply::not_found();
        };

        let recipients = registry.resolve(&message.to);
        let replies: Vec<(String, Reply)> = recipients
            .iter()
            .map(|record| (record.code.to_string(), deliver(record, message)))
            .collect();

        for observer in registry.iter().filter(|r| r.instance.observes_all()) {
            if !recipients.iter().any(|r| r.code == observer.code) {
                observe(observer, message);
            }
        }

        Reply::aggregate(replies)
    }

    fn variables(&self) -> Variables {
        let mut pool = self.statics.clone();
        if let Some(registry) = self.registry.get() {
            for record in registry.iter() {
                pool.extend(record.instance.variables());
            }
        }
        pool
    }

    fn spawn<F>(&self, task: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => Some(handle.spawn(task)),
            None => {
                tracing::error!("no async runtime available, task dropped");
                None
            }
        }
    }
}

/// Call one component, isolating the caller from its panics.
fn deliver(record: &ComponentRecord, message: &Message) -> Reply {
    match catch_unwind(AssertUnwindSafe(|| record.instance.handle(message))) {
        Ok(reply) => {
            tracing::trace!(component = %record.code, %message, status = %reply.status, "delivered");
            reply
        }
        Err(_) => {
            tracing::error!(component = %record.code, %message, "component panicked while handling message");
            Reply::failure(format!("component {} panicked", record.code))
        }
    }
}

/// Show a message to an observer that is not one of its recipients.
fn observe(record: &ComponentRecord, message: &Message) {
    if catch_unwind(AssertUnwindSafe(|| record.instance.observe(message))).is_err() {
        tracing::error!(component = %record.code, %message, "component panicked while observing message");
    }
}

/// Process-wide context: the registry plus static variables.
pub struct Intercom {
    shared: Arc<Shared>,
}

impl Intercom {
    /// Create an intercom with no components yet.
    ///
    /// `statics` seeds the global variable pool. The current tokio runtime,
    /// if any, is captured for tasks spawned through links.
    #[must_use]
    pub fn new(statics: Variables) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: OnceLock::new(),
                statics,
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// A handle for components to reach the intercom.
    #[must_use]
    pub fn link(&self) -> IntercomLink {
        IntercomLink {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Install the component set. Can only be done once.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDefinition`] when a registry is
    /// already installed.
    pub fn install(&self, registry: Registry) -> Result<(), HomewireError> {
        self.shared.registry.set(registry).map_err(|_| {
            ValidationError::InvalidDefinition {
                what: "registry",
                reason: "already installed".to_string(),
            }
            .into()
        })
    }

    /// The installed registry, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&Registry> {
        self.shared.registry.get()
    }

    /// Deliver `message` to its recipients and aggregate their replies.
    ///
    /// Observers (see [`crate::ports::Component::observes_all`]) that are
    /// not recipients are shown the message through
    /// [`crate::ports::Component::observe`] and reply nothing.
    pub fn dispatch(&self, message: &Message) -> Reply {
        self.shared.dispatch(message)
    }

    /// Snapshot of the global variable pool: static variables, then every
    /// component's variables in registration order, last writer wins.
    #[must_use]
    pub fn variables(&self) -> Variables {
        self.shared.variables()
    }

    /// Start every component's background activity.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let Some(registry) = self.shared.registry.get() else {
            return Vec::new();
        };
        registry
            .iter()
            .filter_map(|record| {
                let handle = Arc::clone(&record.instance).start();
                if handle.is_some() {
                    tracing::info!(component = %record.code, kind = %record.kind, "component started");
                }
                handle
            })
            .collect()
    }
}

/// Weak handle to the [`Intercom`] held by components.
///
/// Every operation degrades gracefully once the intercom is dropped.
#[derive(Clone, Default)]
pub struct IntercomLink {
    shared: Weak<Shared>,
}

impl IntercomLink {
    /// A link attached to nothing; dispatches answer `not-found`.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// See [`Intercom::dispatch`].
    pub fn dispatch(&self, message: &Message) -> Reply {
        match self.shared.upgrade() {
            Some(shared) => shared.dispatch(message),
            None => Reply::not_found(),
        }
    }

    /// Broadcast an event from `from` to every component.
    pub fn send(
        &self,
        from: &ComponentCode,
        message_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Reply {
        self.dispatch(&Message::broadcast(from.clone(), message_type, payload))
    }

    /// See [`Intercom::variables`].
    #[must_use]
    pub fn variables(&self) -> Variables {
        self.shared
            .upgrade()
            .map(|shared| shared.variables())
            .unwrap_or_default()
    }

    /// Substitute `local` variables, with the global pool underneath, into
    /// a template.
    #[must_use]
    pub fn substitute(&self, template: &serde_json::Value, local: &Variables) -> serde_json::Value {
        let variables = template::merge(&self.variables(), local);
        template::substitute(template, &variables)
    }

    /// Spawn a background task on the intercom's runtime.
    pub fn spawn<F>(&self, task: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.shared.upgrade() {
            Some(shared) => shared.spawn(task),
            None => Handle::try_current().ok().map(|handle| handle.spawn(task)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use homewire_domain::message::Recipient;
    use homewire_domain::reply::ReplyStatus;
    use serde_json::json;

    use super::*;
    use crate::ports::{Component, DO_RELOAD, ReloadOutcome};

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Ignore,
        Panic,
        Forward,
    }

    struct Probe {
        code: ComponentCode,
        kind: &'static str,
        behaviour: Behaviour,
        seen: Mutex<Vec<String>>,
        vars: Variables,
        observer: bool,
        reloads: AtomicUsize,
        link: IntercomLink,
    }

    impl Probe {
        fn new(code: &str, kind: &'static str, behaviour: Behaviour) -> Self {
            Self {
                code: ComponentCode::from(code),
                kind,
                behaviour,
                seen: Mutex::new(Vec::new()),
                vars: Variables::new(),
                observer: false,
                reloads: AtomicUsize::new(0),
                link: IntercomLink::detached(),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Component for Probe {
        fn code(&self) -> &ComponentCode {
            &self.code
        }
        fn name(&self) -> &str {
            "Probe"
        }
        fn kind(&self) -> &str {
            self.kind
        }
        fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
            self.seen.lock().unwrap().push(message.message_type.clone());
            match self.behaviour {
                Behaviour::Succeed => Ok(Reply::success_with(json!({"from": self.code}))),
                Behaviour::Fail => Err(HomewireError::Transport("cable cut".into())),
                Behaviour::Ignore => Ok(Reply::not_found()),
                Behaviour::Panic => panic!("boom"),
                Behaviour::Forward => {
                    if message.message_type == "ping" {
                        let inner = Message::new(
                            self.code.clone(),
                            Recipient::Code("b".into()),
                            "pong",
                            serde_json::Value::Null,
                        );
                        Ok(self.link.dispatch(&inner))
                    } else {
                        Ok(Reply::not_found())
                    }
                }
            }
        }
        fn variables(&self) -> Variables {
            self.vars.clone()
        }
        fn reload(&self) -> ReloadOutcome {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            ReloadOutcome::Reloaded
        }
        fn observes_all(&self) -> bool {
            self.observer
        }
        fn observe(&self, message: &Message) {
            self.seen.lock().unwrap().push(message.message_type.clone());
        }
    }

    fn install(intercom: &Intercom, probes: Vec<Arc<Probe>>) {
        let mut registry = Registry::new();
        for probe in probes {
            registry.register(probe).unwrap();
        }
        intercom.install(registry).unwrap();
    }

    fn to(recipient: Recipient, kind: &str) -> Message {
        Message::new("test", recipient, kind, serde_json::Value::Null)
    }

    #[test]
    fn should_deliver_only_to_addressed_component() {
        let intercom = Intercom::new(Variables::new());
        let a = Arc::new(Probe::new("a", "t", Behaviour::Succeed));
        let b = Arc::new(Probe::new("b", "t", Behaviour::Succeed));
        install(&intercom, vec![a.clone(), b.clone()]);

        let reply = intercom.dispatch(&to(Recipient::Code("a".into()), "hello"));

        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(a.seen(), ["hello"]);
        assert!(b.seen().is_empty());
    }

    #[test]
    fn should_aggregate_broadcast_replies_per_recipient() {
        let intercom = Intercom::new(Variables::new());
        let a = Arc::new(Probe::new("a", "t", Behaviour::Succeed));
        let b = Arc::new(Probe::new("b", "t", Behaviour::Ignore));
        let c = Arc::new(Probe::new("c", "t", Behaviour::Fail));
        install(&intercom, vec![a, b, c]);

        let reply = intercom.dispatch(&to(Recipient::All, "hello"));

        assert_eq!(reply.status, ReplyStatus::Failure);
        let payload = reply.payload.as_object().unwrap();
        assert_eq!(payload.keys().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(payload["a"]["status"], "success");
        assert_eq!(payload["c"]["payload"]["message"], "transport error: cable cut");
    }

    #[test]
    fn should_return_not_found_when_nobody_handles() {
        let intercom = Intercom::new(Variables::new());
        install(
            &intercom,
            vec![
                Arc::new(Probe::new("a", "t", Behaviour::Ignore)),
                Arc::new(Probe::new("b", "t", Behaviour::Ignore)),
            ],
        );
        let reply = intercom.dispatch(&to(Recipient::All, "hello"));
        assert_eq!(reply.status, ReplyStatus::NotFound);
    }

    #[test]
    fn should_keep_delivering_when_a_component_panics() {
        let intercom = Intercom::new(Variables::new());
        let a = Arc::new(Probe::new("a", "t", Behaviour::Panic));
        let b = Arc::new(Probe::new("b", "t", Behaviour::Succeed));
        install(&intercom, vec![a, b.clone()]);

        let reply = intercom.dispatch(&to(Recipient::All, "hello"));

        assert_eq!(reply.status, ReplyStatus::Failure);
        assert_eq!(b.seen(), ["hello"]);
        assert_eq!(reply.payload["b"]["status"], "success");
    }

    #[test]
    fn should_deliver_by_type() {
        let intercom = Intercom::new(Variables::new());
        let cam = Arc::new(Probe::new("cam", "camera", Behaviour::Succeed));
        let ook = Arc::new(Probe::new("ook", "signal-manager", Behaviour::Succeed));
        install(&intercom, vec![cam.clone(), ook.clone()]);

        intercom.dispatch(&to(Recipient::Type("camera".into()), "snap"));

        assert_eq!(cam.seen(), ["snap"]);
        assert!(ook.seen().is_empty());
    }

    #[test]
    fn should_allow_handlers_to_dispatch_recursively() {
        let intercom = Intercom::new(Variables::new());
        let mut a = Probe::new("a", "t", Behaviour::Forward);
        a.link = intercom.link();
        let b = Arc::new(Probe::new("b", "t", Behaviour::Succeed));
        install(&intercom, vec![Arc::new(a), b.clone()]);

        let reply = intercom.dispatch(&to(Recipient::Code("a".into()), "ping"));

        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(b.seen(), ["pong"]);
        assert_eq!(reply.payload["a"]["payload"]["b"]["status"], "success");
    }

    #[test]
    fn should_offer_every_message_to_observers() {
        let intercom = Intercom::new(Variables::new());
        let a = Arc::new(Probe::new("a", "t", Behaviour::Succeed));
        let mut watcher = Probe::new("w", "rule-manager", Behaviour::Ignore);
        watcher.observer = true;
        let watcher = Arc::new(watcher);
        install(&intercom, vec![a, watcher.clone()]);

        intercom.dispatch(&to(Recipient::Code("a".into()), "direct"));
        intercom.dispatch(&to(Recipient::All, "broadcast"));

        assert_eq!(watcher.seen(), ["direct", "broadcast"]);
    }

    #[test]
    fn should_deliver_only_to_addressed_component_when_observer_installed() {
        let intercom = Intercom::new(Variables::new());
        let a = Arc::new(Probe::new("a", "t", Behaviour::Ignore));
        let b = Arc::new(Probe::new("b", "t", Behaviour::Succeed));
        let mut watcher = Probe::new("w", "rule-manager", Behaviour::Succeed);
        watcher.observer = true;
        let watcher = Arc::new(watcher);
        install(&intercom, vec![a.clone(), b.clone(), watcher.clone()]);

        let reply = intercom.dispatch(&to(Recipient::Code("a".into()), DO_RELOAD));

        assert_eq!(reply.status, ReplyStatus::Success);
        let payload = reply.payload.as_object().unwrap();
        assert_eq!(payload.keys().collect::<Vec<_>>(), ["a"]);
        assert_eq!(a.reloads.load(Ordering::SeqCst), 1);
        assert!(b.seen().is_empty());
        assert_eq!(b.reloads.load(Ordering::SeqCst), 0);
        assert_eq!(watcher.seen(), [DO_RELOAD]);
        assert_eq!(watcher.reloads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_merge_variables_with_last_writer_winning() {
        let mut statics = Variables::new();
        statics.insert("home".into(), json!("Paris"));
        statics.insert("runlevel".into(), json!("boot"));
        let intercom = Intercom::new(statics);

        let mut a = Probe::new("a", "t", Behaviour::Ignore);
        a.vars.insert("runlevel".into(), json!("home"));
        let mut b = Probe::new("b", "t", Behaviour::Ignore);
        b.vars.insert("runlevel".into(), json!("away"));
        install(&intercom, vec![Arc::new(a), Arc::new(b)]);

        let vars = intercom.variables();
        assert_eq!(vars["home"], "Paris");
        assert_eq!(vars["runlevel"], "away");
    }

    #[test]
    fn should_substitute_local_over_global_variables() {
        let mut statics = Variables::new();
        statics.insert("who".into(), json!("world"));
        statics.insert("where".into(), json!("home"));
        let intercom = Intercom::new(statics);
        install(&intercom, Vec::new());

        let mut local = Variables::new();
        local.insert("who".into(), json!("garage"));
        let out = intercom
            .link()
            .substitute(&json!({"text": "%who% at %where%"}), &local);
        assert_eq!(out, json!({"text": "garage at home"}));
    }

    #[test]
    fn should_refuse_second_install() {
        let intercom = Intercom::new(Variables::new());
        install(&intercom, Vec::new());
        assert!(intercom.install(Registry::new()).is_err());
    }

    #[test]
    fn should_answer_not_found_when_intercom_dropped() {
        let intercom = Intercom::new(Variables::new());
        let link = intercom.link();
        drop(intercom);
        let reply = link.dispatch(&to(Recipient::All, "hello"));
        assert_eq!(reply.status, ReplyStatus::NotFound);
        assert!(link.variables().is_empty());
    }
}
