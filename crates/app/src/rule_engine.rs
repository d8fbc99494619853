//! Rule engine — reacts to messages by evaluating and firing rules.
//!
//! The engine is a registered component observing every dispatched message.
//! Messages addressed to other components reach it through
//! [`Component::observe`], so only its own `do-reload` reloads the rules.
//! For each message it evaluates the loaded rules against the current global
//! variables; every rule that fires gets its own task, in which the actions
//! run in order. Actions flagged `async` are spawned again so their delay
//! never holds back the following actions.

pub mod loader;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use homewire_domain::code::{ComponentCode, RuleCode};
use homewire_domain::error::HomewireError;
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::rule::Rule;
use homewire_domain::template::{self, Variables};

use crate::intercom::IntercomLink;
use crate::ports::{Component, ReloadOutcome, RuleSource};

/// Type tag of rule engine components.
pub const RULE_MANAGER_KIND: &str = "rule-manager";

/// Prefix of the notification broadcast each time a rule fires.
pub const RULE_TRIGGERED_PREFIX: &str = "rule-triggered-";

/// Component evaluating rules read from a [`RuleSource`].
pub struct RuleEngine<S> {
    code: ComponentCode,
    name: String,
    source: S,
    rules: RwLock<Arc<[Rule]>>,
    link: IntercomLink,
}

impl<S: RuleSource> RuleEngine<S> {
    /// Create the engine and load its rules.
    ///
    /// A source that cannot be read leaves the engine empty; the error is
    /// logged and a later reload may recover.
    pub fn new(
        code: impl Into<ComponentCode>,
        name: impl Into<String>,
        source: S,
        link: IntercomLink,
    ) -> Self {
        let engine = Self {
            code: code.into(),
            name: name.into(),
            source,
            rules: RwLock::new(Arc::from(Vec::new())),
            link,
        };
        engine.load();
        engine
    }

    fn load(&self) -> ReloadOutcome {
        match self.source.load() {
            Ok(entries) => {
                let rules = loader::compile(entries);
                tracing::info!(component = %self.code, count = rules.len(), "rules loaded");
                *self.rules.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(rules);
                ReloadOutcome::Reloaded
            }
            Err(err) => {
                tracing::warn!(component = %self.code, error = %err, "unable to load rules, keeping previous set");
                ReloadOutcome::Failed(err.to_string())
            }
        }
    }

    /// Currently loaded rules.
    #[must_use]
    pub fn rules(&self) -> Arc<[Rule]> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Evaluate `message` against every rule and fire the matching ones.
    ///
    /// Returns the codes of the rules that fired, in rule order. Actions run
    /// on background tasks; this call never waits for them.
    pub fn process(&self, message: &Message) -> Vec<RuleCode> {
        let rules = self.rules();
        if rules.is_empty() {
            return Vec::new();
        }

        let globals = self.link.variables();
        let mut fired = Vec::new();
        for rule in rules.iter() {
            let Some(variables) = rule.evaluate(message, &globals) else {
                continue;
            };
            tracing::debug!(rule = %rule.code, %message, "rule fired");
            self.fire(rule, &template::merge(&globals, &variables), message);
            fired.push(rule.code.clone());
        }
        fired
    }

    fn fire(&self, rule: &Rule, variables: &Variables, trigger: &Message) {
        let plan: Vec<(Duration, bool, Message)> = rule
            .actions
            .iter()
            .map(|action| {
                (
                    action.delay(),
                    action.detached,
                    action.render(&self.code, variables),
                )
            })
            .collect();
        let notification = Message::broadcast(
            self.code.clone(),
            format!("{RULE_TRIGGERED_PREFIX}{}", rule.code),
            trigger.payload.clone(),
        );

        let link = self.link.clone();
        self.link.spawn(async move {
            for (delay, detached, message) in plan {
                if detached {
                    let detached_link = link.clone();
                    link.spawn(async move { send_after(&detached_link, delay, &message).await });
                } else {
                    send_after(&link, delay, &message).await;
                }
            }
            send_after(&link, Duration::ZERO, &notification).await;
        });
    }
}

async fn send_after(link: &IntercomLink, delay: Duration, message: &Message) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let reply = link.dispatch(message);
    tracing::trace!(%message, status = %reply.status, "rule action sent");
}

impl<S: RuleSource> Component for RuleEngine<S> {
    fn code(&self) -> &ComponentCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RULE_MANAGER_KIND
    }

    fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
        self.process(message);
        Ok(Reply::not_found())
    }

    fn reload(&self) -> ReloadOutcome {
        self.load()
    }

    fn observes_all(&self) -> bool {
        true
    }

    fn observe(&self, message: &Message) {
        self.process(message);
    }
}
