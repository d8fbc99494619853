//! Component port — the contract every unit registered on the intercom implements.
//!
//! A component is a long-lived object that receives [`Message`]s
//! synchronously, contributes to the global variable pool and may own a
//! background task. Concrete components live in adapter crates (clock,
//! radio receivers, HTTP gateway) or in this crate (rule engine).

use std::sync::Arc;

use homewire_domain::code::ComponentCode;
use homewire_domain::error::HomewireError;
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::template::Variables;
use tokio::task::JoinHandle;

/// Message type asking a component to re-read its configuration.
pub const DO_RELOAD: &str = "do-reload";

/// Result of [`Component::reload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// New settings were applied.
    Reloaded,
    /// Settings could not be applied; the previous state is kept.
    Failed(String),
    /// The component has nothing to reload.
    Unchanged,
}

impl ReloadOutcome {
    /// Reply sent back for a `do-reload` request.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        match self {
            Self::Reloaded => Reply::success(),
            Self::Failed(reason) => Reply::failure(reason),
            Self::Unchanged => Reply::not_found(),
        }
    }
}

/// A unit registered on the intercom.
///
/// Handlers run synchronously on the dispatching caller's thread and may
/// themselves dispatch (re-entrancy). Implementations must therefore never
/// hold one of their own locks while dispatching.
pub trait Component: Send + Sync {
    /// Unique code in the registry.
    fn code(&self) -> &ComponentCode;

    /// Display name.
    fn name(&self) -> &str;

    /// Type tag used by `_type:<tag>` broadcasts.
    fn kind(&self) -> &str;

    /// Component-specific handling.
    ///
    /// Return `Ok(Reply::not_found())` for message types the component does
    /// not know about.
    ///
    /// # Errors
    ///
    /// Any error is turned into a failure reply by [`Component::handle`].
    fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
        let _ = message;
        Ok(Reply::not_found())
    }

    /// Entry point used by the intercom.
    ///
    /// Falls back to [`Component::reload`] for unhandled `do-reload`
    /// requests and converts errors into
    /// `Reply { failure, {message: <description>} }`.
    fn handle(&self, message: &Message) -> Reply {
        match self.on_message(message) {
            Ok(reply) if !reply.is_handled() && message.message_type == DO_RELOAD => {
                self.reload().into_reply()
            }
            Ok(reply) => reply,
            Err(err) => Reply::failure(err.to_string()),
        }
    }

    /// Values this component contributes to the global variable pool.
    ///
    /// Called on every condition check; must be cheap and side-effect free.
    fn variables(&self) -> Variables {
        Variables::new()
    }

    /// Re-read the component's own configuration.
    fn reload(&self) -> ReloadOutcome {
        ReloadOutcome::Unchanged
    }

    /// Observe every dispatched message, not only the ones addressed to it.
    fn observes_all(&self) -> bool {
        false
    }

    /// Side-channel view of a message addressed to other components.
    ///
    /// Only called when [`Component::observes_all`] is set. Nothing is
    /// replied and the `do-reload` fallback of [`Component::handle`] does
    /// not apply.
    fn observe(&self, message: &Message) {
        let _ = message;
    }

    /// Begin the component's background activity, if any.
    ///
    /// Called once after the registry is installed.
    fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        None
    }
}
