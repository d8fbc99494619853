//! Shared state for axum handlers.

use homewire_app::intercom::IntercomLink;
use homewire_domain::code::ComponentCode;

/// What every request handler needs: the sender code stamped on messages
/// and a link to the intercom.
#[derive(Clone)]
pub struct GatewayState {
    /// Code of the gateway component, used as message sender.
    pub code: ComponentCode,
    pub link: IntercomLink,
}

impl GatewayState {
    pub fn new(code: impl Into<ComponentCode>, link: IntercomLink) -> Self {
        Self {
            code: code.into(),
            link,
        }
    }
}
