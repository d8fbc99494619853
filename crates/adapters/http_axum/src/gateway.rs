//! The HTTP gateway component.

use std::sync::Arc;

use homewire_app::intercom::IntercomLink;
use homewire_app::ports::Component;
use homewire_domain::code::ComponentCode;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::router;
use crate::state::GatewayState;

/// Type tag of HTTP gateway components.
pub const HTTP_GATEWAY_KIND: &str = "http-gateway";

/// Serves the HTTP API once started.
pub struct HttpGateway {
    code: ComponentCode,
    name: String,
    config: GatewayConfig,
    link: IntercomLink,
}

impl HttpGateway {
    pub fn new(
        code: impl Into<ComponentCode>,
        name: impl Into<String>,
        config: GatewayConfig,
        link: IntercomLink,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            config,
            link,
        }
    }

    /// Bind the configured address and serve until the server fails.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Bind`] if the address cannot be bound and
    /// [`GatewayError::Serve`] if serving fails.
    pub async fn serve(&self) -> Result<(), GatewayError> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: self.config.bind.clone(),
                source,
            })?;
        tracing::info!(component = %self.code, addr = %self.config.bind, "http gateway listening");

        let app = router::build(GatewayState::new(self.code.clone(), self.link.clone()));
        axum::serve(listener, app).await.map_err(GatewayError::Serve)
    }
}

impl Component for HttpGateway {
    fn code(&self) -> &ComponentCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        HTTP_GATEWAY_KIND
    }

    fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let link = self.link.clone();
        link.spawn(async move {
            if let Err(err) = self.serve().await {
                tracing::error!(component = %self.code, error = %err, "http gateway stopped");
            }
        })
    }
}
