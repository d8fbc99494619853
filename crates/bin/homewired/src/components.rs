//! Component factory table — maps a `[[components]]` type tag to a constructor.

use std::path::PathBuf;
use std::sync::Arc;

use homewire_adapter_http_axum::{GatewayConfig, HTTP_GATEWAY_KIND, HttpGateway};
use homewire_adapter_ook::{OokParams, SerialLink};
use homewire_adapter_storage_toml::{TomlRuleSource, TomlSignalStore};
use homewire_adapter_system::clock::CLOCK_KIND;
use homewire_adapter_system::runlevel::RUNLEVEL_KIND;
use homewire_adapter_system::{Clock, Runlevel, RunlevelParams};
use homewire_app::intercom::{Intercom, IntercomLink};
use homewire_app::ports::Component;
use homewire_app::registry::Registry;
use homewire_app::rule_engine::{RULE_MANAGER_KIND, RuleEngine};
use homewire_app::signal::SignalReceiver;
use serde::Deserialize;

use crate::config::{ComponentConfig, ConfigError};

/// Factory tag of OOK radio receivers.
pub const OOK_RECEIVER_TYPE: &str = "ook-receiver";

type Factory = fn(&ComponentConfig, IntercomLink) -> Result<Arc<dyn Component>, ConfigError>;

const FACTORIES: &[(&str, Factory)] = &[
    (RULE_MANAGER_KIND, rule_manager),
    (OOK_RECEIVER_TYPE, ook_receiver),
    (CLOCK_KIND, clock),
    (RUNLEVEL_KIND, runlevel),
    (HTTP_GATEWAY_KIND, http_gateway),
];

/// `params` table of a `rule-manager` component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleManagerParams {
    /// Document holding the rule definitions.
    pub rules: PathBuf,
}

impl Default for RuleManagerParams {
    fn default() -> Self {
        Self {
            rules: PathBuf::from("rules.toml"),
        }
    }
}

/// Create the component described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownComponentType`] for an unknown tag, or the
/// factory's own error.
pub fn build(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    let Some((_, factory)) = FACTORIES.iter().find(|(tag, _)| *tag == config.kind) else {
        return Err(ConfigError::UnknownComponentType {
            code: config.code.clone(),
            kind: config.kind.clone(),
        });
    };
    factory(config, link)
}

/// Create every configured component and install them on `intercom`.
///
/// # Errors
///
/// Fails on the first component that cannot be created, or when two
/// components share a code.
pub fn install(intercom: &Intercom, components: &[ComponentConfig]) -> Result<(), ConfigError> {
    let mut registry = Registry::new();
    for config in components {
        let component = build(config, intercom.link())?;
        registry.register(component).map_err(ConfigError::Registry)?;
        tracing::debug!(component = %config.code, kind = %config.kind, "component registered");
    }
    tracing::info!(count = registry.len(), "components installed");
    intercom.install(registry).map_err(ConfigError::Registry)
}

fn rule_manager(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    let params: RuleManagerParams = config.params()?;
    Ok(Arc::new(RuleEngine::new(
        config.code.as_str(),
        config.display_name(),
        TomlRuleSource::new(params.rules),
        link,
    )))
}

fn ook_receiver(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    let params: OokParams = config.params()?;
    let transport = SerialLink::open(&params.serial).map_err(|err| ConfigError::Component {
        code: config.code.clone(),
        source: err.into(),
    })?;
    Ok(Arc::new(SignalReceiver::new(
        config.code.as_str(),
        config.display_name(),
        transport,
        TomlSignalStore::new(&params.signals),
        params.settings(),
        link,
    )))
}

fn clock(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    Ok(Arc::new(Clock::new(config.code.as_str(), config.display_name(), link)))
}

fn runlevel(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    let params: RunlevelParams = config.params()?;
    Ok(Arc::new(Runlevel::new(
        config.code.as_str(),
        config.display_name(),
        params,
        link,
    )))
}

fn http_gateway(
    config: &ComponentConfig,
    link: IntercomLink,
) -> Result<Arc<dyn Component>, ConfigError> {
    let params: GatewayConfig = config.params()?;
    Ok(Arc::new(HttpGateway::new(
        config.code.as_str(),
        config.display_name(),
        params,
        link,
    )))
}
