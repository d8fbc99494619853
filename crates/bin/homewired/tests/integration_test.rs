//! End-to-end tests for the homewired stack.
//!
//! Each test wires real components (TOML-backed rule engine, run level,
//! HTTP router) onto a real intercom and drives it through the HTTP layer
//! via `tower::ServiceExt::oneshot`; no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use homewire_adapter_http_axum::router;
use homewire_adapter_http_axum::state::GatewayState;
use homewire_adapter_storage_toml::TomlRuleSource;
use homewire_adapter_system::{Runlevel, RunlevelParams};
use homewire_app::intercom::Intercom;
use homewire_app::ports::Component;
use homewire_app::registry::Registry;
use homewire_app::rule_engine::RuleEngine;
use homewire_domain::code::ComponentCode;
use homewire_domain::error::HomewireError;
use homewire_domain::message::Message;
use homewire_domain::reply::Reply;
use homewire_domain::template::Variables;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

const RULES: &str = r#"
[away-alarm]
name = "Away alarm"
events = [{ type = "runlevel-event-change", payload = { runlevel = "away" } }]

[[away-alarm.actions]]
component_to = "siren"
type = "siren-do-arm"
payload = { reason = "runlevel %runlevel%", home = "%home_name%" }
"#;

// ── Siren component ────────────────────────────────────────────────

struct Siren {
    code: ComponentCode,
    armed: mpsc::UnboundedSender<Message>,
}

impl Component for Siren {
    fn code(&self) -> &ComponentCode {
        &self.code
    }
    fn name(&self) -> &str {
        "Siren"
    }
    fn kind(&self) -> &str {
        "siren"
    }
    fn on_message(&self, message: &Message) -> Result<Reply, HomewireError> {
        if message.message_type != "siren-do-arm" {
            return Ok(Reply::not_found());
        }
        let _ = self.armed.send(message.clone());
        Ok(Reply::success())
    }
}

struct Hub {
    _dir: tempfile::TempDir,
    rules_file: std::path::PathBuf,
    intercom: Intercom,
    engine: Arc<RuleEngine<TomlRuleSource>>,
    armed: mpsc::UnboundedReceiver<Message>,
}

impl Hub {
    fn router(&self) -> axum::Router {
        router::build(GatewayState::new("http", self.intercom.link()))
    }
}

/// Build a fully-wired hub whose state lives in a scratch directory.
fn hub() -> Hub {
    let dir = tempfile::tempdir().unwrap();
    let rules_file = dir.path().join("rules.toml");
    std::fs::write(&rules_file, RULES).unwrap();

    let mut statics = Variables::new();
    statics.insert("home_name".to_string(), json!("Cottage"));
    let intercom = Intercom::new(statics);

    let engine = Arc::new(RuleEngine::new(
        "rules",
        "Rules",
        TomlRuleSource::new(&rules_file),
        intercom.link(),
    ));
    let runlevel = Arc::new(Runlevel::new(
        "runlevel",
        "Run level",
        RunlevelParams {
            file: dir.path().join("runlevel.toml"),
            initial: "home".to_string(),
        },
        intercom.link(),
    ));
    let (tx, armed) = mpsc::unbounded_channel();
    let siren = Arc::new(Siren {
        code: ComponentCode::new("siren"),
        armed: tx,
    });

    let mut registry = Registry::new();
    registry.register(Arc::clone(&engine) as Arc<dyn Component>).unwrap();
    registry.register(runlevel).unwrap();
    registry.register(siren).unwrap();
    intercom.install(registry).unwrap();

    Hub {
        _dir: dir,
        rules_file,
        intercom,
        engine,
        armed,
    }
}

async fn post(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let hub = hub();

    let resp = hub
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Rules reacting to HTTP-triggered events
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn should_fire_rule_when_runlevel_changes_over_http() {
    let mut hub = hub();

    let (status, body) = post(
        hub.router(),
        "/runlevel/runlevel-do-change",
        json!({"runlevel": "away"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runlevel"]["status"], "success");

    let armed = tokio::time::timeout(Duration::from_secs(2), hub.armed.recv())
        .await
        .expect("rule should have fired")
        .unwrap();
    assert_eq!(armed.from, "rules");
    assert_eq!(
        armed.payload,
        json!({"reason": "runlevel away", "home": "Cottage"})
    );
    assert_eq!(hub.intercom.variables()["runlevel"], "away");
}

#[tokio::test(flavor = "multi_thread")]
async fn should_not_fire_rule_when_event_does_not_match() {
    let mut hub = hub();

    let (status, _) = post(
        hub.router(),
        "/runlevel/runlevel-do-change",
        json!({"runlevel": "night"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let armed = tokio::time::timeout(Duration::from_millis(200), hub.armed.recv()).await;
    assert!(armed.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn should_reload_rules_over_http() {
    let hub = hub();
    std::fs::write(
        &hub.rules_file,
        format!("{RULES}\n[night]\nevents = [{{ type = \"cron-event\" }}]\n"),
    )
    .unwrap();

    let (status, _) = post(hub.router(), "/rules/do-reload", Value::Null).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(hub.engine.rules().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn should_return_not_found_for_unknown_component() {
    let hub = hub();

    let (status, body) = post(hub.router(), "/heater/heater-do-warm", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_null());
}
