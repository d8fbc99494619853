//! Axum router assembly and the message endpoint.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use homewire_domain::message::{Message, Recipient};
use homewire_domain::reply::{Reply, ReplyStatus};
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;

/// Build the gateway [`Router`].
///
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/{component}/{task}", get(dispatch).post(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// `GET|POST /{component}/{task}`: send `task` to `component`.
///
/// `component` accepts every recipient form (`_all`, `_type:<tag>`, a code).
/// The body, when present, must be a JSON document and becomes the payload.
async fn dispatch(
    State(state): State<GatewayState>,
    Path((component, task)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(err) => return respond(&Reply::failure(format!("invalid JSON body: {err}"))),
        }
    };

    let message = Message::new(state.code, Recipient::parse(&component), task, payload);
    tracing::debug!(%message, "http request dispatched");

    let link = state.link;
    let reply = match tokio::task::spawn_blocking(move || link.dispatch(&message)).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(error = %err, "dispatch task aborted");
            Reply::failure("dispatch aborted")
        }
    };
    respond(&reply)
}

fn status_of(reply: &Reply) -> StatusCode {
    match reply.status {
        ReplyStatus::NotFound => StatusCode::NOT_FOUND,
        ReplyStatus::Success => StatusCode::OK,
        ReplyStatus::Failure | ReplyStatus::NonBlockingFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn respond(reply: &Reply) -> Response {
    (status_of(reply), Json(reply.payload.clone())).into_response()
}
