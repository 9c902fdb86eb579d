use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::app_state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/whatsapp", get(verify).post(receive))
}

/// Query string Meta sends when (re)subscribing the webhook.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook/whatsapp — echo the challenge when the token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, StatusCode> {
    let subscribing = params.mode.as_deref() == Some("subscribe");
    let token_matches = params.verify_token.as_deref() == Some(&*state.whatsapp_verify_token);

    match params.challenge {
        Some(challenge) if subscribing && token_matches => {
            tracing::info!("WhatsApp webhook verified");
            Ok(challenge)
        }
        _ => {
            tracing::warn!(mode = ?params.mode, "WhatsApp webhook verification rejected");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl WebhookEvent {
    pub fn messages(&self) -> impl Iterator<Item = &InboundMessage> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .flat_map(|change| &change.value.messages)
    }
}

/// POST /webhook/whatsapp — acknowledge delivery; Meta retries anything but 200.
///
/// The body is parsed by hand so a payload we cannot read is still
/// acknowledged rather than redelivered forever.
pub async fn receive(body: Bytes) -> (StatusCode, &'static str) {
    metrics::counter!("whatsapp_webhook_events_total").increment(1);

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            metrics::counter!("whatsapp_webhook_unparsed_total").increment(1);
            tracing::warn!(error = %e, bytes = body.len(), "Unreadable WhatsApp webhook payload");
            return (StatusCode::OK, "EVENT_RECEIVED");
        }
    };

    let mut received = 0u64;
    for message in event.messages() {
        received += 1;
        tracing::info!(
            from = message.from.as_deref().unwrap_or("unknown"),
            kind = message.kind.as_deref().unwrap_or("unknown"),
            "WhatsApp message received"
        );
    }
    metrics::counter!("whatsapp_messages_received_total").increment(received);

    tracing::debug!(object = ?event.object, received, "WhatsApp webhook event processed");
    (StatusCode::OK, "EVENT_RECEIVED")
}
