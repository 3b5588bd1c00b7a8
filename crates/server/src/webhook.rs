//! Inbound webhook route: decode utterances, run the engine, deliver
//! the replies. Always acknowledges with 200 so the platform does not
//! retry user messages we already processed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{info, warn};

use cotibot_core::ConversationEngine;
use cotibot_whatsapp::{decode_webhook, MessageSender};

#[derive(Clone)]
pub struct WebhookState {
    pub engine: Arc<ConversationEngine>,
    pub sender: Arc<dyn MessageSender>,
    pub verify_token: Option<String>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

/// Meta's subscription handshake: echo the challenge when the verify
/// token matches.
pub async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    let accepted = mode == Some("subscribe")
        && state.verify_token.is_some()
        && token == state.verify_token.as_ref();

    if accepted {
        (StatusCode::OK, challenge)
    } else {
        (StatusCode::FORBIDDEN, String::new())
    }
}

pub async fn receive(
    State(state): State<WebhookState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    let envelopes = decode_webhook(&payload);
    info!(
        event_name = "webhook.received",
        utterances = envelopes.len(),
        "webhook payload decoded"
    );

    for envelope in envelopes {
        let replies = state.engine.handle(&envelope.sender, envelope.message).await;
        for reply in replies {
            if let Err(error) = state.sender.send(&envelope.sender, &reply).await {
                warn!(
                    event_name = "webhook.reply_undelivered",
                    to = %envelope.sender,
                    error = %error,
                    "outbound reply could not be delivered"
                );
            }
        }
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::json;

    use cotibot_core::{
        ConversationEngine, InMemoryQuoteLedger, InMemorySessionStore, LogNotifier,
    };
    use cotibot_geo::GeoResolver;
    use cotibot_whatsapp::NoopSender;

    use super::{receive, verify, WebhookState};
    use crate::bootstrap::UnconfiguredRouter;

    fn state_with(verify_token: Option<&str>) -> (WebhookState, NoopSender) {
        let transport = NoopSender::default();
        let engine = ConversationEngine::new(
            Arc::new(GeoResolver::offline()),
            Arc::new(UnconfiguredRouter),
            Arc::new(InMemoryQuoteLedger::default()),
            Arc::new(LogNotifier),
            Arc::new(InMemorySessionStore::default()),
        );
        let state = WebhookState {
            engine: Arc::new(engine),
            sender: Arc::new(transport.clone()),
            verify_token: verify_token.map(str::to_string),
        };
        (state, transport)
    }

    fn query(entries: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(entries.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect())
    }

    #[tokio::test]
    async fn verification_echoes_challenge_for_matching_token() {
        let (state, _) = state_with(Some("shhh"));
        let (status, body) = verify(
            State(state),
            query(&[("hub.mode", "subscribe"), ("hub.verify_token", "shhh"), ("hub.challenge", "42")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42");
    }

    #[tokio::test]
    async fn verification_rejects_wrong_token() {
        let (state, _) = state_with(Some("shhh"));
        let (status, _) = verify(
            State(state),
            query(&[("hub.mode", "subscribe"), ("hub.verify_token", "wrong"), ("hub.challenge", "42")]),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn inbound_text_is_answered_through_the_transport() {
        let (state, transport) = state_with(None);
        let payload = json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "messages": [{
                "from": "56911112222",
                "type": "text",
                "text": { "body": "hola" }
            }] } }] }]
        });

        let status = receive(State(state), Json(payload)).await;
        assert_eq!(status, StatusCode::OK);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1, "menu reply delivered");
        assert_eq!(sent[0].1.options.len(), 2);
    }

    #[tokio::test]
    async fn undecodable_payloads_still_acknowledge() {
        let (state, transport) = state_with(None);
        let status = receive(State(state), Json(json!({ "unexpected": true }))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(transport.sent().is_empty());
    }
}
