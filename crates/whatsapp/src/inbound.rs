//! Webhook payload decoding.
//!
//! The Cloud API wraps every user message in entry/change envelopes and
//! mixes in status callbacks; only actual messages become engine
//! utterances, everything else is dropped.

use serde::Deserialize;

use cotibot_core::{Inbound, SenderId};

/// One decoded user utterance plus who sent it.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundEnvelope {
    pub sender: SenderId,
    pub message: Inbound,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    from: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextBody>,
    interactive: Option<Interactive>,
    location: Option<LocationBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

#[derive(Debug, Deserialize)]
struct Interactive {
    button_reply: Option<OptionReply>,
    list_reply: Option<OptionReply>,
}

#[derive(Debug, Deserialize)]
struct OptionReply {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LocationBody {
    latitude: f64,
    longitude: f64,
}

/// Decode a webhook body into engine utterances. Unknown or unsupported
/// message kinds are skipped, never an error: the webhook must always
/// acknowledge.
pub fn decode_webhook(payload: &serde_json::Value) -> Vec<InboundEnvelope> {
    let payload: WebhookPayload = match serde_json::from_value(payload.clone()) {
        Ok(decoded) => decoded,
        Err(error) => {
            tracing::warn!(
                event_name = "webhook.decode_failed",
                error = %error,
                "webhook payload did not match the expected shape"
            );
            return Vec::new();
        }
    };

    payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.changes)
        .flat_map(|change| change.value.messages)
        .filter_map(decode_message)
        .collect()
}

fn decode_message(message: Message) -> Option<InboundEnvelope> {
    let sender = SenderId(message.from);
    let inbound = match message.kind.as_str() {
        "text" => Inbound::Text(message.text?.body),
        "interactive" => {
            let interactive = message.interactive?;
            let reply = interactive.button_reply.or(interactive.list_reply)?;
            Inbound::Option(reply.id)
        }
        "location" => {
            let location = message.location?;
            Inbound::Location { lat: location.latitude, lon: location.longitude }
        }
        other => {
            tracing::debug!(
                event_name = "webhook.message_skipped",
                kind = %other,
                "unsupported inbound message kind"
            );
            return None;
        }
    };

    Some(InboundEnvelope { sender, message: inbound })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use cotibot_core::{Inbound, SenderId};

    use super::decode_webhook;

    fn wrap(message: serde_json::Value) -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "messages": [message] } }] }]
        })
    }

    #[test]
    fn text_message_decodes_to_text_utterance() {
        let envelopes = decode_webhook(&wrap(json!({
            "from": "56911112222",
            "type": "text",
            "text": { "body": "hola" }
        })));

        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].sender, SenderId("56911112222".to_string()));
        assert_eq!(envelopes[0].message, Inbound::Text("hola".to_string()));
    }

    #[test]
    fn button_reply_decodes_to_option_id() {
        let envelopes = decode_webhook(&wrap(json!({
            "from": "56911112222",
            "type": "interactive",
            "interactive": {
                "type": "button_reply",
                "button_reply": { "id": "confirmar_si", "title": "Sí, confirmar" }
            }
        })));

        assert_eq!(envelopes[0].message, Inbound::Option("confirmar_si".to_string()));
    }

    #[test]
    fn shared_location_decodes_to_coordinates() {
        let envelopes = decode_webhook(&wrap(json!({
            "from": "56911112222",
            "type": "location",
            "location": { "latitude": -33.45, "longitude": -70.66 }
        })));

        assert_eq!(envelopes[0].message, Inbound::Location { lat: -33.45, lon: -70.66 });
    }

    #[test]
    fn status_only_payloads_produce_no_utterances() {
        let payload = json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "delivered" }] } }] }]
        });
        assert!(decode_webhook(&payload).is_empty());
    }

    #[test]
    fn unsupported_kinds_are_skipped_not_errors() {
        let envelopes = decode_webhook(&wrap(json!({
            "from": "56911112222",
            "type": "sticker",
            "sticker": { "id": "123" }
        })));
        assert!(envelopes.is_empty());
    }

    #[test]
    fn malformed_payload_decodes_to_nothing() {
        assert!(decode_webhook(&json!({ "entry": "not-a-list" })).is_empty());
    }
}
