//! Outbound message building and delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;

use cotibot_core::{Outbound, SenderId};

/// Cloud API interactive messages carry at most three reply buttons.
pub const MAX_BUTTONS: usize = 3;
/// Button titles are capped by the Cloud API.
pub const MAX_BUTTON_TITLE: usize = 20;

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SendError {
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &SenderId, message: &Outbound) -> Result<(), SendError>;
}

/// Render an engine prompt as a Cloud API message payload. Prompts with
/// options become interactive button messages, plain prompts become
/// text messages.
pub fn message_payload(to: &SenderId, message: &Outbound) -> Value {
    if message.options.is_empty() {
        return json!({
            "messaging_product": "whatsapp",
            "to": to.0,
            "type": "text",
            "text": { "body": message.text }
        });
    }

    let buttons: Vec<Value> = message
        .options
        .iter()
        .take(MAX_BUTTONS)
        .map(|option| {
            json!({
                "type": "reply",
                "reply": { "id": option.id, "title": truncate_title(&option.label) }
            })
        })
        .collect();

    json!({
        "messaging_product": "whatsapp",
        "to": to.0,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": message.text },
            "action": { "buttons": buttons }
        }
    })
}

fn truncate_title(label: &str) -> String {
    if label.chars().count() <= MAX_BUTTON_TITLE {
        return label.to_string();
    }
    let mut title: String = label.chars().take(MAX_BUTTON_TITLE - 1).collect();
    title.push('…');
    title
}

/// Delivery through the WhatsApp Cloud API.
pub struct CloudApiSender {
    http: reqwest::Client,
    access_token: SecretString,
    phone_number_id: String,
    base_url: String,
}

impl CloudApiSender {
    pub fn new(access_token: SecretString, phone_number_id: String) -> Result<Self, SendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|error| SendError::Delivery(error.to_string()))?;
        Ok(Self { http, access_token, phone_number_id, base_url: GRAPH_API_BASE.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl MessageSender for CloudApiSender {
    #[tracing::instrument(skip(self, message))]
    async fn send(&self, to: &SenderId, message: &Outbound) -> Result<(), SendError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let payload = message_payload(to, message);

        let response = self
            .http
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| SendError::Delivery(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Delivery(format!("cloud api returned {status}: {body}")));
        }

        Ok(())
    }
}

/// Transport used when no WhatsApp credentials are configured; keeps
/// the sent messages observable for tests and local development.
#[derive(Clone, Default)]
pub struct NoopSender {
    sent: Arc<Mutex<Vec<(SenderId, Outbound)>>>,
}

impl NoopSender {
    pub fn sent(&self) -> Vec<(SenderId, Outbound)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl MessageSender for NoopSender {
    async fn send(&self, to: &SenderId, message: &Outbound) -> Result<(), SendError> {
        tracing::info!(
            event_name = "transport.noop_send",
            to = %to,
            text = %message.text,
            options = message.options.len(),
            "outbound message dropped by noop transport"
        );
        match self.sent.lock() {
            Ok(mut sent) => sent.push((to.clone(), message.clone())),
            Err(poisoned) => poisoned.into_inner().push((to.clone(), message.clone())),
        }
        Ok(())
    }
}
