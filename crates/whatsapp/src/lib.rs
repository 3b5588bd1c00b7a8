//! WhatsApp Cloud API integration - the chat transport boundary
//!
//! This crate keeps the conversation engine channel-agnostic:
//! - **Inbound** (`inbound`) - webhook payload decoding into engine utterances
//! - **Outbound** (`outbound`) - message builders and the `MessageSender` trait
//!
//! # Getting Started
//!
//! 1. Create a Meta app with the WhatsApp product enabled
//! 2. Point the webhook at `POST /webhook` on the cotibot server
//! 3. Set env vars: `COTIBOT_WHATSAPP_ACCESS_TOKEN`,
//!    `COTIBOT_WHATSAPP_PHONE_NUMBER_ID`
//!
//! Without credentials the server runs with a no-op transport, which is
//! the normal local-development mode.

pub mod inbound;
pub mod outbound;

pub use inbound::{decode_webhook, InboundEnvelope};
pub use outbound::{CloudApiSender, MessageSender, NoopSender, SendError};
