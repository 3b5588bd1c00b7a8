//! Post-confirmation hand-off boundaries: persistence and notification.
//!
//! Both are fire-and-forget from the conversation's point of view: a
//! failure here is logged and degrades the quote to manual follow-up,
//! never surfaced to the user as an error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::trip::QuoteRecord;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("quote record persistence failed: {0}")]
    Append(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum NotifyError {
    #[error("quote notification failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait QuoteLedger: Send + Sync {
    async fn append(&self, record: &QuoteRecord) -> Result<(), LedgerError>;
}

#[async_trait]
pub trait QuoteNotifier: Send + Sync {
    async fn notify(&self, record: &QuoteRecord) -> Result<(), NotifyError>;
}

/// Test/offline ledger keeping records in process memory.
#[derive(Clone, Default)]
pub struct InMemoryQuoteLedger {
    records: Arc<Mutex<Vec<QuoteRecord>>>,
}

impl InMemoryQuoteLedger {
    pub fn records(&self) -> Vec<QuoteRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl QuoteLedger for InMemoryQuoteLedger {
    async fn append(&self, record: &QuoteRecord) -> Result<(), LedgerError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }
}

/// Notifier that only emits a tracing event; the real channel (operator
/// email with the rendered quote) is an external adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl QuoteNotifier for LogNotifier {
    async fn notify(&self, record: &QuoteRecord) -> Result<(), NotifyError> {
        tracing::info!(
            event_name = "quote.notification_emitted",
            quote_id = %record.quote_id,
            passengers = record.passengers,
            pending_manual = record.quote_error.is_some(),
            "quote notification emitted"
        );
        Ok(())
    }
}
