//! SQLite persistence for confirmed quote records.

pub mod connection;
pub mod ledger;
pub mod migrations;

pub use connection::{connect, connect_with_settings, DbPool};
pub use ledger::SqlQuoteLedger;
