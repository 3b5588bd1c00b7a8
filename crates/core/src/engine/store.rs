use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::session::{QuoteSession, SenderId};

/// Volatile session table keyed by sender identity.
///
/// Callers must guarantee at most one in-flight handler per sender; the
/// store serializes individual operations but not read-modify-write
/// sequences. The transport delivers each sender's messages in order.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_or_create(&self, sender: &SenderId) -> QuoteSession;
    async fn save(&self, session: QuoteSession);
    async fn remove(&self, sender: &SenderId);
    async fn len(&self) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, QuoteSession>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, sender: &SenderId) -> QuoteSession {
        if let Some(session) = self.sessions.read().await.get(&sender.0) {
            return session.clone();
        }

        let session = QuoteSession::new(sender.clone());
        self.sessions.write().await.insert(sender.0.clone(), session.clone());
        session
    }

    async fn save(&self, session: QuoteSession) {
        self.sessions.write().await.insert(session.sender.0.clone(), session);
    }

    async fn remove(&self, sender: &SenderId) {
        self.sessions.write().await.remove(&sender.0);
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
