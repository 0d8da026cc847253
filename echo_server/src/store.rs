//! Echo storage.
//!
//! Handlers talk to an injected [`EchoStore`] rather than a global map, so a
//! durable backend can replace [`MemoryEchoStore`] without touching routing.

use std::collections::HashMap;

use async_trait::async_trait;
use echo_shared::echo::EchoRecord;
use tokio::sync::RwLock;

/// Per-user, append-only echo inventories.
#[async_trait]
pub trait EchoStore: Send + Sync {
    /// Appends a record and returns the user's inventory after the append.
    async fn append(&self, user_id: &str, record: EchoRecord) -> anyhow::Result<Vec<EchoRecord>>;

    /// Returns the user's inventory in insertion order; empty for unknown users.
    async fn inventory(&self, user_id: &str) -> anyhow::Result<Vec<EchoRecord>>;
}

/// Process-lifetime store. No eviction and no durability: a restart forgets
/// everything.
#[derive(Default)]
pub struct MemoryEchoStore {
    users: RwLock<HashMap<String, Vec<EchoRecord>>>,
}

impl MemoryEchoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one echo.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl EchoStore for MemoryEchoStore {
    async fn append(&self, user_id: &str, record: EchoRecord) -> anyhow::Result<Vec<EchoRecord>> {
        let mut users = self.users.write().await;
        let items = users.entry(user_id.to_string()).or_default();
        items.push(record);
        Ok(items.clone())
    }

    async fn inventory(&self, user_id: &str) -> anyhow::Result<Vec<EchoRecord>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
