// Repository trait for ground-truth cluster queries
use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// Connectivity of every peer in the cluster `member` belongs to,
    /// keyed by hostname. `true` means the peer is connected.
    async fn host_connection_states(&self, member: &str) -> Result<BTreeMap<String, bool>>;
}
