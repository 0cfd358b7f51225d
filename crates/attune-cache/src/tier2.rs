use async_trait::async_trait;
use attune_core::TtlClass;

/// Optional networked KV sharing tier 1's key space (§4.2). No
/// implementation ships in this crate — deployments that configure a
/// `cache.tier2_url` wire one in at the runtime composition root.
#[async_trait]
pub trait Tier2: Send + Sync {
    async fn get(&self, key: &str) -> Option<(Vec<u8>, TtlClass)>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: TtlClass);
}
