pub mod sqlite_store;

use chrono::{DateTime, Utc};
use market::types::{PriceTick, SpreadOpportunity};

/// A persisted spread row: the business fact plus the insert instant.
///
/// `created_at` is distinct from the business timestamp; operators use the
/// gap between the two to measure processing latency.
#[derive(Debug, Clone)]
pub struct StoredSpread {
    pub opportunity: SpreadOpportunity,
    pub created_at: DateTime<Utc>,
}

/// Durable relational storage for prices and spreads.
///
/// Both tables are append-only: rows are facts, written once and never
/// updated. Appending the same business fields twice produces two rows —
/// the at-least-once pipeline relies on that being harmless.
#[async_trait::async_trait]
pub trait SpreadStore: Send + Sync {
    async fn append_price(&self, tick: &PriceTick) -> anyhow::Result<()>;

    async fn append_spread(&self, opportunity: &SpreadOpportunity) -> anyhow::Result<()>;

    /// Most recently inserted spreads first.
    async fn recent_spreads(&self, limit: i64) -> anyhow::Result<Vec<StoredSpread>>;

    /// Latest observed price per market.
    async fn latest_prices(&self) -> anyhow::Result<Vec<PriceTick>>;
}
