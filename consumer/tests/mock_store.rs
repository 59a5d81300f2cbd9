use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use market::types::{PriceTick, SpreadOpportunity};
use store::{SpreadStore, StoredSpread};

/// In-memory `SpreadStore` with an injectable outage point.
#[derive(Default, Clone)]
pub struct MockSpreadStore {
    pub spreads: Arc<Mutex<Vec<StoredSpread>>>,
    pub prices: Arc<Mutex<Vec<PriceTick>>>,
    /// Total appends allowed before the store starts failing; None = healthy.
    allow_appends: Arc<Mutex<Option<usize>>>,
}

impl MockSpreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` spread appends succeed, then fail every later one.
    pub async fn fail_after(&self, n: usize) {
        *self.allow_appends.lock().await = Some(n);
    }

    pub async fn heal(&self) {
        *self.allow_appends.lock().await = None;
    }

    pub async fn spread_count(&self) -> usize {
        self.spreads.lock().await.len()
    }

    /// How many rows exist per market pair.
    pub async fn pair_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for row in self.spreads.lock().await.iter() {
            *counts.entry(row.opportunity.market_pair.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl SpreadStore for MockSpreadStore {
    async fn append_price(&self, tick: &PriceTick) -> anyhow::Result<()> {
        self.prices.lock().await.push(tick.clone());
        Ok(())
    }

    async fn append_spread(&self, opportunity: &SpreadOpportunity) -> anyhow::Result<()> {
        if let Some(allowed) = *self.allow_appends.lock().await {
            if self.spreads.lock().await.len() >= allowed {
                anyhow::bail!("injected store outage");
            }
        }

        self.spreads.lock().await.push(StoredSpread {
            opportunity: opportunity.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_spreads(&self, limit: i64) -> anyhow::Result<Vec<StoredSpread>> {
        let spreads = self.spreads.lock().await;
        Ok(spreads.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn latest_prices(&self) -> anyhow::Result<Vec<PriceTick>> {
        let prices = self.prices.lock().await;
        let mut latest: HashMap<String, PriceTick> = HashMap::new();

        for tick in prices.iter() {
            let keep = latest
                .get(&tick.market)
                .map(|prev| tick.timestamp >= prev.timestamp)
                .unwrap_or(true);
            if keep {
                latest.insert(tick.market.clone(), tick.clone());
            }
        }

        Ok(latest.into_values().collect())
    }
}
