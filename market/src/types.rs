use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One market's price observation (EUR/MWh).
///
/// Every point inside a snapshot carries the message timestamp; the field is
/// kept per-point so downstream math can tolerate mixed-timestamp inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time prices for a set of markets, produced atomically by one
/// stream entry. Market codes are short identifiers like "DE" or "FR".
///
/// Has no identity of its own beyond the stream offset it was parsed from.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    /// Message-level timestamp shared by all markets in the snapshot.
    pub timestamp: DateTime<Utc>,
    /// Prices keyed by market code. BTreeMap keeps pair enumeration
    /// deterministic.
    pub prices: BTreeMap<String, PricePoint>,
}

impl PriceSnapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            prices: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, market: impl Into<String>, price: Decimal) {
        self.prices.insert(
            market.into(),
            PricePoint {
                price,
                timestamp: self.timestamp,
            },
        );
    }

    pub fn market_count(&self) -> usize {
        self.prices.len()
    }
}

/// Unordered market pair resolved into low/high roles for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, std::hash::Hash)]
pub struct MarketPair {
    pub low: String,
    pub high: String,
}

impl MarketPair {
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }

    /// Canonical "{low}-{high}" naming. Roles follow prices for the snapshot
    /// in question, so the same two markets can swap sides across snapshots.
    pub fn id(&self) -> String {
        format!("{}-{}", self.low, self.high)
    }
}

/// A profitable price difference between two markets at one instant.
///
/// Append-only fact: written once, never mutated. Only materialized when
/// `net_opportunity` is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadOpportunity {
    /// Canonical "{low}-{high}" pair name.
    pub market_pair: String,
    pub timestamp: DateTime<Utc>,
    /// high_price - low_price, always positive.
    pub spread: Decimal,
    pub transmission_cost: Decimal,
    /// spread - transmission_cost; the capturable margin.
    pub net_opportunity: Decimal,
    pub low_market: String,
    pub high_market: String,
    pub low_price: Decimal,
    pub high_price: Decimal,
}

impl SpreadOpportunity {
    /// Presentation ordering: best opportunity first. The calculator itself
    /// guarantees no output order; callers that care sort with this.
    pub fn by_net_desc(a: &Self, b: &Self) -> Ordering {
        b.net_opportunity
            .cmp(&a.net_opportunity)
            .then_with(|| a.market_pair.cmp(&b.market_pair))
    }
}

/// A single raw price row as appended to the `prices` table by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    pub market: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}
