//! Transmission cost table.
//!
//! Static, process-wide lookup of the cost (EUR/MWh) of moving power between
//! two markets. Built once at startup and shared read-only; lookups are pure.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Symmetric pairwise transmission costs keyed by "{a}-{b}".
///
/// Lookup tries both orderings, so `cost("DE", "FR") == cost("FR", "DE")`.
/// Unknown pairs resolve to zero cost rather than an error: new markets may
/// appear on the stream without configuration. Callers that need strict
/// validation check `contains` explicitly.
#[derive(Debug, Clone, Default)]
pub struct TransmissionCosts {
    table: HashMap<String, Decimal>,
}

impl TransmissionCosts {
    /// Build a table from (a, b, cost) triples.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S, Decimal)>,
        S: Into<String>,
    {
        let table = pairs
            .into_iter()
            .map(|(a, b, cost)| (format!("{}-{}", a.into(), b.into()), cost))
            .collect();

        Self { table }
    }

    /// Interconnect costs for the European day-ahead markets this system
    /// tracks. EUR per MWh.
    pub fn default_table() -> Self {
        Self::from_pairs([
            ("DE", "FR", Decimal::new(250, 2)),
            ("DE", "NL", Decimal::new(150, 2)),
            ("DE", "DK", Decimal::new(300, 2)),
            ("DE", "BE", Decimal::new(200, 2)),
            ("FR", "NL", Decimal::new(200, 2)),
            ("FR", "BE", Decimal::new(150, 2)),
            ("FR", "DK", Decimal::new(400, 2)),
            ("NL", "BE", Decimal::new(100, 2)),
            ("NL", "DK", Decimal::new(350, 2)),
            ("BE", "DK", Decimal::new(350, 2)),
        ])
    }

    /// Cost between two markets, in either order. Zero when unconfigured.
    pub fn cost(&self, market_a: &str, market_b: &str) -> Decimal {
        let forward = format!("{market_a}-{market_b}");
        if let Some(cost) = self.table.get(&forward) {
            return *cost;
        }

        let reverse = format!("{market_b}-{market_a}");
        self.table.get(&reverse).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether a pair is explicitly configured (in either order).
    pub fn contains(&self, market_a: &str, market_b: &str) -> bool {
        self.table.contains_key(&format!("{market_a}-{market_b}"))
            || self.table.contains_key(&format!("{market_b}-{market_a}"))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
