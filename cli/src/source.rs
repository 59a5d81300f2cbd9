//! Mock price source.
//!
//! Random-walk generator over the European day-ahead markets, standing in
//! for a real market feed. Each tick appends one raw price row per market
//! and publishes one snapshot entry onto the stream.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Timelike, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tokio::sync::watch;

use market::types::{PriceSnapshot, PriceTick};
use store::SpreadStore;
use stream::TickStream;

/// Base prices (EUR/MWh).
const BASE_PRICES: [(&str, f64); 5] = [
    ("DE", 75.0),
    ("FR", 85.0),
    ("NL", 73.0),
    ("BE", 80.0),
    ("AT", 78.0),
];

pub struct PriceSource {
    prices: BTreeMap<&'static str, f64>,
    rng: StdRng,
}

impl Default for PriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceSource {
    pub fn new() -> Self {
        Self {
            prices: BASE_PRICES.into_iter().collect(),
            rng: StdRng::from_entropy(),
        }
    }

    /// One random-walk step. NL tracks 70 % of DE's move (interconnected
    /// grids); every market mean-reverts toward its base, and the result is
    /// scaled by the time-of-day multiplier.
    pub fn tick(&mut self, hour: u32) -> BTreeMap<String, Decimal> {
        let multiplier = time_multiplier(hour);
        let de_change = self.rng.gen_range(-2.0..2.0);

        let mut out = BTreeMap::new();

        for (market, base) in BASE_PRICES {
            let change = match market {
                "DE" => de_change,
                "NL" => de_change * 0.7 + self.rng.gen_range(-1.0..1.0),
                _ => self.rng.gen_range(-2.0..2.0),
            };

            let price = self.prices.entry(market).or_insert(base);
            *price += change;
            *price += (base - *price) * 0.1;

            let scaled = *price * multiplier;
            out.insert(
                market.to_string(),
                Decimal::from_f64(scaled).unwrap_or_default().round_dp(2),
            );
        }

        out
    }
}

/// Peak hours run 30 % above base, night hours 20 % below.
fn time_multiplier(hour: u32) -> f64 {
    match hour {
        8..=20 => 1.3,
        21..=23 | 0..=6 => 0.8,
        _ => 1.0,
    }
}

/// Generate-and-publish loop: one snapshot per interval until shutdown.
pub async fn run_source<S, P>(
    stream: Arc<S>,
    store: Arc<P>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    S: TickStream,
    P: SpreadStore,
{
    let mut source = PriceSource::new();

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let now = Utc::now();
        let prices = source.tick(now.hour());

        let mut snapshot = PriceSnapshot::new(now);
        for (market, price) in &prices {
            store
                .append_price(&PriceTick {
                    market: market.clone(),
                    timestamp: now,
                    price: *price,
                })
                .await?;
            snapshot.insert(market.clone(), *price);
        }

        let entry_id = stream.publish(snapshot.to_fields()).await?;
        tracing::info!(
            entry_id,
            markets = prices.len(),
            de = %prices["DE"],
            "published price snapshot"
        );

        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_covers_every_market_at_two_decimals() {
        let mut source = PriceSource::new();
        let prices = source.tick(12);

        assert_eq!(prices.len(), BASE_PRICES.len());
        for price in prices.values() {
            assert!(*price > Decimal::ZERO);
            assert!(price.scale() <= 2);
        }
    }

    #[test]
    fn time_multiplier_tracks_peak_and_night() {
        assert_eq!(time_multiplier(12), 1.3);
        assert_eq!(time_multiplier(22), 0.8);
        assert_eq!(time_multiplier(3), 0.8);
        assert_eq!(time_multiplier(7), 1.0);
    }

    #[test]
    fn walk_stays_roughly_anchored_to_base() {
        let mut source = PriceSource::new();

        // Mean reversion keeps a long run from drifting off to nonsense.
        for _ in 0..500 {
            source.tick(12);
        }

        let de = source.prices["DE"];
        assert!((20.0..200.0).contains(&de), "DE walked to {de}");
    }
}
