//! Derives spread opportunities from a price snapshot.
//
//  This module is deliberately pure: no async, no IO.

use crate::costs::TransmissionCosts;
use crate::types::{MarketPair, PriceSnapshot, SpreadOpportunity};

/// Compute every profitable opportunity in one snapshot.
///
/// Enumerates all C(n,2) unordered market pairs — quadratic, fine for the
/// tens of markets this runs over. For each pair the higher- and lower-priced
/// market is determined (equal prices carry no opportunity), the spread is
/// netted against the transmission cost, and an opportunity is emitted only
/// when the net margin is strictly positive.
///
/// The output timestamp is the max of the two point timestamps; inside a
/// normal snapshot they are identical. No ordering guarantee on the result —
/// callers sort (`SpreadOpportunity::by_net_desc`) if presentation order
/// matters.
///
/// An empty or single-market snapshot yields an empty vec, never an error.
pub fn calculate(snapshot: &PriceSnapshot, costs: &TransmissionCosts) -> Vec<SpreadOpportunity> {
    let points: Vec<(&String, &crate::types::PricePoint)> = snapshot.prices.iter().collect();
    let mut opportunities = Vec::new();

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let (market_a, point_a) = points[i];
            let (market_b, point_b) = points[j];

            if point_a.price == point_b.price {
                continue;
            }

            let (low_market, low, high_market, high) = if point_a.price < point_b.price {
                (market_a, point_a, market_b, point_b)
            } else {
                (market_b, point_b, market_a, point_a)
            };

            let spread = high.price - low.price;
            let transmission_cost = costs.cost(market_a, market_b);
            let net_opportunity = spread - transmission_cost;

            if net_opportunity <= rust_decimal::Decimal::ZERO {
                continue;
            }

            let pair = MarketPair::new(low_market, high_market);

            opportunities.push(SpreadOpportunity {
                market_pair: pair.id(),
                timestamp: low.timestamp.max(high.timestamp),
                spread,
                transmission_cost,
                net_opportunity,
                low_market: pair.low,
                high_market: pair.high,
                low_price: low.price,
                high_price: high.price,
            });
        }
    }

    opportunities
}
