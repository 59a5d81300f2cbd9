//! Validating parse of raw stream entries into typed snapshots.
//!
//! Stream payloads are loose string-to-string maps: a reserved `timestamp`
//! field (RFC-3339 instant) plus one field per market code holding the price
//! encoded as a decimal string. Decoding happens here, once, so the rest of
//! the pipeline works over well-typed input.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::PriceSnapshot;

/// Reserved payload key holding the snapshot instant. Never a market code.
pub const TIMESTAMP_FIELD: &str = "timestamp";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("missing `timestamp` field")]
    MissingTimestamp,

    #[error("unparseable timestamp: {value}")]
    InvalidTimestamp { value: String },

    #[error("non-numeric price for market {market}: {value}")]
    InvalidPrice { market: String, value: String },
}

impl PriceSnapshot {
    /// Decode one stream entry payload.
    ///
    /// A payload with a valid timestamp and zero markets is a valid, empty
    /// snapshot, not an error.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, SnapshotError> {
        let raw_ts = fields
            .get(TIMESTAMP_FIELD)
            .ok_or(SnapshotError::MissingTimestamp)?;

        let timestamp = DateTime::parse_from_rfc3339(raw_ts)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| SnapshotError::InvalidTimestamp {
                value: raw_ts.clone(),
            })?;

        let mut snapshot = PriceSnapshot::new(timestamp);

        for (market, raw_price) in fields {
            if market == TIMESTAMP_FIELD {
                continue;
            }

            let price =
                Decimal::from_str(raw_price).map_err(|_| SnapshotError::InvalidPrice {
                    market: market.clone(),
                    value: raw_price.clone(),
                })?;

            snapshot.insert(market.clone(), price);
        }

        Ok(snapshot)
    }

    /// Encode this snapshot as a stream entry payload. Prices are emitted as
    /// decimal strings to avoid floating-point loss in transit.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::with_capacity(self.prices.len() + 1);
        fields.insert(TIMESTAMP_FIELD.to_string(), self.timestamp.to_rfc3339());

        for (market, point) in &self.prices {
            fields.insert(market.clone(), point.price.to_string());
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn fields(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_markets_and_timestamp() {
        let snapshot = PriceSnapshot::from_fields(&fields(&[
            ("timestamp", "2024-03-01T12:00:00+00:00"),
            ("DE", "75.50"),
            ("FR", "85.25"),
        ]))
        .unwrap();

        assert_eq!(
            snapshot.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(snapshot.market_count(), 2);
        assert_eq!(snapshot.prices["DE"].price, dec!(75.50));
        assert_eq!(snapshot.prices["FR"].price, dec!(85.25));
        assert_eq!(snapshot.prices["FR"].timestamp, snapshot.timestamp);
    }

    #[test]
    fn timestamp_field_is_not_a_market() {
        let snapshot = PriceSnapshot::from_fields(&fields(&[
            ("timestamp", "2024-03-01T12:00:00Z"),
            ("DE", "70.00"),
        ]))
        .unwrap();

        assert!(!snapshot.prices.contains_key("timestamp"));
        assert_eq!(snapshot.market_count(), 1);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let err = PriceSnapshot::from_fields(&fields(&[("DE", "70.00")])).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingTimestamp));
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = PriceSnapshot::from_fields(&fields(&[
            ("timestamp", "yesterday"),
            ("DE", "70.00"),
        ]))
        .unwrap_err();

        assert!(matches!(err, SnapshotError::InvalidTimestamp { .. }));
    }

    #[test]
    fn non_numeric_price_is_rejected_with_market_name() {
        let err = PriceSnapshot::from_fields(&fields(&[
            ("timestamp", "2024-03-01T12:00:00Z"),
            ("DE", "not-a-price"),
        ]))
        .unwrap_err();

        match err {
            SnapshotError::InvalidPrice { market, value } => {
                assert_eq!(market, "DE");
                assert_eq!(value, "not-a-price");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timestamp_only_payload_is_an_empty_snapshot() {
        let snapshot =
            PriceSnapshot::from_fields(&fields(&[("timestamp", "2024-03-01T12:00:00Z")]))
                .unwrap();

        assert_eq!(snapshot.market_count(), 0);
    }

    #[test]
    fn encode_decode_preserves_prices_exactly() {
        let mut snapshot =
            PriceSnapshot::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        snapshot.insert("DE", dec!(75.01));
        snapshot.insert("NL", dec!(73.00));

        let decoded = PriceSnapshot::from_fields(&snapshot.to_fields()).unwrap();

        assert_eq!(decoded.prices["DE"].price, dec!(75.01));
        assert_eq!(decoded.prices["NL"].price, dec!(73.00));
        assert_eq!(decoded.timestamp, snapshot.timestamp);
    }
}
