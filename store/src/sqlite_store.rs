//! SqliteSpreadStore
//! -----------------
//! SQLite-backed implementation of the `SpreadStore` trait. Responsible for
//! durable persistence of the pipeline's output so that:
//!
//!  - spread opportunities survive restarts
//!  - the query/dashboard side has something to read
//!  - processing latency is observable (created_at vs business timestamp)
//!
//! Money columns are stored as TEXT, matching the exact decimal string
//! encoding used on the wire; timestamps are RFC-3339 TEXT.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};

use market::types::{PriceTick, SpreadOpportunity};

use crate::{SpreadStore, StoredSpread};

pub struct SqliteSpreadStore {
    pool: SqlitePool,
}

impl SqliteSpreadStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and ensure the schema exists.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prices (
                market TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                price TEXT NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS spreads (
                market_pair TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                spread TEXT NOT NULL,
                net_opportunity TEXT NOT NULL,
                low_market TEXT NOT NULL,
                high_market TEXT NOT NULL,
                low_price TEXT NOT NULL,
                high_price TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_prices_market_ts ON prices(market, timestamp);"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_spreads_created_at ON spreads(created_at);"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_decimal(column: &str, raw: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| anyhow::anyhow!("invalid {column} '{raw}': {e}"))
}

fn parse_timestamp(column: &str, raw: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("invalid {column} '{raw}': {e}"))
}

#[async_trait]
impl SpreadStore for SqliteSpreadStore {
    async fn append_price(&self, tick: &PriceTick) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prices (market, timestamp, price)
            VALUES (?, ?, ?)
        "#,
        )
        .bind(&tick.market)
        .bind(tick.timestamp.to_rfc3339())
        .bind(tick.price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_spread(&self, opportunity: &SpreadOpportunity) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO spreads (
                market_pair, timestamp, spread, net_opportunity,
                low_market, high_market, low_price, high_price,
                created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&opportunity.market_pair)
        .bind(opportunity.timestamp.to_rfc3339())
        .bind(opportunity.spread.to_string())
        .bind(opportunity.net_opportunity.to_string())
        .bind(&opportunity.low_market)
        .bind(&opportunity.high_market)
        .bind(opportunity.low_price.to_string())
        .bind(opportunity.high_price.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_spreads(&self, limit: i64) -> anyhow::Result<Vec<StoredSpread>> {
        let rows = sqlx::query(
            r#"
            SELECT market_pair, timestamp, spread, net_opportunity,
                   low_market, high_market, low_price, high_price, created_at
            FROM spreads
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
        "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut spreads = Vec::with_capacity(rows.len());

        for row in rows {
            let spread = parse_decimal("spread", &row.get::<String, _>("spread"))?;
            let net_opportunity =
                parse_decimal("net_opportunity", &row.get::<String, _>("net_opportunity"))?;

            spreads.push(StoredSpread {
                opportunity: SpreadOpportunity {
                    market_pair: row.get("market_pair"),
                    timestamp: parse_timestamp("timestamp", &row.get::<String, _>("timestamp"))?,
                    spread,
                    // Not a column of its own; the row stores the netted
                    // result, so the cost is recovered by subtraction.
                    transmission_cost: spread - net_opportunity,
                    net_opportunity,
                    low_market: row.get("low_market"),
                    high_market: row.get("high_market"),
                    low_price: parse_decimal("low_price", &row.get::<String, _>("low_price"))?,
                    high_price: parse_decimal("high_price", &row.get::<String, _>("high_price"))?,
                },
                created_at: parse_timestamp("created_at", &row.get::<String, _>("created_at"))?,
            });
        }

        Ok(spreads)
    }

    async fn latest_prices(&self) -> anyhow::Result<Vec<PriceTick>> {
        // Ordered scan; the fold below keeps the newest row per market.
        let rows = sqlx::query(
            r#"
            SELECT market, timestamp, price
            FROM prices
            ORDER BY market, timestamp
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut latest: Vec<PriceTick> = Vec::new();

        for row in rows {
            let tick = PriceTick {
                market: row.get("market"),
                timestamp: parse_timestamp("timestamp", &row.get::<String, _>("timestamp"))?,
                price: parse_decimal("price", &row.get::<String, _>("price"))?,
            };

            match latest.last_mut() {
                Some(prev) if prev.market == tick.market => *prev = tick,
                _ => latest.push(tick),
            }
        }

        Ok(latest)
    }
}
