//! The stream consumer loop.
//!
//! Bridges the at-least-once stream to the calculator and the store:
//!   1. Declares the consumer group (create-if-absent) on startup.
//!   2. Reprocesses this consumer's own pending entries left by an unclean
//!      stop.
//!   3. Blocks on the next entry, parses it, computes opportunities,
//!      persists each one, and acknowledges only after every append landed.
//!
//! Acknowledgment discipline is the correctness core: a crash between
//! persist and ack means the entry is redelivered and its opportunities are
//! appended again. Spread rows are facts, not counters, so the duplicates
//! are tolerable; anything aggregating them must not assume exactly-once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use market::calculator::calculate;
use market::costs::TransmissionCosts;
use market::types::{PriceSnapshot, SpreadOpportunity};
use store::SpreadStore;
use stream::{StreamEntry, TickStream};

use crate::types::ConsumerConfig;

pub struct SpreadConsumer<S, P> {
    cfg: ConsumerConfig,
    stream: Arc<S>,
    store: Arc<P>,
    costs: Arc<TransmissionCosts>,
}

impl<S: TickStream, P: SpreadStore> SpreadConsumer<S, P> {
    pub fn new(
        cfg: ConsumerConfig,
        stream: Arc<S>,
        store: Arc<P>,
        costs: Arc<TransmissionCosts>,
    ) -> Self {
        Self {
            cfg,
            stream,
            store,
            costs,
        }
    }

    /// One pass of the loop: declare the group, recover pending entries,
    /// then consume until shutdown.
    ///
    /// Transient infrastructure errors propagate out of here with the
    /// in-flight entry unacknowledged, so it is redelivered on the next run.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        self.stream.ensure_group(&self.cfg.group).await?;

        let recovered = self.drain_pending().await?;
        if recovered > 0 {
            tracing::info!(
                consumer = %self.cfg.consumer,
                recovered,
                "reprocessed pending entries from previous run"
            );
        }

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            // The blocking read is the sole suspension point; once an entry
            // is claimed it is processed to completion.
            let entry = tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                entry = self.stream.read_next(&self.cfg.group, &self.cfg.consumer) => entry?,
            };

            self.process_entry(entry).await?;
        }
    }

    /// Keep the loop alive across transient failures with a bounded
    /// exponential backoff, so an outage never turns into a tight retry
    /// storm. Returns only on shutdown.
    pub async fn run_with_backoff(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let initial = Duration::from_millis(self.cfg.initial_backoff_ms);
        let max = Duration::from_millis(self.cfg.max_backoff_ms);
        let mut backoff = initial;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let started = Instant::now();

            match self.run(shutdown.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // A run that stayed healthy past the ceiling starts the
                    // ladder over.
                    if started.elapsed() >= max {
                        backoff = initial;
                    }

                    tracing::error!(
                        consumer = %self.cfg.consumer,
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "consumer loop failed, backing off"
                    );

                    tokio::select! {
                        _ = shutdown.changed() => return Ok(()),
                        _ = tokio::time::sleep(backoff) => {}
                    }

                    backoff = (backoff * 2).min(max);
                }
            }
        }
    }

    /// Reprocess every entry still pending under this consumer's name.
    /// Returns how many were recovered.
    pub async fn drain_pending(&self) -> anyhow::Result<usize> {
        let pending = self
            .stream
            .read_pending(&self.cfg.group, &self.cfg.consumer)
            .await?;
        let count = pending.len();

        for entry in pending {
            self.process_entry(entry).await?;
        }

        Ok(count)
    }

    /// Read and process exactly one entry. Blocks until one is available.
    pub async fn poll_once(&self) -> anyhow::Result<()> {
        let entry = self
            .stream
            .read_next(&self.cfg.group, &self.cfg.consumer)
            .await?;
        self.process_entry(entry).await
    }

    async fn process_entry(&self, entry: StreamEntry) -> anyhow::Result<()> {
        let snapshot = match PriceSnapshot::from_fields(&entry.fields) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Retrying a structurally invalid entry can never succeed;
                // ack it so it cannot wedge the group.
                tracing::warn!(
                    entry_id = entry.id,
                    error = %e,
                    "discarding malformed price snapshot"
                );
                self.stream.ack(&self.cfg.group, entry.id).await?;
                return Ok(());
            }
        };

        let mut opportunities = calculate(&snapshot, &self.costs);

        for opportunity in &opportunities {
            self.store.append_spread(opportunity).await?;
        }

        // Only after every append landed. A failure above leaves the entry
        // pending and the whole snapshot is reprocessed on recovery.
        self.stream.ack(&self.cfg.group, entry.id).await?;

        if opportunities.is_empty() {
            tracing::debug!(
                entry_id = entry.id,
                markets = snapshot.market_count(),
                "no profitable pairs in snapshot"
            );
        } else {
            opportunities.sort_by(SpreadOpportunity::by_net_desc);
            let best = &opportunities[0];
            tracing::info!(
                entry_id = entry.id,
                count = opportunities.len(),
                best_pair = %best.market_pair,
                best_net = %best.net_opportunity,
                "persisted spread opportunities"
            );
        }

        Ok(())
    }
}
