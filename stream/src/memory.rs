//! MemoryStream
//! ------------
//! In-process implementation of the `TickStream` log. Backs the mock source,
//! the test suites, and single-node deployments; a broker-backed adapter
//! would implement the same trait.
//!
//! Semantics:
//!
//!  - entries live forever in publish order (retention is external policy)
//!  - each group owns a cursor over undelivered entries plus a pending map
//!  - an entry read but not acked stays pending for the consumer that read it
//!  - blocked readers are woken by publishes, never by polling

use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::{EntryId, StreamEntry, TickStream};

struct GroupState {
    /// Offset of the next undelivered entry.
    cursor: usize,
    /// Delivered, unacknowledged entries mapped to their owning consumer.
    pending: BTreeMap<EntryId, String>,
}

#[derive(Default)]
struct Inner {
    /// Entry id doubles as the index into this log.
    entries: Vec<StreamEntry>,
    groups: HashMap<String, GroupState>,
}

#[derive(Default)]
pub struct MemoryStream {
    inner: Mutex<Inner>,
    published: Notify,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries ever published.
    pub async fn entry_count(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Delivered-but-unacknowledged entries across all consumers of a group.
    pub async fn pending_count(&self, group: &str) -> usize {
        self.inner
            .lock()
            .await
            .groups
            .get(group)
            .map(|g| g.pending.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TickStream for MemoryStream {
    async fn ensure_group(&self, group: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().await;

        // Existing group: warm restart, keep its cursor and pending list.
        inner.groups.entry(group.to_string()).or_insert(GroupState {
            cursor: 0,
            pending: BTreeMap::new(),
        });

        Ok(())
    }

    async fn read_pending(
        &self,
        group: &str,
        consumer: &str,
    ) -> anyhow::Result<Vec<StreamEntry>> {
        let inner = self.inner.lock().await;
        let state = inner
            .groups
            .get(group)
            .ok_or_else(|| anyhow!("unknown consumer group: {group}"))?;

        let own = state
            .pending
            .iter()
            .filter(|(_, owner)| owner.as_str() == consumer)
            .map(|(id, _)| inner.entries[*id as usize].clone())
            .collect();

        Ok(own)
    }

    async fn read_next(&self, group: &str, consumer: &str) -> anyhow::Result<StreamEntry> {
        loop {
            // Arm the wakeup before inspecting state so a publish racing with
            // the check is not lost.
            let published = self.published.notified();

            {
                let mut inner = self.inner.lock().await;
                let Inner { entries, groups } = &mut *inner;

                let state = groups
                    .get_mut(group)
                    .ok_or_else(|| anyhow!("unknown consumer group: {group}"))?;

                if state.cursor < entries.len() {
                    let entry = entries[state.cursor].clone();
                    state.cursor += 1;
                    state.pending.insert(entry.id, consumer.to_string());
                    return Ok(entry);
                }
            }

            published.await;
        }
    }

    async fn ack(&self, group: &str, id: EntryId) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().await;
        let state = inner
            .groups
            .get_mut(group)
            .ok_or_else(|| anyhow!("unknown consumer group: {group}"))?;

        state.pending.remove(&id);
        Ok(())
    }

    async fn publish(&self, fields: HashMap<String, String>) -> anyhow::Result<EntryId> {
        let id = {
            let mut inner = self.inner.lock().await;
            let id = inner.entries.len() as EntryId;
            inner.entries.push(StreamEntry { id, fields });
            id
        };

        self.published.notify_waiters();
        Ok(id)
    }
}
