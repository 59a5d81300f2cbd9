pub mod memory;

use std::collections::HashMap;

/// Offset of an entry in the log. Assigned at publish, never reused.
pub type EntryId = u64;

/// One published entry: an offset plus a loose string-to-string payload.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: EntryId,
    pub fields: HashMap<String, String>,
}

/// An ordered, persistent, multi-consumer log with grouped, acknowledged
/// consumption.
///
/// Consumers in one group split the log between them: every entry is
/// delivered to exactly one member, stays on the group's pending list until
/// acknowledged, and is redelivered to its owner via `read_pending` after a
/// restart. The log itself retains full history regardless of consumption.
#[async_trait::async_trait]
pub trait TickStream: Send + Sync {
    /// Durably declare `group`, positioned at the start of the backlog, so a
    /// first-ever run sees already-published entries. Create-if-absent: an
    /// existing group is success, not an error (warm restart).
    async fn ensure_group(&self, group: &str) -> anyhow::Result<()>;

    /// This consumer's own delivered-but-unacknowledged entries, oldest
    /// first. The recovery path after an unclean stop.
    async fn read_pending(&self, group: &str, consumer: &str)
    -> anyhow::Result<Vec<StreamEntry>>;

    /// Next undelivered entry for the group, marked pending for `consumer`.
    /// Blocks until an entry is available; no polling.
    async fn read_next(&self, group: &str, consumer: &str) -> anyhow::Result<StreamEntry>;

    /// Remove `id` from the group's pending list. Acknowledging an entry
    /// that is not pending is a no-op.
    async fn ack(&self, group: &str, id: EntryId) -> anyhow::Result<()>;

    /// Append an entry to the log and wake blocked readers.
    async fn publish(&self, fields: HashMap<String, String>) -> anyhow::Result<EntryId>;
}
