//! Shared types used by the consumer subsystem.

/// Configuration knobs for one consumer process.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Consumer group name. Every process sharing this name splits the
    /// stream between them.
    pub group: String,

    /// This process's identity within the group. Must be distinct per
    /// process; entries read under this name stay pending under it until
    /// acknowledged.
    pub consumer: String,

    /// First delay after a transient infrastructure failure, in ms.
    pub initial_backoff_ms: u64,

    /// Ceiling for the exponential backoff ladder, in ms.
    pub max_backoff_ms: u64,
}
