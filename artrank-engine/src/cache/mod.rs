//! Fast ranked store
//!
//! The `FastStore` trait is the engine's seam to the key/value + sorted-set
//! store holding per-artwork score hashes, the global ranked index,
//! rate-limit counters, distributed locks, and pub/sub notification.
//!
//! Two implementations:
//! - [`RedisStore`]: production, over `redis::aio::ConnectionManager`
//! - [`MemoryStore`]: in-process, TTL-honoring; tests and degraded mode
//!
//! Reads are lock-free and may observe slightly stale data; all mutation of
//! the ranked index goes through the per-artwork lock or the single-flush
//! batch owner.

pub mod keys;
pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use artrank_common::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// One queued store mutation inside a [`Pipeline`].
#[derive(Debug, Clone)]
pub enum PipelineOp {
    Set { key: String, value: String },
    HSet { key: String, fields: Vec<(String, String)> },
    ZAdd { key: String, member: String, score: f64 },
    ZRem { key: String, member: String },
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
    Incr { key: String, by: i64 },
    Expire { key: String, ttl: Duration },
    Del { key: String },
}

/// Ordered list of store mutations executed as one round-trip.
///
/// Redis executes the list as a MULTI pipeline; stores without pipelining
/// (the in-memory implementation) apply the operations sequentially, which
/// is the documented fallback, not an error.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    ops: Vec<PipelineOp>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(PipelineOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn hset(mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.ops.push(PipelineOp::HSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn zadd(mut self, key: impl Into<String>, member: impl Into<String>, score: f64) -> Self {
        self.ops.push(PipelineOp::ZAdd {
            key: key.into(),
            member: member.into(),
            score,
        });
        self
    }

    pub fn zrem(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.ops.push(PipelineOp::ZRem {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn sadd(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.ops.push(PipelineOp::SAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn srem(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.ops.push(PipelineOp::SRem {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn incr(mut self, key: impl Into<String>, by: i64) -> Self {
        self.ops.push(PipelineOp::Incr { key: key.into(), by });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.ops.push(PipelineOp::Expire { key: key.into(), ttl });
        self
    }

    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.ops.push(PipelineOp::Del { key: key.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[PipelineOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PipelineOp> {
        self.ops
    }
}

/// Key/value + sorted-set store operations required by the ranking engine.
#[async_trait]
pub trait FastStore: Send + Sync {
    // Scalar keys
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn incr(&self, key: &str, by: i64) -> Result<i64>;
    /// Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
    async fn del(&self, key: &str) -> Result<()>;
    /// Keys matching a glob pattern. Used for cache invalidation and the
    /// bot heuristic; never on a hot path.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    // Per-artwork hashes
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    // Ranked index (sorted set)
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;
    async fn zrem(&self, key: &str, member: &str) -> Result<()>;
    /// Top entries by descending score: `(member, score)` pairs for the
    /// inclusive index range `[start, stop]`.
    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>>;
    /// Zero-based rank in descending score order.
    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<u64>>;
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;
    async fn zcard(&self, key: &str) -> Result<u64>;

    // Membership sets (favorites mirror)
    async fn sadd(&self, key: &str, member: &str) -> Result<()>;
    async fn srem(&self, key: &str, member: &str) -> Result<()>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// Atomic set-if-absent with TTL; the lock primitive. Returns true when
    /// the key was set (lock acquired).
    async fn set_nx_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Best-effort notification; failures are the caller's to swallow.
    async fn publish(&self, channel: &str, message: &str) -> Result<()>;

    /// Execute a pipeline of mutations.
    async fn exec(&self, pipeline: Pipeline) -> Result<()>;

    /// Connectivity probe for health reporting.
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_preserves_insertion_order() {
        let p = Pipeline::new()
            .hset("artwork:hot:a-1", vec![("score".into(), "2.0".into())])
            .zadd("rank:hot", "a-1", 2.0)
            .del("feed:recent");
        assert_eq!(p.len(), 3);
        assert!(matches!(p.ops()[0], PipelineOp::HSet { .. }));
        assert!(matches!(p.ops()[1], PipelineOp::ZAdd { .. }));
        assert!(matches!(p.ops()[2], PipelineOp::Del { .. }));
    }

    #[test]
    fn empty_pipeline_reports_empty() {
        assert!(Pipeline::new().is_empty());
    }
}
