//! In-memory fast store
//!
//! TTL-honoring, single-process implementation of [`FastStore`]. Used by the
//! test suites and as the degraded-mode fallback when no Redis URL is
//! configured. Not durable and not shared across processes.

use super::{FastStore, Pipeline, PipelineOp};
use artrank_common::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Zset(HashMap<String, f64>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Stored {
    value: Value,
    expires_at: Option<Instant>,
}

impl Stored {
    fn live(&self) -> bool {
        self.expires_at.map(|at| Instant::now() < at).unwrap_or(true)
    }
}

/// In-memory [`FastStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Stored>>,
    published: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published so far; test observability.
    pub fn published_messages(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    fn wrong_type(key: &str) -> Error {
        Error::Internal(format!("wrong value type at key {}", key))
    }

    /// Apply one pipeline op under the already-held map lock.
    fn apply_op(map: &mut HashMap<String, Stored>, op: PipelineOp) -> Result<()> {
        match op {
            PipelineOp::Set { key, value } => {
                map.insert(
                    key,
                    Stored {
                        value: Value::Str(value),
                        expires_at: None,
                    },
                );
            }
            PipelineOp::HSet { key, fields } => {
                let entry = live_entry_or(map, &key, || Value::Hash(HashMap::new()));
                match &mut entry.value {
                    Value::Hash(h) => h.extend(fields),
                    _ => return Err(Self::wrong_type(&key)),
                }
            }
            PipelineOp::ZAdd { key, member, score } => {
                let entry = live_entry_or(map, &key, || Value::Zset(HashMap::new()));
                match &mut entry.value {
                    Value::Zset(z) => {
                        z.insert(member, score);
                    }
                    _ => return Err(Self::wrong_type(&key)),
                }
            }
            PipelineOp::ZRem { key, member } => {
                if let Some(entry) = live_entry(map, &key) {
                    match &mut entry.value {
                        Value::Zset(z) => {
                            z.remove(&member);
                        }
                        _ => return Err(Self::wrong_type(&key)),
                    }
                }
            }
            PipelineOp::SAdd { key, member } => {
                let entry = live_entry_or(map, &key, || Value::Set(HashSet::new()));
                match &mut entry.value {
                    Value::Set(s) => {
                        s.insert(member);
                    }
                    _ => return Err(Self::wrong_type(&key)),
                }
            }
            PipelineOp::SRem { key, member } => {
                if let Some(entry) = live_entry(map, &key) {
                    match &mut entry.value {
                        Value::Set(s) => {
                            s.remove(&member);
                        }
                        _ => return Err(Self::wrong_type(&key)),
                    }
                }
            }
            PipelineOp::Incr { key, by } => {
                incr_in(map, &key, by)?;
            }
            PipelineOp::Expire { key, ttl } => {
                if let Some(entry) = live_entry(map, &key) {
                    entry.expires_at = Some(Instant::now() + ttl);
                }
            }
            PipelineOp::Del { key } => {
                map.remove(&key);
            }
        }
        Ok(())
    }
}

/// Fetch a live entry, dropping it first if its TTL has lapsed.
fn live_entry<'a>(
    map: &'a mut HashMap<String, Stored>,
    key: &str,
) -> Option<&'a mut Stored> {
    let expired = map.get(key).map(|e| !e.live()).unwrap_or(false);
    if expired {
        map.remove(key);
    }
    map.get_mut(key)
}

fn live_entry_or<'a>(
    map: &'a mut HashMap<String, Stored>,
    key: &str,
    default: impl FnOnce() -> Value,
) -> &'a mut Stored {
    let expired = map.get(key).map(|e| !e.live()).unwrap_or(false);
    if expired {
        map.remove(key);
    }
    map.entry(key.to_string()).or_insert_with(|| Stored {
        value: default(),
        expires_at: None,
    })
}

fn incr_in(map: &mut HashMap<String, Stored>, key: &str, by: i64) -> Result<i64> {
    let entry = live_entry_or(map, key, || Value::Str("0".to_string()));
    match &mut entry.value {
        Value::Str(s) => {
            let current: i64 = s
                .parse()
                .map_err(|_| Error::Internal(format!("non-integer value at key {}", key)))?;
            let next = current + by;
            *s = next.to_string();
            Ok(next)
        }
        _ => Err(MemoryStore::wrong_type(key)),
    }
}

/// Glob matcher supporting `*` wildcards (the only pattern syntax the
/// engine's key layout uses).
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == candidate;
    }
    let mut rest = candidate;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[async_trait]
impl FastStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::Set {
                key: key.to_string(),
                value: value.to_string(),
            },
        )
    }

    async fn incr(&self, key: &str, by: i64) -> Result<i64> {
        let mut map = self.entries.lock().unwrap();
        incr_in(&mut map, key, by)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let map = self.entries.lock().unwrap();
        let mut out: Vec<String> = map
            .iter()
            .filter(|(k, v)| v.live() && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Hash(h),
                ..
            }) => Ok(h.get(field).cloned()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.hset_multiple(key, &[(field.to_string(), value.to_string())])
            .await
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::HSet {
                key: key.to_string(),
                fields: fields.to_vec(),
            },
        )
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Hash(h),
                ..
            }) => Ok(h.clone()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(HashMap::new()),
        }
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::ZAdd {
                key: key.to_string(),
                member: member.to_string(),
                score,
            },
        )
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::ZRem {
                key: key.to_string(),
                member: member.to_string(),
            },
        )
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        let mut map = self.entries.lock().unwrap();
        let ranked = match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Zset(z),
                ..
            }) => {
                let mut pairs: Vec<(String, f64)> =
                    z.iter().map(|(m, s)| (m.clone(), *s)).collect();
                // Descending score; ties in reverse member order, matching
                // ZREVRANGE semantics
                pairs.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.0.cmp(&a.0))
                });
                pairs
            }
            Some(_) => return Err(Self::wrong_type(key)),
            None => Vec::new(),
        };

        let len = ranked.len() as isize;
        let resolve = |idx: isize| -> isize {
            if idx < 0 {
                (len + idx).max(0)
            } else {
                idx
            }
        };
        let from = resolve(start).min(len);
        let to = (resolve(stop) + 1).min(len);
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(ranked[from as usize..to as usize].to_vec())
    }

    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let all = self.zrevrange_withscores(key, 0, -1).await?;
        Ok(all
            .iter()
            .position(|(m, _)| m == member)
            .map(|pos| pos as u64))
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Zset(z),
                ..
            }) => Ok(z.get(member).copied()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Zset(z),
                ..
            }) => Ok(z.len() as u64),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(0),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::SAdd {
                key: key.to_string(),
                member: member.to_string(),
            },
        )
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        MemoryStore::apply_op(
            &mut map,
            PipelineOp::SRem {
                key: key.to_string(),
                member: member.to_string(),
            },
        )
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Set(s),
                ..
            }) => {
                let mut members: Vec<String> = s.iter().cloned().collect();
                members.sort();
                Ok(members)
            }
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut map = self.entries.lock().unwrap();
        match live_entry(&mut map, key) {
            Some(Stored {
                value: Value::Set(s),
                ..
            }) => Ok(s.contains(member)),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(false),
        }
    }

    async fn set_nx_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut map = self.entries.lock().unwrap();
        if live_entry(&mut map, key).is_some() {
            return Ok(false);
        }
        map.insert(
            key.to_string(),
            Stored {
                value: Value::Str(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), message.to_string()));
        Ok(())
    }

    async fn exec(&self, pipeline: Pipeline) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        for op in pipeline.into_ops() {
            MemoryStore::apply_op(&mut map, op)?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
