//! Redis-backed fast store
//!
//! Wraps `redis::aio::ConnectionManager` (cloned per call; the manager
//! multiplexes and reconnects internally). Every command failure surfaces as
//! `Error::StoreUnavailable`; the service layer decides which of those are
//! fatal for the request and which are swallowed.

use super::{FastStore, Pipeline, PipelineOp};
use artrank_common::{Error, Result};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

fn store_err(e: redis::RedisError) -> Error {
    Error::StoreUnavailable(e.to_string())
}

/// Redis implementation of [`FastStore`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and build the connection manager.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(3);

        let client = Client::open(redis_url).map_err(store_err)?;
        let conn = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(store_err)?;

        info!("Connected fast store at {}", redis_url);
        Ok(Self { conn })
    }
}

#[async_trait]
impl FastStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(store_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(store_err)?;
        Ok(())
    }

    async fn incr(&self, key: &str, by: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, by).await.map_err(store_err)?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let set: bool = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .map_err(store_err)?;
        Ok(set)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(store_err)?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await.map_err(store_err)?;
        Ok(keys)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(key, field).await.map_err(store_err)?;
        Ok(value)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, field, value).await.map_err(store_err)?;
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset_multiple(key, fields).await.map_err(store_err)?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(key).await.map_err(store_err)?;
        Ok(map)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(key, member, score).await.map_err(store_err)?;
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(key, member).await.map_err(store_err)?;
        Ok(())
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        let mut conn = self.conn.clone();
        let pairs: Vec<(String, f64)> = conn
            .zrevrange_withscores(key, start, stop)
            .await
            .map_err(store_err)?;
        Ok(pairs)
    }

    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        let rank: Option<u64> = conn.zrevrank(key, member).await.map_err(store_err)?;
        Ok(rank)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        let score: Option<f64> = conn.zscore(key, member).await.map_err(store_err)?;
        Ok(score)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.zcard(key).await.map_err(store_err)?;
        Ok(count)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(key, member).await.map_err(store_err)?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.srem(key, member).await.map_err(store_err)?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await.map_err(store_err)?;
        Ok(members)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let is_member: bool = conn.sismember(key, member).await.map_err(store_err)?;
        Ok(is_member)
    }

    async fn set_nx_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        // SET key value NX PX ttl: atomic acquire with millisecond TTL
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(reply.is_some())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.publish(channel, message).await.map_err(store_err)?;
        Ok(())
    }

    async fn exec(&self, pipeline: Pipeline) -> Result<()> {
        if pipeline.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in pipeline.into_ops() {
            match op {
                PipelineOp::Set { key, value } => {
                    pipe.set(&key, &value).ignore();
                }
                PipelineOp::HSet { key, fields } => {
                    pipe.hset_multiple(&key, &fields).ignore();
                }
                PipelineOp::ZAdd { key, member, score } => {
                    pipe.zadd(&key, &member, score).ignore();
                }
                PipelineOp::ZRem { key, member } => {
                    pipe.zrem(&key, &member).ignore();
                }
                PipelineOp::SAdd { key, member } => {
                    pipe.sadd(&key, &member).ignore();
                }
                PipelineOp::SRem { key, member } => {
                    pipe.srem(&key, &member).ignore();
                }
                PipelineOp::Incr { key, by } => {
                    pipe.incr(&key, by).ignore();
                }
                PipelineOp::Expire { key, ttl } => {
                    pipe.expire(&key, ttl.as_secs() as i64).ignore();
                }
                PipelineOp::Del { key } => {
                    pipe.del(&key).ignore();
                }
            }
        }
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(store_err)?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
