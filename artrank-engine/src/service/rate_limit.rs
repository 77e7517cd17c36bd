//! Interaction rate limiting
//!
//! Rolling per-(user, action, artwork) counters in the fast store. The
//! window is a TTL on the counter key: created on the first action, expired
//! by the store at window end. `check` is read-only so a rejected request
//! mutates nothing; `record` does the increment and belongs after the score
//! write in the update sequence.

use crate::cache::{keys, FastStore};
use artrank_common::config::RankingConfig;
use artrank_common::events::InteractionAction;
use artrank_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TRACKED_ACTIONS: [InteractionAction; 7] = [
    InteractionAction::Like,
    InteractionAction::Unlike,
    InteractionAction::Favorite,
    InteractionAction::Unfavorite,
    InteractionAction::Comment,
    InteractionAction::Share,
    InteractionAction::View,
];

pub struct RateLimiter {
    store: Arc<dyn FastStore>,
    config: Arc<RankingConfig>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn FastStore>, config: Arc<RankingConfig>) -> Self {
        Self { store, config }
    }

    /// Reject if the user has already used up the window's budget for this
    /// action on this artwork. Reads only.
    pub async fn check(
        &self,
        user_id: &str,
        action: InteractionAction,
        artwork_id: &str,
    ) -> Result<()> {
        let limit = self.config.rate_limit_for(action.as_str());
        let key = keys::rate_limit(user_id, action.as_str(), artwork_id);
        let used: u32 = self
            .store
            .get(&key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        if used >= limit {
            return Err(Error::RateLimitExceeded {
                action: action.as_str().to_string(),
                limit,
            });
        }
        Ok(())
    }

    /// Count one accepted action. The first increment in a window arms the
    /// TTL that ends it.
    pub async fn record(
        &self,
        user_id: &str,
        action: InteractionAction,
        artwork_id: &str,
    ) -> Result<i64> {
        let key = keys::rate_limit(user_id, action.as_str(), artwork_id);
        let count = self.store.incr(&key, 1).await?;
        if count == 1 {
            self.store
                .expire(&key, Duration::from_secs(self.config.rate_limits.window_secs))
                .await?;
        }
        Ok(count)
    }

    /// Current window usage per action for one (user, artwork) pair.
    pub async fn usage(
        &self,
        user_id: &str,
        artwork_id: &str,
    ) -> Result<HashMap<String, u32>> {
        let mut usage = HashMap::new();
        for action in TRACKED_ACTIONS {
            let key = keys::rate_limit(user_id, action.as_str(), artwork_id);
            let used: u32 = self
                .store
                .get(&key)
                .await?
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if used > 0 {
                usage.insert(action.as_str().to_string(), used);
            }
        }
        Ok(usage)
    }

    /// Coarse spam signal: a user touching more distinct artwork-action keys
    /// than the ceiling inside the tracking window. For operator review, not
    /// an automatic block.
    pub async fn is_bot(&self, user_id: &str) -> Result<bool> {
        let tracked = self
            .store
            .keys(&keys::rate_limit_pattern(user_id))
            .await?
            .len() as u32;
        Ok(tracked > self.config.rate_limits.bot_key_ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn limiter(config: RankingConfig) -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryStore::new()), Arc::new(config))
    }

    #[tokio::test]
    async fn limit_boundary_rejects_only_past_the_ceiling() {
        let mut config = RankingConfig::default();
        config.rate_limits.like = 3;
        let rl = limiter(config);

        // The L-th action is accepted, the (L+1)-th rejected
        for _ in 0..3 {
            rl.check("u-1", InteractionAction::Like, "a-1").await.unwrap();
            rl.record("u-1", InteractionAction::Like, "a-1").await.unwrap();
        }
        let err = rl
            .check("u-1", InteractionAction::Like, "a-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded { limit: 3, .. }));

        // Other artworks and other users are unaffected
        rl.check("u-1", InteractionAction::Like, "a-2").await.unwrap();
        rl.check("u-2", InteractionAction::Like, "a-1").await.unwrap();
    }

    #[tokio::test]
    async fn window_rollover_resets_the_counter() {
        let mut config = RankingConfig::default();
        config.rate_limits.window_secs = 1;
        config.rate_limits.share = 1;
        let rl = limiter(config);

        rl.check("u-1", InteractionAction::Share, "a-1").await.unwrap();
        rl.record("u-1", InteractionAction::Share, "a-1").await.unwrap();
        assert!(rl
            .check("u-1", InteractionAction::Share, "a-1")
            .await
            .is_err());

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        rl.check("u-1", InteractionAction::Share, "a-1")
            .await
            .expect("counter resets after the window");
        let usage = rl.usage("u-1", "a-1").await.unwrap();
        assert!(usage.is_empty());
    }

    #[tokio::test]
    async fn usage_reports_per_action_counts() {
        let rl = limiter(RankingConfig::default());
        rl.record("u-1", InteractionAction::Like, "a-1").await.unwrap();
        rl.record("u-1", InteractionAction::Like, "a-1").await.unwrap();
        rl.record("u-1", InteractionAction::View, "a-1").await.unwrap();

        let usage = rl.usage("u-1", "a-1").await.unwrap();
        assert_eq!(usage.get("like"), Some(&2));
        assert_eq!(usage.get("view"), Some(&1));
        assert_eq!(usage.get("share"), None);
    }

    #[tokio::test]
    async fn bot_heuristic_trips_on_key_spread() {
        let mut config = RankingConfig::default();
        config.rate_limits.bot_key_ceiling = 5;
        let rl = limiter(config);

        for i in 0..5 {
            rl.record("u-1", InteractionAction::Like, &format!("a-{}", i))
                .await
                .unwrap();
        }
        assert!(!rl.is_bot("u-1").await.unwrap());

        rl.record("u-1", InteractionAction::Like, "a-5").await.unwrap();
        assert!(rl.is_bot("u-1").await.unwrap());
        assert!(!rl.is_bot("u-2").await.unwrap());
    }
}
