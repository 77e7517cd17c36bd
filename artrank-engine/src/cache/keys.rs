//! Fast store key layout
//!
//! Every key the engine writes is built here so the auditor, the invalidation
//! sweep, and the rate limiter agree on naming.

/// Per-artwork score hash: fields `score`, `level`, `updated_at`, plus
/// mirrored interaction counts.
pub fn artwork_hash(artwork_id: &str) -> String {
    format!("artwork:hot:{}", artwork_id)
}

/// Global ranked index, member = artwork id, score = hotness.
pub const RANKED_INDEX: &str = "rank:hot";

/// Rolling rate-limit counter for one (user, action, artwork) triple.
pub fn rate_limit(user_id: &str, action: &str, artwork_id: &str) -> String {
    format!("rl:{}:{}:{}", user_id, action, artwork_id)
}

/// All tracked action keys for one user (bot heuristic).
pub fn rate_limit_pattern(user_id: &str) -> String {
    format!("rl:{}:*", user_id)
}

/// Fast-store mirror of one user's favorite set.
pub fn user_favorites(user_id: &str) -> String {
    format!("fav:user:{}", user_id)
}

/// Per-artwork update lock.
pub fn artwork_lock(artwork_id: &str) -> String {
    format!("lock:artwork:{}", artwork_id)
}

/// Downstream listing caches invalidated after a score write.
pub const INVALIDATION_PATTERNS: [&str; 3] = ["feed:*", "trend:*", "favlist:*"];

/// Pub/sub channel for hotness change notifications.
pub const EVENTS_CHANNEL: &str = "hotness:events";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_embed_their_ids() {
        assert_eq!(artwork_hash("a-1"), "artwork:hot:a-1");
        assert_eq!(rate_limit("u-1", "like", "a-1"), "rl:u-1:like:a-1");
        assert_eq!(user_favorites("u-1"), "fav:user:u-1");
        assert_eq!(artwork_lock("a-1"), "lock:artwork:a-1");
    }

    #[test]
    fn rate_limit_pattern_matches_rate_limit_keys() {
        let key = rate_limit("u-9", "share", "a-3");
        let prefix = rate_limit_pattern("u-9");
        assert!(key.starts_with(prefix.trim_end_matches('*')));
    }
}
