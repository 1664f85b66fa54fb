//! Bounded cache of model-produced plans.

use indexmap::IndexMap;

use crate::executor::BatchPlan;
use crate::settings::ModelTier;

/// `(tier, context hash, normalized utterance)`
type CacheKey = (ModelTier, String, String);

/// Insertion-ordered; the oldest entry is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    entries: IndexMap<CacheKey, BatchPlan>,
}

/// Case and whitespace differences do not change the request.
pub fn normalize_utterance(utterance: &str) -> String {
    utterance
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::new(),
        }
    }

    fn key(tier: ModelTier, hash: &str, utterance: &str) -> CacheKey {
        (tier, hash.to_string(), normalize_utterance(utterance))
    }

    pub fn get(&self, tier: ModelTier, hash: &str, utterance: &str) -> Option<&BatchPlan> {
        self.entries.get(&Self::key(tier, hash, utterance))
    }

    pub fn insert(&mut self, tier: ModelTier, hash: &str, utterance: &str, plan: BatchPlan) {
        if self.capacity == 0 {
            return;
        }
        let key = Self::key(tier, hash, utterance);
        self.entries.shift_remove(&key);
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, plan);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::executor::RawAction;

    fn plan(action: &str) -> BatchPlan {
        BatchPlan::new(vec![RawAction::new(action, serde_json::json!({}))])
    }

    #[test]
    fn test_hit_ignores_case_and_spacing() {
        let mut cache = ResponseCache::new(4);
        cache.insert(ModelTier::Standard, "h", "Play  the beat", plan("play"));
        assert!(cache.get(ModelTier::Standard, "h", "play the beat ").is_some());
        assert!(cache.get(ModelTier::Fast, "h", "play the beat").is_none());
        assert!(cache.get(ModelTier::Standard, "other", "play the beat").is_none());
    }

    #[test]
    fn test_evicts_oldest() {
        let mut cache = ResponseCache::new(2);
        cache.insert(ModelTier::Standard, "h", "a", plan("play"));
        cache.insert(ModelTier::Standard, "h", "b", plan("stop"));
        cache.insert(ModelTier::Standard, "h", "c", plan("pause"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(ModelTier::Standard, "h", "a").is_none());
        assert!(cache.get(ModelTier::Standard, "h", "c").is_some());
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut cache = ResponseCache::new(0);
        cache.insert(ModelTier::Standard, "h", "a", plan("play"));
        assert!(cache.is_empty());
    }
}
