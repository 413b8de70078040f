use std::collections::HashMap;
use std::time::{Duration, Instant};

use calcrpc_common::OperationResult;

/// In-memory result cache with a time-to-live.
///
/// Expiry is checked when an entry is read, and every insert drops the
/// entries that have already expired. Nothing sweeps in the background.
#[derive(Debug)]
pub struct MemoryTier {
    ttl: Duration,
    entries: HashMap<String, (OperationResult, Instant)>,
}

impl MemoryTier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a fresh entry, dropping it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<OperationResult> {
        let expired = match self.entries.get(key) {
            Some((result, stored_at)) if stored_at.elapsed() < self.ttl => {
                return Some(result.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            tracing::debug!("Memory entry '{}' expired", key);
            self.entries.remove(key);
        }
        None
    }

    /// Stores `result` under `key` with a fresh timestamp.
    pub fn insert(&mut self, key: impl Into<String>, result: OperationResult) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
        self.entries.insert(key.into(), (result, Instant::now()));
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
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let mut tier = MemoryTier::new(Duration::from_secs(60));
        tier.insert("sum 2 3", OperationResult::Scalar(5.0));
        assert_eq!(tier.get("sum 2 3"), Some(OperationResult::Scalar(5.0)));
        assert_eq!(tier.get("sum 3 2"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped_on_read() {
        let mut tier = MemoryTier::new(Duration::from_millis(20));
        tier.insert("sum 2 3", OperationResult::Scalar(5.0));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(tier.get("sum 2 3"), None);
        assert!(tier.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_entries() {
        let mut tier = MemoryTier::new(Duration::from_millis(50));
        tier.insert("sum 1 1", OperationResult::Scalar(2.0));
        tier.insert("sum 2 2", OperationResult::Scalar(4.0));
        std::thread::sleep(Duration::from_millis(80));

        // Neither old key is read again
        tier.insert("sum 3 3", OperationResult::Scalar(6.0));
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.get("sum 3 3"), Some(OperationResult::Scalar(6.0)));
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let mut tier = MemoryTier::new(Duration::ZERO);
        tier.insert("fat 3", OperationResult::Scalar(6.0));
        assert_eq!(tier.get("fat 3"), None);
    }

    #[test]
    fn test_reinsert_refreshes_timestamp() {
        let mut tier = MemoryTier::new(Duration::from_millis(200));
        tier.insert("news", OperationResult::Strings(vec!["old".into()]));
        std::thread::sleep(Duration::from_millis(120));
        tier.insert("news", OperationResult::Strings(vec!["new".into()]));
        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(
            tier.get("news"),
            Some(OperationResult::Strings(vec!["new".into()]))
        );
    }
}
