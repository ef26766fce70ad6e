//! Last-sent-value suppression for control changes.

use super::CcKey;
use dashmap::DashMap;

pub const DEFAULT_DEDUP_THRESHOLD: u8 = 2;

/// Suppresses control changes that barely differ from what is already on
/// the wire.
///
/// The baseline for a key only moves when the caller reports a successful
/// send via [`record_sent`](Self::record_sent), so a failed send is retried
/// on the next tick instead of being silently dropped.
#[derive(Debug)]
pub struct CcDeduplicator {
    last_sent: DashMap<CcKey, u8>,
    threshold: u8,
}

impl CcDeduplicator {
    pub fn new(threshold: u8) -> Self {
        Self {
            last_sent: DashMap::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// `true` when nothing was sent for `key` yet, or `value` differs from
    /// the last sent value by at least the threshold.
    pub fn should_send(&self, key: CcKey, value: u8) -> bool {
        match self.last_sent.get(&key) {
            Some(last) => value.abs_diff(*last) >= self.threshold,
            None => true,
        }
    }

    pub fn record_sent(&self, key: CcKey, value: u8) {
        self.last_sent.insert(key, value);
    }

    pub fn last_sent(&self, key: CcKey) -> Option<u8> {
        self.last_sent.get(&key).map(|v| *v)
    }

    /// Keys with a recorded baseline, sorted.
    pub fn keys(&self) -> Vec<CcKey> {
        let mut keys: Vec<CcKey> = self.last_sent.iter().map(|e| *e.key()).collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.last_sent.clear();
    }
}

impl Default for CcDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_always_sent() {
        let dedup = CcDeduplicator::default();
        assert!(dedup.should_send(CcKey::new(74, 0), 0));
    }

    #[test]
    fn test_threshold_sequence() {
        let dedup = CcDeduplicator::default();
        let key = CcKey::new(74, 0);
        let mut sent = Vec::new();

        for value in [50u8, 51, 53] {
            if dedup.should_send(key, value) {
                dedup.record_sent(key, value);
                sent.push(value);
            }
        }

        assert_eq!(sent, vec![50, 53]);
        assert_eq!(dedup.last_sent(key), Some(53));
    }

    #[test]
    fn test_baseline_unchanged_without_record() {
        let dedup = CcDeduplicator::new(2);
        let key = CcKey::new(1, 0);
        dedup.record_sent(key, 10);

        // Send failed, caller didn't record
        assert!(dedup.should_send(key, 20));
        assert_eq!(dedup.last_sent(key), Some(10));
    }

    #[test]
    fn test_keys_are_independent() {
        let dedup = CcDeduplicator::new(2);
        dedup.record_sent(CcKey::new(74, 0), 64);
        assert!(dedup.should_send(CcKey::new(74, 1), 64));
        assert!(dedup.should_send(CcKey::new(91, 0), 64));
        assert!(!dedup.should_send(CcKey::new(74, 0), 65));
        assert_eq!(dedup.keys().len(), 1);
    }

    #[test]
    fn test_zero_threshold_sends_repeats() {
        let dedup = CcDeduplicator::new(0);
        let key = CcKey::new(7, 0);
        dedup.record_sent(key, 100);
        assert!(dedup.should_send(key, 100));
    }
}
