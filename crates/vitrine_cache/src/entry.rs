//! Cached values with absolute expiry

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value and the moment it stops being valid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    /// Milliseconds since the Unix epoch
    pub expires_at_ms: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, now_ms: u64, ttl: Duration) -> Self {
        Self {
            value,
            expires_at_ms: now_ms.saturating_add(ttl.as_millis() as u64),
        }
    }

    /// An entry is expired from `expires_at_ms` onwards
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at_ms.saturating_sub(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary() {
        let entry = CacheEntry::new("v", 1_000, Duration::from_millis(500));
        assert!(!entry.is_expired(1_499));
        assert!(entry.is_expired(1_500));
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn remaining_saturates() {
        let entry = CacheEntry::new((), 0, Duration::from_secs(2));
        assert_eq!(entry.remaining(500), Duration::from_millis(1_500));
        assert_eq!(entry.remaining(5_000), Duration::ZERO);
    }
}
