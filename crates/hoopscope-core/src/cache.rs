// Time-to-live cache with lazy expiry.
//
// Entries expire a fixed time after they were stored, however often they are
// read. Expired entries are not swept; a lookup simply treats them as missing
// and the next insert for the key overwrites them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

/// One cached value and when it was created.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: Arc<V>,
    pub created_at: DateTime<Utc>,
}

impl<K, V> CacheEntry<K, V> {
    /// Fresh while `now < created_at + ttl`. An expiry past the end of
    /// representable time never arrives.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.created_at
            .checked_add_signed(ttl)
            .map_or(true, |expires| now < expires)
    }
}

/// Keyed TTL cache. The map lock is only held for individual map operations,
/// so callers may compute values for different keys concurrently.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<K, V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The value for `key` if present and not expired.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Store `value` under `key`, stamped with the current time, replacing
    /// whatever was there. Returns the shared value.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let entry = CacheEntry {
            key: key.clone(),
            value: Arc::clone(&value),
            created_at: self.clock.now(),
        };
        self.entries().insert(key, entry);
        value
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.entries().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Number of entries that would currently be served.
    pub fn fresh_len(&self) -> usize {
        let now = self.clock.now();
        self.entries()
            .values()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .count()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<K, V>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn setup() -> (Arc<ManualClock>, TtlCache<i32, String>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let cache = TtlCache::new(Duration::seconds(3600), clock.clone() as Arc<dyn Clock>);
        (clock, cache)
    }

    #[test]
    fn hit_returns_the_same_shared_value() {
        let (_clock, cache) = setup();
        let stored = cache.insert(2023, "table".to_string());
        let hit = cache.get(&2023).unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
    }

    #[test]
    fn miss_for_unknown_key() {
        let (_clock, cache) = setup();
        cache.insert(2023, "a".into());
        assert!(cache.get(&2022).is_none());
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let (clock, cache) = setup();
        cache.insert(2023, "a".into());

        clock.advance(Duration::seconds(3599));
        assert!(cache.get(&2023).is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get(&2023).is_none());
        // Lazy expiry: still stored until overwritten.
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.fresh_len(), 0);
    }

    #[test]
    fn reads_do_not_extend_lifetime() {
        let (clock, cache) = setup();
        cache.insert(2023, "a".into());
        for _ in 0..5 {
            clock.advance(Duration::seconds(700));
            let _ = cache.get(&2023);
        }
        // 3500s elapsed, then 100 more.
        clock.advance(Duration::seconds(100));
        assert!(cache.get(&2023).is_none());
    }

    #[test]
    fn insert_replaces_and_restamps() {
        let (clock, cache) = setup();
        cache.insert(2023, "old".into());
        clock.advance(Duration::seconds(3000));
        cache.insert(2023, "new".into());
        clock.advance(Duration::seconds(3000));
        assert_eq!(cache.get(&2023).as_deref().map(String::as_str), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_and_clear() {
        let (_clock, cache) = setup();
        cache.insert(1, "a".into());
        cache.insert(2, "b".into());
        assert!(cache.invalidate(&1));
        assert!(!cache.invalidate(&1));
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&2).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_freshness_boundary() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = CacheEntry {
            key: 2020,
            value: Arc::new(()),
            created_at: t,
        };
        let ttl = Duration::seconds(10);
        assert!(entry.is_fresh(t, ttl));
        assert!(entry.is_fresh(t + Duration::seconds(9), ttl));
        assert!(!entry.is_fresh(t + Duration::seconds(10), ttl));
    }

    #[test]
    fn huge_ttl_never_expires_and_never_overflows() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let cache: TtlCache<i32, String> =
            TtlCache::new(Duration::MAX, clock.clone() as Arc<dyn Clock>);
        cache.insert(2023, "a".into());
        assert!(cache.get(&2023).is_some());
        clock.advance(Duration::days(365 * 100));
        assert!(cache.get(&2023).is_some());
        assert_eq!(cache.fresh_len(), 1);
    }
}
