//! Keyed, de-duplicating fetch bookkeeping.
//!
//! Each remote query is identified by a [`QueryKey`] (kind + scope). The
//! cache tracks one entry per key: its fetch state and a request generation.
//! [`QueryCache::begin`] hands out a [`FetchTicket`] only when a fetch is
//! actually needed, so a key that is already loading or ready never issues a
//! duplicate request. [`QueryCache::apply`] accepts a result only when the
//! ticket's generation still matches the entry, which is what discards
//! responses that arrive for a superseded request.

use std::collections::HashMap;

/// The kind of remote query a cache entry corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// All currently active alerts, no scope.
    ActiveAlerts,
    /// Alerts scoped to an administrative area code.
    AreaAlerts,
    /// Alerts scoped to a zone id.
    ZoneAlerts,
    /// The zone list of an area.
    Zones,
}

/// Composite cache key: query kind plus the selected scope value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub scope: String,
}

impl QueryKey {
    /// Key for the global active-alerts feed.
    pub fn active() -> Self {
        Self {
            kind: QueryKind::ActiveAlerts,
            scope: String::new(),
        }
    }

    /// Key for the alerts of an administrative area.
    pub fn area(code: &str) -> Self {
        Self {
            kind: QueryKind::AreaAlerts,
            scope: code.to_string(),
        }
    }

    /// Key for the alerts of a zone.
    pub fn zone(id: &str) -> Self {
        Self {
            kind: QueryKind::ZoneAlerts,
            scope: id.to_string(),
        }
    }

    /// Key for the zone list of an area.
    pub fn zones(code: &str) -> Self {
        Self {
            kind: QueryKind::Zones,
            scope: code.to_string(),
        }
    }
}

/// Fetch state of a single key.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// Invalidated or superseded; the next `begin` issues a fresh fetch.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request succeeded.
    Ready(T),
    /// The last request failed; the message is surfaced as-is.
    Failed(String),
}

#[derive(Debug)]
struct CacheEntry<T> {
    state: FetchState<T>,
    generation: u64,
}

/// Proof that a fetch was begun for a key at a particular generation.
///
/// The driver that performs the actual request hands the ticket back to
/// [`QueryCache::apply`] together with the outcome; a ticket whose
/// generation has been superseded is silently discarded there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    generation: u64,
}

/// Per-key fetch cache with generation-based staleness discarding.
#[derive(Debug, Default)]
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
}

impl<T> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Request a fetch for `key`.
    ///
    /// Returns a ticket when a request should actually be issued (the key is
    /// unknown, idle, or failed). Returns `None` while a request is already
    /// in flight or a value is cached, which is the de-duplication contract:
    /// at most one in-flight request per key, and cached keys never refetch.
    pub fn begin(&mut self, key: &QueryKey) -> Option<FetchTicket> {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry {
                state: FetchState::Idle,
                generation: 0,
            });

        match entry.state {
            FetchState::Loading | FetchState::Ready(_) => None,
            FetchState::Idle | FetchState::Failed(_) => {
                entry.generation += 1;
                entry.state = FetchState::Loading;
                Some(FetchTicket {
                    key: key.clone(),
                    generation: entry.generation,
                })
            }
        }
    }

    /// Apply the outcome of a fetch begun with `ticket`.
    ///
    /// Returns `true` when the result was stored, `false` when the ticket
    /// was stale (the key was invalidated or re-begun after the ticket was
    /// issued) and the result discarded.
    ///
    /// # Panics
    ///
    /// Panics when no fetch was ever begun for the ticket's key. That is a
    /// programming error in the driver, not a remote failure.
    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<T, String>) -> bool {
        let entry = self
            .entries
            .get_mut(&ticket.key)
            .expect("fetch result applied for a key that was never begun");

        if entry.generation != ticket.generation {
            return false;
        }

        entry.state = match result {
            Ok(value) => FetchState::Ready(value),
            Err(message) => FetchState::Failed(message),
        };
        true
    }

    /// Invalidate a key: its cached state is dropped and any in-flight
    /// request for it becomes stale.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation += 1;
            entry.state = FetchState::Idle;
        }
    }

    /// Current fetch state of a key, if the key has ever been begun.
    pub fn state(&self, key: &QueryKey) -> Option<&FetchState<T>> {
        self.entries.get(key).map(|entry| &entry.state)
    }

    /// The cached value for a key, if its last fetch succeeded.
    pub fn value(&self, key: &QueryKey) -> Option<&T> {
        match self.state(key) {
            Some(FetchState::Ready(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether a request for this key is in flight.
    pub fn is_loading(&self, key: &QueryKey) -> bool {
        matches!(self.state(key), Some(FetchState::Loading))
    }

    /// The surfaced error message for a key, if its last fetch failed.
    pub fn error(&self, key: &QueryKey) -> Option<&str> {
        match self.state(key) {
            Some(FetchState::Failed(message)) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_dedupes_inflight_requests() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::area("CA");

        let ticket = cache.begin(&key);
        assert!(ticket.is_some());
        // Same key again while loading: no second request
        assert!(cache.begin(&key).is_none());
        assert!(cache.is_loading(&key));
    }

    #[test]
    fn test_ready_key_does_not_refetch() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::active();

        let ticket = cache.begin(&key).unwrap();
        assert!(cache.apply(&ticket, Ok(vec![1, 2, 3])));

        assert!(cache.begin(&key).is_none());
        assert_eq!(cache.value(&key), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn test_failed_key_is_retried_with_new_generation() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::zone("CAZ043");

        let first = cache.begin(&key).unwrap();
        assert!(cache.apply(&first, Err("boom".to_string())));
        assert_eq!(cache.error(&key), Some("boom"));

        // A failed key is eligible again; the old ticket is now stale.
        let second = cache.begin(&key).unwrap();
        assert!(!cache.apply(&first, Ok(vec![9])));
        assert_eq!(cache.error(&key), None);
        assert!(cache.is_loading(&key));

        assert!(cache.apply(&second, Ok(vec![7])));
        assert_eq!(cache.value(&key), Some(&vec![7]));
    }

    #[test]
    fn test_invalidate_discards_inflight_result() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::zones("CA");

        let ticket = cache.begin(&key).unwrap();
        cache.invalidate(&key);

        // The response for the superseded request must not be applied.
        assert!(!cache.apply(&ticket, Ok(vec![1])));
        assert_eq!(cache.state(&key), Some(&FetchState::Idle));
        assert_eq!(cache.value(&key), None);
    }

    #[test]
    fn test_keys_are_isolated() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let ca = QueryKey::area("CA");
        let tx = QueryKey::area("TX");

        let ca_ticket = cache.begin(&ca).unwrap();
        let tx_ticket = cache.begin(&tx).unwrap();

        assert!(cache.apply(&tx_ticket, Ok(vec![2])));
        assert!(cache.is_loading(&ca));
        assert_eq!(cache.value(&tx), Some(&vec![2]));

        assert!(cache.apply(&ca_ticket, Ok(vec![1])));
        assert_eq!(cache.value(&ca), Some(&vec![1]));
        assert_eq!(cache.value(&tx), Some(&vec![2]));
    }

    #[test]
    fn test_kind_distinguishes_keys_with_same_scope() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let alerts = QueryKey::area("CA");
        let zones = QueryKey::zones("CA");

        assert!(cache.begin(&alerts).is_some());
        // Same scope, different kind: still a distinct request
        assert!(cache.begin(&zones).is_some());
    }

    #[test]
    #[should_panic(expected = "never begun")]
    fn test_apply_without_begin_is_a_usage_error() {
        let mut cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::area("CA");

        let ticket = cache.begin(&key).unwrap();
        let mut other: QueryCache<Vec<u32>> = QueryCache::new();
        other.apply(&ticket, Ok(vec![]));
    }
}
