//! Longest dot-label-aligned prefix routing table.
//!
//! Lookup walks the destination address from its full label sequence down to
//! the root, stopping at the first configured prefix that has entries. This
//! crate has no knowledge of peers beyond their opaque [`PeerId`] — it never
//! dials or authenticates anything.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ilp_types::{IlpAddress, PeerId};

/// One configured route: a next hop plus its tie-break metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: PeerId,
    pub priority: i32,
    /// Monotonic insertion order, used as the final tie-break (earlier wins).
    seq: u64,
}

/// The routing table: prefix -> candidate next hops.
///
/// Concurrent-safe via `DashMap` so the packet handler can look up routes
/// while the admin surface mutates them.
pub struct RoutingTable {
    routes: DashMap<String, Vec<RouteEntry>>,
    seq: AtomicU64,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Add a route for `prefix` pointing at `next_hop`. Idempotent by
    /// `(prefix, next_hop)`: re-adding the same pair updates its priority in
    /// place rather than creating a duplicate entry.
    pub fn add(&self, prefix: &IlpAddress, next_hop: PeerId, priority: i32) {
        let mut entries = self.routes.entry(prefix.as_str().to_string()).or_default();
        if let Some(existing) = entries.iter_mut().find(|e| e.next_hop == next_hop) {
            existing.priority = priority;
            return;
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        entries.push(RouteEntry {
            next_hop,
            priority,
            seq,
        });
    }

    /// Remove all routes configured for `prefix`. Returns whether anything
    /// was removed.
    pub fn remove(&self, prefix: &IlpAddress) -> bool {
        self.routes.remove(prefix.as_str()).is_some()
    }

    /// Longest-prefix match against `destination`, breaking ties by priority
    /// (ascending, lower wins) then by insertion order (earlier wins).
    pub fn lookup(&self, destination: &IlpAddress) -> Option<PeerId> {
        let labels = destination.labels();
        for end in (1..=labels.len()).rev() {
            let candidate_prefix = labels[..end].join(".");
            if let Some(entries) = self.routes.get(&candidate_prefix) {
                if let Some(best) = entries
                    .iter()
                    .min_by_key(|e| (e.priority, e.seq))
                {
                    return Some(best.next_hop.clone());
                }
            }
        }
        None
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IlpAddress {
        IlpAddress::parse(s).unwrap()
    }

    #[test]
    fn lookup_misses_with_no_routes() {
        let table = RoutingTable::new();
        assert_eq!(table.lookup(&addr("g.a.b.c")), None);
    }

    #[test]
    fn lookup_matches_exact_and_descendant() {
        let table = RoutingTable::new();
        table.add(&addr("g.a"), "peer1".to_string(), 0);
        assert_eq!(table.lookup(&addr("g.a")), Some("peer1".to_string()));
        assert_eq!(table.lookup(&addr("g.a.b.c")), Some("peer1".to_string()));
    }

    #[test]
    fn lookup_is_label_aligned_not_substring() {
        let table = RoutingTable::new();
        table.add(&addr("g.a"), "peer1".to_string(), 0);
        assert_eq!(table.lookup(&addr("g.ab")), None);
    }

    #[test]
    fn longest_prefix_wins_over_shorter() {
        let table = RoutingTable::new();
        table.add(&addr("g.a"), "peer1".to_string(), 0);
        table.add(&addr("g.a.b"), "peer2".to_string(), 0);
        assert_eq!(table.lookup(&addr("g.a.b.c")), Some("peer2".to_string()));
        assert_eq!(table.lookup(&addr("g.a.x")), Some("peer1".to_string()));
    }

    #[test]
    fn ties_broken_by_priority_then_insertion_order() {
        let table = RoutingTable::new();
        table.add(&addr("g.a"), "peer1".to_string(), 5);
        table.add(&addr("g.a"), "peer2".to_string(), 1);
        assert_eq!(table.lookup(&addr("g.a")), Some("peer2".to_string()));

        table.add(&addr("g.b"), "first".to_string(), 0);
        table.add(&addr("g.b"), "second".to_string(), 0);
        assert_eq!(table.lookup(&addr("g.b")), Some("first".to_string()));
    }

    #[test]
    fn add_is_idempotent_by_prefix_and_next_hop() {
        let table = RoutingTable::new();
        table.add(&addr("g.a"), "peer1".to_string(), 5);
        table.add(&addr("g.a"), "peer1".to_string(), 1);
        let entries = table.routes.get("g.a").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].priority, 1);
    }

    #[test]
    fn remove_reports_whether_anything_was_removed() {
        let table = RoutingTable::new();
        assert!(!table.remove(&addr("g.a")));
        table.add(&addr("g.a"), "peer1".to_string(), 0);
        assert!(table.remove(&addr("g.a")));
        assert_eq!(table.lookup(&addr("g.a")), None);
    }
}
