use hashbrown::HashMap;

use crate::nv_cursor::ReplayCursor;
use crate::nv_errors::{ReplayError, Result};
use crate::nv_graph::GraphSnapshot;
use crate::nv_interface::Tick;

/// Random access by tick on top of a forward-only cursor
///
/// Every tick the cache advances to is stored as a cloned snapshot, so any
/// visited tick can be served again later. Ticks past the cursor are
/// reached by advancing it. An unvisited tick behind the cursor cannot be
/// reconstructed and fails with `OrderingViolation`.
pub struct SnapshotCache {
    cursor: ReplayCursor,
    snapshots: HashMap<Tick, GraphSnapshot>,
}

impl SnapshotCache {
    pub fn new(cursor: ReplayCursor) -> Self {
        Self {
            cursor,
            snapshots: HashMap::new(),
        }
    }

    pub fn snapshot_at(&mut self, tick: Tick) -> Result<&GraphSnapshot> {
        if self.snapshots.contains_key(&tick) {
            return Ok(&self.snapshots[&tick]);
        }
        if let Some(previous) = self.cursor.last_target() {
            if tick < previous {
                return Err(ReplayError::OrderingViolation {
                    previous,
                    requested: tick,
                });
            }
        }
        let snapshot = self.cursor.advance_to(tick)?.clone();
        Ok(&*self.snapshots.entry(tick).or_insert(snapshot))
    }

    pub fn is_cached(&self, tick: Tick) -> bool {
        self.snapshots.contains_key(&tick)
    }

    /// Cached ticks, ascending
    pub fn cached_ticks(&self) -> Vec<Tick> {
        let mut ticks: Vec<Tick> = self.snapshots.keys().copied().collect();
        ticks.sort_unstable();
        ticks
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nv_interface::ConnectivityChangeEvent;
    use crate::nv_topology::build_initial_graph;

    fn scenario_cache() -> SnapshotCache {
        let initial = build_initial_graph(["A", "B", "C"], ["A--B", "B--C"]).unwrap();
        let events = vec![
            ConnectivityChangeEvent::add(5, "A", "C"),
            ConnectivityChangeEvent::delete(10, "A", "B"),
        ];
        SnapshotCache::new(ReplayCursor::new(initial, events))
    }

    #[test]
    fn test_revisit_earlier_tick() {
        let mut cache = scenario_cache();
        assert_eq!(cache.snapshot_at(7).unwrap().edge_count(), 3);
        assert!(!cache.snapshot_at(12).unwrap().has_edge("A", "B"));

        // served from the cache, the cursor stays at 12
        let earlier = cache.snapshot_at(7).unwrap();
        assert!(earlier.has_edge("A", "B"));
        assert!(earlier.has_edge("A", "C"));
        assert_eq!(cache.cursor().last_target(), Some(12));
        assert_eq!(cache.cached_ticks(), vec![7, 12]);
    }

    #[test]
    fn test_unvisited_earlier_tick_fails() {
        let mut cache = scenario_cache();
        cache.snapshot_at(12).unwrap();
        assert!(!cache.is_cached(3));
        assert!(matches!(
            cache.snapshot_at(3),
            Err(ReplayError::OrderingViolation {
                previous: 12,
                requested: 3
            })
        ));
    }
}
