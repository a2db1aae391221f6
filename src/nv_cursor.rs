//! Replay Cursor
//!
//! Owns the single live `GraphSnapshot` of a replay and a forward-only
//! position in the tick-sorted change log. `advance_to(t)` applies every
//! pending event with `event.tick < t`; an event stamped exactly `t` becomes
//! visible from the next, later target. Targets must be non-decreasing.
use log::debug;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_graph::GraphSnapshot;
use crate::nv_interface::{ChangeOperation, ConnectivityChangeEvent, Tick};

/// Counters over the lifetime of a cursor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorStats {
    /// Events consumed from the log
    pub applied: usize,
    /// Adds that created an edge
    pub edges_added: usize,
    /// Deletes that removed an edge
    pub edges_removed: usize,
    /// Duplicate adds and deletes of absent edges
    pub noops: usize,
}

pub struct ReplayCursor {
    events: Vec<ConnectivityChangeEvent>,
    position: usize,
    graph: GraphSnapshot,
    last_target: Option<Tick>,
    stats: CursorStats,
}

impl ReplayCursor {
    /// Events may arrive in any order; they are sorted by tick here, ties
    /// keep their log order.
    pub fn new(initial: GraphSnapshot, mut events: Vec<ConnectivityChangeEvent>) -> Self {
        events.sort_by_key(|e| e.tick);
        Self {
            events,
            position: 0,
            graph: initial,
            last_target: None,
            stats: CursorStats::default(),
        }
    }

    /// Bring the graph to the topology in effect at `target`
    pub fn advance_to(&mut self, target: Tick) -> Result<&GraphSnapshot> {
        if let Some(previous) = self.last_target {
            if target < previous {
                return Err(ReplayError::OrderingViolation {
                    previous,
                    requested: target,
                });
            }
        }
        self.last_target = Some(target);

        while let Some(event) = self.events.get(self.position) {
            if event.tick >= target {
                break;
            }
            let changed = match event.operation {
                ChangeOperation::Add => self.graph.add_edge(&event.lhs_node, &event.rhs_node),
                ChangeOperation::Delete => {
                    self.graph.remove_edge(&event.lhs_node, &event.rhs_node)
                }
            };

            if changed {
                match event.operation {
                    ChangeOperation::Add => self.stats.edges_added += 1,
                    ChangeOperation::Delete => self.stats.edges_removed += 1,
                }
                debug!(
                    "tick {}: {} {}",
                    event.tick,
                    event.operation,
                    event.edge()
                );
            } else {
                self.stats.noops += 1;
                debug!(
                    "tick {}: {} {} has no effect",
                    event.tick,
                    event.operation,
                    event.edge()
                );
            }

            self.stats.applied += 1;
            self.position += 1;
        }

        Ok(&self.graph)
    }

    pub fn graph(&self) -> &GraphSnapshot {
        &self.graph
    }

    pub fn into_graph(self) -> GraphSnapshot {
        self.graph
    }

    /// Index of the next event to apply
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn pending(&self) -> &[ConnectivityChangeEvent] {
        &self.events[self.position..]
    }

    pub fn last_target(&self) -> Option<Tick> {
        self.last_target
    }

    pub fn stats(&self) -> CursorStats {
        self.stats
    }
}
