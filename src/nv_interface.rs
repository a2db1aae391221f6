use std::fmt;

use crate::nv_errors::Result;
use crate::nv_graph::GraphSnapshot;
use crate::nv_projector::FrameProjection;

// ============================================================================
// Core Types
// ============================================================================

/// Simulated time unit shared by the accuracy series and the change log
pub type Tick = u64;

/// Nodes are identified by name only
pub type NodeName = String;

/// Undirected edge, keyed by its unordered node pair
///
/// `EdgeKey::new("B", "A")` and `EdgeKey::new("A", "B")` are the same key, so
/// duplicate links collapse to one entry wherever keys are collected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    lo: NodeName,
    hi: NodeName,
}

impl EdgeKey {
    pub fn new(a: impl Into<NodeName>, b: impl Into<NodeName>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> &str {
        &self.lo
    }

    pub fn hi(&self) -> &str {
        &self.hi
    }

    pub fn contains(&self, node: &str) -> bool {
        self.lo == node || self.hi == node
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.lo, self.hi)
    }
}

// ============================================================================
// Connectivity Change Events
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeOperation {
    Add,
    Delete,
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOperation::Add => write!(f, "add"),
            ChangeOperation::Delete => write!(f, "delete"),
        }
    }
}

/// One connectivity change taken from the peer change log
///
/// Immutable once parsed. Ordering across events is by `tick`, ties keep
/// their log order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectivityChangeEvent {
    pub tick: Tick,
    pub lhs_node: NodeName,
    pub rhs_node: NodeName,
    pub operation: ChangeOperation,
}

impl ConnectivityChangeEvent {
    pub fn add(tick: Tick, lhs: &str, rhs: &str) -> Self {
        Self {
            tick,
            lhs_node: lhs.to_string(),
            rhs_node: rhs.to_string(),
            operation: ChangeOperation::Add,
        }
    }

    pub fn delete(tick: Tick, lhs: &str, rhs: &str) -> Self {
        Self {
            tick,
            lhs_node: lhs.to_string(),
            rhs_node: rhs.to_string(),
            operation: ChangeOperation::Delete,
        }
    }

    pub fn edge(&self) -> EdgeKey {
        EdgeKey::new(self.lhs_node.clone(), self.rhs_node.clone())
    }
}

// ============================================================================
// Colours
// ============================================================================

/// RGB colour with components in [0.0, 1.0]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form, components clamped to [0, 1]
    pub fn to_hex(&self) -> String {
        fn channel(c: f64) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

// ============================================================================
// Rendering Hand-off
// ============================================================================

/// Everything the rendering collaborator gets for one sampled tick
///
/// Borrows the live graph, so a frame is only valid until the next
/// `advance_to` on the cursor that owns it.
pub struct Frame<'a> {
    pub tick: Tick,
    pub graph: &'a GraphSnapshot,
    pub projection: &'a FrameProjection,
}

/// Trait for consuming rendered frames (drawing, file export, collection)
pub trait FrameSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Sink that discards every frame
pub struct NoOpSink;

impl FrameSink for NoOpSink {
    #[inline(always)]
    fn render(&mut self, _frame: &Frame<'_>) -> Result<()> {
        Ok(())
    }
}
