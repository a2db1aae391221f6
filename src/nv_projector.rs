use indexmap::IndexMap;

use crate::nv_errors::Result;
use crate::nv_graph::GraphSnapshot;
use crate::nv_interface::{NodeName, Rgb, Tick};
use crate::nv_series::AccuracyTable;

/// HSV to RGB, all components in [0, 1]
///
/// Hue wraps around, so `h = 1.0` lands back on red.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    if s == 0.0 {
        return Rgb::new(v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// Accuracy is used directly as hue at full saturation and value:
/// 0 is red, ~0.33 green, ~0.67 blue, 1 red again
pub fn accuracy_color(accuracy: f64) -> Rgb {
    hsv_to_rgb(accuracy, 1.0, 1.0)
}

pub fn node_label(node: &str, accuracy: f64) -> String {
    format!("{}:{:?}", node, accuracy)
}

/// Per-node decoration for one rendered tick, keyed in graph node order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameProjection {
    pub tick: Tick,
    pub colors: IndexMap<NodeName, Rgb>,
    pub labels: IndexMap<NodeName, String>,
}

pub struct FrameProjector<'a> {
    accuracy: &'a AccuracyTable,
}

impl<'a> FrameProjector<'a> {
    pub fn new(accuracy: &'a AccuracyTable) -> Self {
        Self { accuracy }
    }

    /// Every live node must have an accuracy at `tick`; the first missing one
    /// fails the whole frame.
    pub fn project(&self, graph: &GraphSnapshot, tick: Tick) -> Result<FrameProjection> {
        let mut projection = FrameProjection {
            tick,
            colors: IndexMap::with_capacity(graph.node_count()),
            labels: IndexMap::with_capacity(graph.node_count()),
        };
        for node in graph.nodes() {
            let accuracy = self.accuracy.value(tick, node)?;
            projection
                .colors
                .insert(node.to_string(), accuracy_color(accuracy));
            projection
                .labels
                .insert(node.to_string(), node_label(node, accuracy));
        }
        Ok(projection)
    }
}
