//! Frame sinks: the hand-off point to whatever draws the network

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_interface::{EdgeKey, Frame, FrameSink, NodeName, Rgb, Tick};

// ============================================================================
// Log Sink
// ============================================================================

/// One log line per frame
pub struct LogFrameSink {
    enabled: bool,
}

impl LogFrameSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl FrameSink for LogFrameSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        info!(
            "{:>6} frame: {} nodes, {} edges",
            frame.tick,
            frame.graph.node_count(),
            frame.graph.edge_count()
        );
        Ok(())
    }
}

// ============================================================================
// Graphviz DOT Sink
// ============================================================================

/// Writes `tick_<n>.dot` per frame into a directory
pub struct DotFrameSink {
    dir: PathBuf,
    written: usize,
}

impl DotFrameSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ReplayError::io(&dir, e))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn frame_path(&self, tick: Tick) -> PathBuf {
        self.dir.join(format!("tick_{}.dot", tick))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Undirected Graphviz source for one frame
pub fn write_dot<W: Write>(writer: &mut W, frame: &Frame<'_>) -> std::io::Result<()> {
    writeln!(writer, "graph {} {{", quote(&format!("tick_{}", frame.tick)))?;
    writeln!(writer, "  label={};", quote(&format!("tick = {}", frame.tick)))?;
    writeln!(writer, "  layout=circo;")?;
    writeln!(writer, "  node [style=filled, fontcolor=black];")?;

    for node in frame.graph.nodes() {
        let label = frame
            .projection
            .labels
            .get(node)
            .map(String::as_str)
            .unwrap_or(node);
        match frame.projection.colors.get(node) {
            Some(color) => writeln!(
                writer,
                "  {} [label={}, fillcolor={}];",
                quote(node),
                quote(label),
                quote(&color.to_hex())
            )?,
            None => writeln!(writer, "  {} [label={}];", quote(node), quote(label))?,
        }
    }
    for edge in frame.graph.edges() {
        writeln!(writer, "  {} -- {};", quote(edge.lo()), quote(edge.hi()))?;
    }
    writeln!(writer, "}}")
}

impl FrameSink for DotFrameSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        let path = self.frame_path(frame.tick);
        let file = File::create(&path).map_err(|e| ReplayError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        write_dot(&mut writer, frame)
            .and_then(|_| writer.flush())
            .map_err(|e| ReplayError::io(&path, e))?;
        self.written += 1;
        Ok(())
    }
}

// ============================================================================
// Collector Sink (In-Memory)
// ============================================================================

/// Owned copy of a frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    pub tick: Tick,
    pub nodes: Vec<NodeName>,
    pub edges: Vec<EdgeKey>,
    pub colors: IndexMap<NodeName, Rgb>,
    pub labels: IndexMap<NodeName, String>,
}

/// Keeps every frame in memory for programmatic analysis
#[derive(Default)]
pub struct CollectorFrameSink {
    pub frames: Vec<FrameRecord>,
}

impl CollectorFrameSink {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn ticks(&self) -> Vec<Tick> {
        self.frames.iter().map(|f| f.tick).collect()
    }

    pub fn at(&self, tick: Tick) -> Option<&FrameRecord> {
        self.frames.iter().find(|f| f.tick == tick)
    }
}

impl FrameSink for CollectorFrameSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.frames.push(FrameRecord {
            tick: frame.tick,
            nodes: frame.graph.nodes().map(str::to_string).collect(),
            edges: frame.graph.edges(),
            colors: frame.projection.colors.clone(),
            labels: frame.projection.labels.clone(),
        });
        Ok(())
    }
}

// ============================================================================
// Multi Sink
// ============================================================================

/// Fans each frame out to several sinks, stopping at the first failure
#[derive(Default)]
pub struct MultiFrameSink {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl MultiFrameSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FrameSink for MultiFrameSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        for sink in &mut self.sinks {
            sink.render(frame)?;
        }
        Ok(())
    }
}
