// Replay Session
//
// Wires the pieces together for one run:
//   topology -> cursor <- change log
//   accuracy -> sampler -> (cursor.advance_to -> projector -> sink) per tick

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::nv_cursor::{CursorStats, ReplayCursor};
use crate::nv_errors::{ReplayError, Result};
use crate::nv_event_log::load_optional_change_log;
use crate::nv_graph::GraphSnapshot;
use crate::nv_interface::{ConnectivityChangeEvent, Frame, FrameSink, Tick};
use crate::nv_projector::FrameProjector;
use crate::nv_sampler::{SamplingConfig, TickSampler};
use crate::nv_series::{AccuracyTable, SeriesTable};
use crate::nv_topology::SimulatorConfig;

// ============================================================================
// Configuration
// ============================================================================

/// Everything a replay run needs to find its inputs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulator JSON holding the node list and static topology
    pub simulator_config_path: PathBuf,

    /// Per-node accuracy series (CSV, tick index in the first column)
    pub accuracy_path: PathBuf,

    /// Peer change log; a missing file means a static topology
    pub peer_change_path: Option<PathBuf>,

    #[serde(flatten)]
    pub sampling: SamplingConfig,

    pub output: OutputConfig,
}

/// Where frames go besides the caller's own sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log one line per frame
    pub log_frames: bool,

    /// Write Graphviz files here
    pub dot_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            simulator_config_path: PathBuf::from("simulator_config.json"),
            accuracy_path: PathBuf::from("accuracy.csv"),
            peer_change_path: Some(PathBuf::from("peer_change_record.txt")),
            sampling: SamplingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_frames: true,
            dot_dir: None,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from YAML; relative paths are taken relative to the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
        let mut config = Self::from_yaml(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn resolve_relative_to(&mut self, base: &Path) {
        fn rebase(base: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        rebase(base, &mut self.simulator_config_path);
        rebase(base, &mut self.accuracy_path);
        if let Some(path) = self.peer_change_path.as_mut() {
            rebase(base, path);
        }
        if let Some(path) = self.output.dot_dir.as_mut() {
            rebase(base, path);
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Outcome of a completed replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub frames_rendered: usize,
    pub first_tick: Option<Tick>,
    pub last_tick: Option<Tick>,
    pub final_node_count: usize,
    pub final_edge_count: usize,
    pub cursor: CursorStats,
}

impl ReplaySummary {
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║    TOPOLOGY REPLAY RESULTS                             ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("═══ Frames ═══");
        println!("  Rendered: {}", self.frames_rendered);
        match (self.first_tick, self.last_tick) {
            (Some(first), Some(last)) => println!("  Ticks: {} .. {}", first, last),
            _ => println!("  Ticks: none in range"),
        }
        println!();

        println!("═══ Peer Changes ═══");
        println!("  Applied: {}", self.cursor.applied);
        println!("  Edges Added: {}", self.cursor.edges_added);
        println!("  Edges Removed: {}", self.cursor.edges_removed);
        println!("  No-ops: {}", self.cursor.noops);
        println!();

        println!("═══ Final Topology ═══");
        println!(
            "  {} nodes, {} edges",
            self.final_node_count, self.final_edge_count
        );
        println!();
    }
}

/// One forward pass over a simulation run
///
/// The session owns the cursor and therefore the only live graph; it is
/// consumed by `run`.
pub struct ReplaySession {
    cursor: ReplayCursor,
    accuracy: AccuracyTable,
    sampling: SamplingConfig,
}

impl ReplaySession {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let simulator = SimulatorConfig::load(&config.simulator_config_path)?;
        let graph = simulator.initial_graph()?;
        let accuracy = SeriesTable::load_accuracy(&config.accuracy_path)?;
        let events = match &config.peer_change_path {
            Some(path) => load_optional_change_log(path)?,
            None => Vec::new(),
        };
        Ok(Self::from_parts(graph, events, accuracy, config.sampling))
    }

    pub fn from_parts(
        graph: GraphSnapshot,
        events: Vec<ConnectivityChangeEvent>,
        accuracy: AccuracyTable,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            cursor: ReplayCursor::new(graph, events),
            accuracy,
            sampling,
        }
    }

    pub fn accuracy(&self) -> &AccuracyTable {
        &self.accuracy
    }

    /// Render every sampled tick in ascending order. The first failing frame
    /// (missing accuracy, sink error) ends the run with that error.
    pub fn run(mut self, sink: &mut dyn FrameSink) -> Result<ReplaySummary> {
        let sampler = TickSampler::new(self.accuracy.ticks(), self.sampling)?;
        if sampler.is_empty() {
            warn!(
                "no ticks between {} and {}, nothing to render",
                self.sampling.from_tick, self.sampling.stop_tick
            );
        } else {
            info!(
                "replaying {} frames (ticks {}..={}, stride {})",
                sampler.len(),
                self.sampling.from_tick,
                self.sampling.stop_tick,
                self.sampling.stride
            );
        }

        let projector = FrameProjector::new(&self.accuracy);
        let mut frames_rendered = 0;
        let mut first_tick = None;
        let mut last_tick = None;

        for tick in sampler.iter() {
            let graph = self.cursor.advance_to(tick)?;
            let projection = projector.project(graph, tick)?;
            sink.render(&Frame {
                tick,
                graph,
                projection: &projection,
            })?;

            frames_rendered += 1;
            first_tick.get_or_insert(tick);
            last_tick = Some(tick);
        }

        let graph = self.cursor.graph();
        let summary = ReplaySummary {
            frames_rendered,
            first_tick,
            last_tick,
            final_node_count: graph.node_count(),
            final_edge_count: graph.edge_count(),
            cursor: self.cursor.stats(),
        };
        info!(
            "replay done: {} frames, {} peer changes applied",
            summary.frames_rendered, summary.cursor.applied
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nv_interface::{EdgeKey, Rgb};
    use crate::nv_sinks::CollectorFrameSink;
    use crate::nv_topology::build_initial_graph;

    fn accuracy(ticks: &[Tick]) -> AccuracyTable {
        let rows = ticks
            .iter()
            .map(|t| (*t, vec![Some(0.0), Some(0.5), Some(1.0)]))
            .collect();
        SeriesTable::from_rows(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows,
        )
        .unwrap()
    }

    fn scenario_session(sampling: SamplingConfig) -> ReplaySession {
        let graph = build_initial_graph(["A", "B", "C"], ["A--B", "B--C"]).unwrap();
        let events = vec![
            ConnectivityChangeEvent::delete(10, "A", "B"),
            ConnectivityChangeEvent::add(5, "A", "C"),
        ];
        ReplaySession::from_parts(graph, events, accuracy(&[3, 5, 7, 10, 12]), sampling)
    }

    #[test]
    fn test_run_renders_scenario_frames() {
        let session = scenario_session(SamplingConfig {
            from_tick: 0,
            stop_tick: 100,
            stride: 1,
        });
        let mut sink = CollectorFrameSink::new();
        let summary = session.run(&mut sink).unwrap();

        assert_eq!(sink.ticks(), vec![3, 5, 7, 10, 12]);
        assert_eq!(summary.frames_rendered, 5);
        assert_eq!(summary.first_tick, Some(3));
        assert_eq!(summary.last_tick, Some(12));
        assert_eq!(summary.cursor.applied, 2);
        assert_eq!(summary.final_edge_count, 2);

        // event at tick 5 shows from the next frame on
        assert_eq!(sink.at(5).unwrap().edges.len(), 2);
        assert_eq!(
            sink.at(7).unwrap().edges,
            vec![EdgeKey::new("A", "B"), EdgeKey::new("A", "C"), EdgeKey::new("B", "C")]
        );
        assert_eq!(sink.at(10).unwrap().edges.len(), 3);
        assert_eq!(
            sink.at(12).unwrap().edges,
            vec![EdgeKey::new("A", "C"), EdgeKey::new("B", "C")]
        );

        let frame = sink.at(12).unwrap();
        assert_eq!(frame.colors["A"], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(frame.colors["B"], Rgb::new(0.0, 1.0, 1.0));
        assert_eq!(frame.labels["C"], "C:1.0");
    }

    #[test]
    fn test_stride_and_range() {
        let session = scenario_session(SamplingConfig {
            from_tick: 4,
            stop_tick: 11,
            stride: 2,
        });
        let mut sink = CollectorFrameSink::new();
        let summary = session.run(&mut sink).unwrap();
        assert_eq!(sink.ticks(), vec![5, 10]);
        // the tick 10 delete is still pending
        assert_eq!(summary.cursor.applied, 1);
    }

    #[test]
    fn test_huge_stride_renders_first_tick() {
        let session = scenario_session(SamplingConfig {
            from_tick: 0,
            stop_tick: 20,
            stride: usize::MAX,
        });
        let mut sink = CollectorFrameSink::new();
        let summary = session.run(&mut sink).unwrap();
        assert_eq!(summary.frames_rendered, 1);
        assert_eq!(sink.ticks(), vec![3]);
    }

    #[test]
    fn test_empty_sample_renders_nothing() {
        let session = scenario_session(SamplingConfig {
            from_tick: 50,
            stop_tick: 60,
            stride: 1,
        });
        let mut sink = CollectorFrameSink::new();
        let summary = session.run(&mut sink).unwrap();
        assert_eq!(summary.frames_rendered, 0);
        assert_eq!(summary.first_tick, None);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_missing_accuracy_aborts_run() {
        let graph = GraphSnapshot::with_nodes(["A", "B"]);
        // node Z joins through the log but has no accuracy column
        let events = vec![ConnectivityChangeEvent::add(1, "A", "Z")];
        let session = ReplaySession::from_parts(
            graph,
            events,
            accuracy(&[0, 2]),
            SamplingConfig::default(),
        );
        let mut sink = CollectorFrameSink::new();
        match session.run(&mut sink) {
            Err(ReplayError::Lookup { tick, node }) => {
                assert_eq!(tick, 2);
                assert_eq!(node, "Z");
            }
            other => panic!("expected lookup error, got {:?}", other),
        }
        // the frame before the failure was delivered
        assert_eq!(sink.ticks(), vec![0]);
    }

    #[test]
    fn test_session_config_yaml() {
        let yaml = r#"
simulator_config_path: run1/simulator_config.json
accuracy_path: /data/run1/accuracy.csv
from_tick: 100
stride: 5
output:
  dot_dir: frames
"#;
        let mut config = SessionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sampling.from_tick, 100);
        assert_eq!(config.sampling.stop_tick, 20_000);
        assert_eq!(config.sampling.stride, 5);
        assert!(config.output.log_frames);
        assert_eq!(
            config.peer_change_path,
            Some(PathBuf::from("peer_change_record.txt"))
        );

        config.resolve_relative_to(Path::new("/experiments"));
        assert_eq!(
            config.simulator_config_path,
            PathBuf::from("/experiments/run1/simulator_config.json")
        );
        assert_eq!(config.accuracy_path, PathBuf::from("/data/run1/accuracy.csv"));
        assert_eq!(config.output.dot_dir, Some(PathBuf::from("/experiments/frames")));
    }

    #[test]
    fn test_session_from_files() {
        let dir = std::env::temp_dir().join("nv_rust_session_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("simulator_config.json"),
            r#"{"nodes": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
                "node_topology": ["A--B", "B->C"],
                "services": {"peer_control_service": {"enable": false}}}"#,
        )
        .unwrap();
        fs::write(dir.join("accuracy.csv"), ",A,B,C\n0,0.1,0.2,0.3\n10,0.4,0.5,0.6\n").unwrap();
        fs::write(
            dir.join("peer_change_record.txt"),
            "tick:5 A(accuracy:0.1) delete B(buffer:2)\n",
        )
        .unwrap();
        fs::write(dir.join("session.yaml"), "stop_tick: 100\n").unwrap();

        let config = SessionConfig::load(dir.join("session.yaml")).unwrap();
        let session = ReplaySession::new(&config).unwrap();
        assert_eq!(session.accuracy().row_count(), 2);

        let mut sink = CollectorFrameSink::new();
        let summary = session.run(&mut sink).unwrap();
        assert_eq!(summary.frames_rendered, 2);
        assert_eq!(sink.at(0).unwrap().edges.len(), 2);
        assert_eq!(sink.at(10).unwrap().edges, vec![EdgeKey::new("B", "C")]);
        assert_eq!(sink.at(10).unwrap().labels["B"], "B:0.5");

        let _ = fs::remove_dir_all(&dir);
    }
}
