//! # nv_rust - Network Visualizer for Distributed-Learning Simulations
//!
//! Replays how a simulated learning network was wired over time and joins
//! every node to its accuracy at each rendered tick.
//!
//! ## Core Components
//!
//! - **Topology Builder** (`nv_topology`): initial graph from the simulator config
//! - **Event Log Parser** (`nv_event_log`): typed events from the peer change log
//! - **Tick Sampler** (`nv_sampler`): which ticks of the accuracy series to render
//! - **Replay Cursor** (`nv_cursor`): forward-only application of changes to one live graph
//! - **Frame Projector** (`nv_projector`): accuracy to colour and label per node
//!
//! ## Usage
//!
//! ```no_run
//! use nv_rust::{ReplaySession, SessionConfig};
//! use nv_rust::nv_sinks::CollectorFrameSink;
//!
//! let config = SessionConfig::load("session.yaml").unwrap();
//! let session = ReplaySession::new(&config).unwrap();
//!
//! let mut sink = CollectorFrameSink::new();
//! let summary = session.run(&mut sink).unwrap();
//! summary.print_summary();
//! ```
//!
//! Drawing is left to a `FrameSink`. The crate ships a logging sink, an
//! in-memory collector and a Graphviz DOT writer.

// Replay core
pub mod nv_cursor;
pub mod nv_event_log;
pub mod nv_graph;
pub mod nv_interface;
pub mod nv_projector;
pub mod nv_sampler;
pub mod nv_topology;

// Inputs, outputs and wiring
pub mod nv_errors;
pub mod nv_series;
pub mod nv_session;
pub mod nv_sinks;
pub mod nv_snapshot_cache;

// Re-export commonly used types
pub use nv_cursor::{CursorStats, ReplayCursor};
pub use nv_errors::{ReplayError, Result};
pub use nv_event_log::EventLogParser;
pub use nv_graph::GraphSnapshot;
pub use nv_interface::{
    ChangeOperation, ConnectivityChangeEvent, EdgeKey, Frame, FrameSink, NoOpSink, NodeName,
    Rgb, Tick,
};
pub use nv_projector::{FrameProjection, FrameProjector};
pub use nv_sampler::{SamplingConfig, TickSampler};
pub use nv_series::{AccuracyTable, SeriesTable};
pub use nv_session::{ReplaySession, ReplaySummary, SessionConfig};
pub use nv_snapshot_cache::SnapshotCache;
pub use nv_topology::{build_initial_graph, SimulatorConfig};
