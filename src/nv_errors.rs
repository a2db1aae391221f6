//! Error types for topology replay

use std::path::PathBuf;

use thiserror::Error;

use crate::nv_interface::Tick;

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Every failure is fatal for the operation that raised it. Inputs are static
/// and fully buffered, so nothing here is worth retrying.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Malformed topology, dangling node reference or invalid parameters
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Malformed input line (change log, series table, console output)
    #[error("parse error on line {line_number}: {reason} (`{line}`)")]
    Parse {
        line_number: usize,
        line: String,
        reason: String,
    },

    /// A replay cursor was driven backwards
    #[error("ordering violation: requested tick {requested} after tick {previous}")]
    OrderingViolation { previous: Tick, requested: Tick },

    /// No value for a node at a tick that is about to be rendered
    #[error("no value for node `{node}` at tick {tick}")]
    Lookup { tick: Tick, node: String },

    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ReplayError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        ReplayError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn parse(line_number: usize, line: &str, reason: impl Into<String>) -> Self {
        ReplayError::Parse {
            line_number,
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReplayError::Io {
            path: path.into(),
            source,
        }
    }
}
