//! Peer Change Log Parsing
//!
//! The simulator writes peer changes as free-form console lines, e.g.
//!
//! ```text
//! tick:1200 node3(accuracy:0.81) add node7(buffer:4) as peer
//! tick:1530 node3(accuracy:0.84) delete node7(buffer:0) from peers
//! ```
//!
//! The left node is the word right before `(accuracy`, the right node the word
//! right before `(buffer`, and the operation is whichever of the standalone
//! words `add` / `delete` occurs. Everything past this module works on typed
//! `ConnectivityChangeEvent`s.
use std::fs;
use std::path::Path;

use log::{debug, info};
use regex::Regex;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_interface::{ChangeOperation, ConnectivityChangeEvent, Tick};

const TICK_PATTERN: &str = r"tick:(\d+)";
const LHS_PATTERN: &str = r"\s(\w+)\(accuracy";
const RHS_PATTERN: &str = r"\s(\w+)\(buffer";
const ADD_PATTERN: &str = r"\sadd\s";
const DELETE_PATTERN: &str = r"\sdelete\s";

pub struct EventLogParser {
    tick: Regex,
    lhs: Regex,
    rhs: Regex,
    add: Regex,
    delete: Regex,
}

impl Default for EventLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogParser {
    pub fn new() -> Self {
        Self {
            tick: Regex::new(TICK_PATTERN).expect("tick pattern is valid"),
            lhs: Regex::new(LHS_PATTERN).expect("lhs pattern is valid"),
            rhs: Regex::new(RHS_PATTERN).expect("rhs pattern is valid"),
            add: Regex::new(ADD_PATTERN).expect("add pattern is valid"),
            delete: Regex::new(DELETE_PATTERN).expect("delete pattern is valid"),
        }
    }

    /// Parse one log line. `line_number` is 1-based and only used for errors.
    ///
    /// Whitespace-only lines yield `Ok(None)`.
    pub fn parse_line(
        &self,
        line_number: usize,
        line: &str,
    ) -> Result<Option<ConnectivityChangeEvent>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let tick: Tick = self
            .tick
            .captures(line)
            .and_then(|c| c.get(1))
            .ok_or_else(|| ReplayError::parse(line_number, line, "missing `tick:<n>` field"))?
            .as_str()
            .parse()
            .map_err(|e| ReplayError::parse(line_number, line, format!("bad tick: {}", e)))?;

        let lhs_node = self
            .lhs
            .captures(line)
            .and_then(|c| c.get(1))
            .ok_or_else(|| {
                ReplayError::parse(line_number, line, "missing `<node>(accuracy` marker")
            })?
            .as_str()
            .to_string();

        let rhs_node = self
            .rhs
            .captures(line)
            .and_then(|c| c.get(1))
            .ok_or_else(|| ReplayError::parse(line_number, line, "missing `<node>(buffer` marker"))?
            .as_str()
            .to_string();

        // Padding lets a keyword at either end of the line still match `\s..\s`
        let padded = format!(" {} ", line);
        let operation = match (self.add.is_match(&padded), self.delete.is_match(&padded)) {
            (true, false) => ChangeOperation::Add,
            (false, true) => ChangeOperation::Delete,
            (true, true) => {
                return Err(ReplayError::parse(
                    line_number,
                    line,
                    "both `add` and `delete` keywords present",
                ))
            }
            (false, false) => {
                return Err(ReplayError::parse(
                    line_number,
                    line,
                    "neither `add` nor `delete` keyword present",
                ))
            }
        };

        Ok(Some(ConnectivityChangeEvent {
            tick,
            lhs_node,
            rhs_node,
            operation,
        }))
    }

    /// Parse lines in order; the first malformed line aborts the whole parse
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<Vec<ConnectivityChangeEvent>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            if let Some(event) = self.parse_line(index + 1, line.as_ref())? {
                events.push(event);
            }
        }
        Ok(events)
    }

    pub fn parse_str(&self, text: &str) -> Result<Vec<ConnectivityChangeEvent>> {
        self.parse_lines(text.lines())
    }
}

/// Load a change log from disk
pub fn load_change_log<P: AsRef<Path>>(path: P) -> Result<Vec<ConnectivityChangeEvent>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
    let events = EventLogParser::new().parse_str(&text)?;
    info!("parsed {} peer changes from {}", events.len(), path.display());
    Ok(events)
}

/// A missing change log means the topology never changes
pub fn load_optional_change_log<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ConnectivityChangeEvent>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no change log at {}, topology is static", path.display());
        return Ok(Vec::new());
    }
    load_change_log(path)
}
