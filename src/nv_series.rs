//! Tick-indexed series tables
//!
//! The simulator exports per-node series (`accuracy.csv`,
//! `model_weight_diff.csv`) as CSV: the first column is the tick index, the
//! header names one column per node.
//!
//! ```text
//! ,node0,node1,node2
//! 0,0.10,0.12,0.09
//! 100,0.35,0.41,0.38
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexSet;
use log::info;
use regex::Regex;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_interface::Tick;

/// Per-node accuracy in [0, 1]; the table that drives sampling and colour
pub type AccuracyTable = SeriesTable;

#[derive(Clone, Debug, Default)]
pub struct SeriesTable {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    ticks: Vec<Tick>,
    rows: Vec<Vec<Option<f64>>>,
    row_index: HashMap<Tick, usize>,
}

impl SeriesTable {
    /// Rows may come in any tick order; they are stored ascending.
    /// `None` marks an empty cell.
    pub fn from_rows(columns: Vec<String>, mut rows: Vec<(Tick, Vec<Option<f64>>)>) -> Result<Self> {
        let mut column_index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if column_index.insert(name.clone(), i).is_some() {
                return Err(ReplayError::configuration(format!(
                    "duplicate column `{}`",
                    name
                )));
            }
        }

        rows.sort_by_key(|(tick, _)| *tick);

        let mut table = SeriesTable {
            columns,
            column_index,
            ticks: Vec::with_capacity(rows.len()),
            rows: Vec::with_capacity(rows.len()),
            row_index: HashMap::with_capacity(rows.len()),
        };

        for (tick, values) in rows {
            if values.len() != table.columns.len() {
                return Err(ReplayError::configuration(format!(
                    "row for tick {} has {} values, expected {}",
                    tick,
                    values.len(),
                    table.columns.len()
                )));
            }
            if table.row_index.insert(tick, table.rows.len()).is_some() {
                return Err(ReplayError::configuration(format!("duplicate tick {}", tick)));
            }
            table.ticks.push(tick);
            // NaN is how pandas spells an empty cell
            table
                .rows
                .push(values.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect());
        }

        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        let mut seen: HashSet<Tick> = HashSet::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line_number = row_idx + 2;
            let line = record.iter().collect::<Vec<_>>().join(",");

            let tick: Tick = record
                .get(0)
                .unwrap_or_default()
                .parse()
                .map_err(|e| ReplayError::parse(line_number, &line, format!("bad tick: {}", e)))?;
            if !seen.insert(tick) {
                return Err(ReplayError::parse(
                    line_number,
                    &line,
                    format!("duplicate tick {}", tick),
                ));
            }

            let mut values = Vec::with_capacity(columns.len());
            for (col_idx, cell) in record.iter().skip(1).enumerate() {
                if cell.is_empty() {
                    values.push(None);
                    continue;
                }
                let value: f64 = cell.parse().map_err(|e| {
                    ReplayError::parse(
                        line_number,
                        &line,
                        format!("bad value for `{}`: {}", columns[col_idx], e),
                    )
                })?;
                values.push(Some(value));
            }
            rows.push((tick, values));
        }

        Self::from_rows(columns, rows)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ReplayError::io(path, e))?;
        let table = Self::from_reader(file)?;
        info!(
            "loaded {}: {} ticks x {} columns",
            path.display(),
            table.row_count(),
            table.columns.len()
        );
        Ok(table)
    }

    /// Load an accuracy table and check that every value lies in [0, 1]
    pub fn load_accuracy<P: AsRef<Path>>(path: P) -> Result<AccuracyTable> {
        let table = Self::from_csv_path(path)?;
        table.validate_unit_range()?;
        Ok(table)
    }

    pub fn validate_unit_range(&self) -> Result<()> {
        for (tick, row) in self.ticks.iter().zip(&self.rows) {
            for (column, value) in self.columns.iter().zip(row) {
                if let Some(v) = value {
                    if !(0.0..=1.0).contains(v) {
                        return Err(ReplayError::configuration(format!(
                            "value {} for `{}` at tick {} is outside [0, 1]",
                            v, column, tick
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        csv_writer.write_record(&header)?;

        for (tick, row) in self.ticks.iter().zip(&self.rows) {
            let mut record = vec![tick.to_string()];
            record.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            csv_writer.write_record(&record)?;
        }
        csv_writer
            .flush()
            .map_err(|e| ReplayError::io("<csv output>", e))?;
        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Ascending
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.ticks.len()
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.ticks.last().copied()
    }

    pub fn get(&self, tick: Tick, column: &str) -> Option<f64> {
        let row = *self.row_index.get(&tick)?;
        let col = *self.column_index.get(column)?;
        self.rows[row][col]
    }

    /// Like `get`, but absence is a `Lookup` error. There is no default value.
    pub fn value(&self, tick: Tick, column: &str) -> Result<f64> {
        self.get(tick, column).ok_or_else(|| ReplayError::Lookup {
            tick,
            node: column.to_string(),
        })
    }

    /// `(tick, value)` pairs of one column, empty cells skipped
    pub fn column_series(&self, column: &str) -> Option<Vec<(Tick, f64)>> {
        let col = *self.column_index.get(column)?;
        Some(
            self.ticks
                .iter()
                .zip(&self.rows)
                .filter_map(|(tick, row)| row[col].map(|v| (*tick, v)))
                .collect(),
        )
    }

    /// Element-wise mean over several runs of the same experiment
    ///
    /// Ticks and columns are the union over all runs. A cell missing from a
    /// run counts as zero; a cell missing from every run stays empty.
    pub fn average(tables: &[SeriesTable]) -> Result<SeriesTable> {
        if tables.is_empty() {
            return Err(ReplayError::configuration("no runs to average"));
        }

        let columns: IndexSet<&String> = tables.iter().flat_map(|t| t.columns.iter()).collect();
        let ticks: BTreeSet<Tick> = tables.iter().flat_map(|t| t.ticks.iter().copied()).collect();
        let runs = tables.len() as f64;

        let rows: Vec<(Tick, Vec<Option<f64>>)> = ticks
            .into_iter()
            .map(|tick| {
                let values: Vec<Option<f64>> = columns
                    .iter()
                    .map(|column| {
                        let present: Vec<f64> =
                            tables.iter().filter_map(|t| t.get(tick, column)).collect();
                        if present.is_empty() {
                            None
                        } else {
                            Some(present.iter().sum::<f64>() / runs)
                        }
                    })
                    .collect();
                (tick, values)
            })
            .collect();

        Self::from_rows(columns.into_iter().cloned().collect(), rows)
    }
}

// ============================================================================
// Console Output Extraction
// ============================================================================

/// Recover accuracy rows from raw simulator console output
///
/// Each line mentioning `accuracy` contributes its first decimal number;
/// values are grouped into rows of `nodes_per_row` in output order. A
/// trailing partial row is returned as is.
pub fn extract_console_accuracy<I, S>(lines: I, nodes_per_row: usize) -> Result<Vec<Vec<f64>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if nodes_per_row == 0 {
        return Err(ReplayError::configuration("nodes per row must be at least 1"));
    }
    let number = Regex::new(r"\d*\.\d+").expect("decimal pattern is valid");

    let mut rows = Vec::new();
    let mut current = Vec::with_capacity(nodes_per_row);
    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if !line.contains("accuracy") {
            continue;
        }
        let found = number
            .find(line)
            .ok_or_else(|| ReplayError::parse(index + 1, line, "no decimal accuracy value"))?;
        let value: f64 = found
            .as_str()
            .parse()
            .map_err(|e| ReplayError::parse(index + 1, line, format!("bad accuracy: {}", e)))?;

        current.push(value);
        if current.len() == nodes_per_row {
            rows.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(nodes_per_row),
            ));
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }
    Ok(rows)
}
