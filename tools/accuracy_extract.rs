// Accuracy Extract - rebuild accuracy rows from raw simulator console output
//
// Usage:
//   cargo run --bin accuracy_extract test_data/console_output.txt
//   cargo run --bin accuracy_extract console_output.txt --nodes 10 --csv accuracy.csv

use std::env;
use std::fs::{self, File};
use std::process;

use log::info;

use nv_rust::nv_series::extract_console_accuracy;
use nv_rust::SeriesTable;

fn main() {
    let _ = simple_logger::init_with_env();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <console_output.txt> [--nodes N] [--csv OUT.csv]",
            args.first().map_or("accuracy_extract", String::as_str)
        );
        process::exit(1);
    }

    let mut nodes_per_row = 4;
    let mut csv_path: Option<String> = None;
    let mut i = 2;
    while i < args.len() {
        match (args[i].as_str(), args.get(i + 1)) {
            ("--nodes", Some(value)) => {
                nodes_per_row = value.parse().unwrap_or_else(|e| {
                    eprintln!("Invalid node count {}: {}", value, e);
                    process::exit(1);
                });
            }
            ("--csv", Some(value)) => csv_path = Some(value.clone()),
            (other, _) => {
                eprintln!("Unknown or incomplete option: {}", other);
                process::exit(1);
            }
        }
        i += 2;
    }

    let text = fs::read_to_string(&args[1]).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", args[1], e);
        process::exit(1);
    });

    let rows = extract_console_accuracy(text.lines(), nodes_per_row).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    for row in &rows {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(" "));
    }

    if let Some(path) = csv_path {
        // one row per report round, partial last round left with empty cells
        let columns: Vec<String> = (0..nodes_per_row).map(|n| format!("node{}", n)).collect();
        let table_rows = rows
            .iter()
            .enumerate()
            .map(|(round, row)| {
                let mut values: Vec<Option<f64>> = row.iter().copied().map(Some).collect();
                values.resize(nodes_per_row, None);
                (round as u64, values)
            })
            .collect();

        let result = SeriesTable::from_rows(columns, table_rows).and_then(|table| {
            let file = File::create(&path).map_err(|e| nv_rust::ReplayError::io(&path, e))?;
            table.write_csv(file)
        });
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        info!("wrote {} rows to {}", rows.len(), path);
    }
}
