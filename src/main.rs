// Replay Runner - replay a finished simulation run frame by frame
//
// Usage:
//   cargo run --bin replay_runner
//   cargo run --bin replay_runner session.yaml
//   cargo run --bin replay_runner session.yaml --from 1000 --stop 5000 --stride 10 --dot-dir frames/

use std::env;
use std::path::PathBuf;
use std::process;

use log::LevelFilter;
use simple_logger::SimpleLogger;

use nv_rust::nv_sinks::{DotFrameSink, LogFrameSink, MultiFrameSink};
use nv_rust::{ReplaySession, SessionConfig, Tick};

struct Args {
    session_path: Option<PathBuf>,
    from_tick: Option<Tick>,
    stop_tick: Option<Tick>,
    stride: Option<usize>,
    dot_dir: Option<PathBuf>,
    verbose: bool,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} [session.yaml] [--from TICK] [--stop TICK] [--stride N] [--dot-dir DIR] [--verbose]",
        program
    );
    eprintln!("\nWithout a session file, simulator_config.json, accuracy.csv and");
    eprintln!("peer_change_record.txt are read from the current directory.");
    process::exit(1);
}

fn parse_number<T: std::str::FromStr>(program: &str, flag: &str, value: Option<String>) -> T {
    match value.as_deref().map(|s| s.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("Invalid or missing value for {}", flag);
            usage(program)
        }
    }
}

fn parse_args() -> Args {
    let mut raw = env::args();
    let program = raw.next().unwrap_or_else(|| "replay_runner".to_string());

    let mut args = Args {
        session_path: None,
        from_tick: None,
        stop_tick: None,
        stride: None,
        dot_dir: None,
        verbose: false,
    };

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--from" => args.from_tick = Some(parse_number(&program, "--from", raw.next())),
            "--stop" => args.stop_tick = Some(parse_number(&program, "--stop", raw.next())),
            "--stride" => args.stride = Some(parse_number(&program, "--stride", raw.next())),
            "--dot-dir" => match raw.next() {
                Some(dir) => args.dot_dir = Some(PathBuf::from(dir)),
                None => usage(&program),
            },
            "--verbose" | "-v" => args.verbose = true,
            "--help" | "-h" => usage(&program),
            other if other.starts_with("--") => {
                eprintln!("Unknown option: {}", other);
                usage(&program)
            }
            other if args.session_path.is_none() => args.session_path = Some(PathBuf::from(other)),
            _ => usage(&program),
        }
    }

    args
}

fn main() {
    let args = parse_args();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
        .expect("logger is initialised once");

    let mut config = match &args.session_path {
        Some(path) => SessionConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Failed to load {}: {}", path.display(), e);
            process::exit(1);
        }),
        None => SessionConfig::default(),
    };

    if let Some(v) = args.from_tick {
        config.sampling.from_tick = v;
    }
    if let Some(v) = args.stop_tick {
        config.sampling.stop_tick = v;
    }
    if let Some(v) = args.stride {
        config.sampling.stride = v;
    }
    if args.dot_dir.is_some() {
        config.output.dot_dir = args.dot_dir;
    }

    println!("Configuration:");
    println!("  Simulator config: {}", config.simulator_config_path.display());
    println!("  Accuracy: {}", config.accuracy_path.display());
    match &config.peer_change_path {
        Some(path) => println!("  Peer changes: {}", path.display()),
        None => println!("  Peer changes: none"),
    }
    println!(
        "  Ticks: {} ..= {} every {}",
        config.sampling.from_tick, config.sampling.stop_tick, config.sampling.stride
    );

    let mut sink = MultiFrameSink::new();
    sink.add_sink(Box::new(LogFrameSink::new(config.output.log_frames)));
    if let Some(dir) = &config.output.dot_dir {
        match DotFrameSink::new(dir) {
            Ok(dot) => sink.add_sink(Box::new(dot)),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    let result = ReplaySession::new(&config).and_then(|session| session.run(&mut sink));
    match result {
        Ok(summary) => {
            summary.print_summary();
            println!("✓ Replay complete!\n");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
