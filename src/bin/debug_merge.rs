// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Merge two operation logs from disk and print what happened.
//!
//! Usage: `debug_merge <target.json> <incoming.json> [timestamp|timestampAndIndex]`
//!
//! Each file holds a JSON array of operations of one scope. Set `RUST_LOG`
//! (e.g. `RUST_LOG=lineage=trace`) to watch the collector and the merge work.

use std::fs;
use std::process::ExitCode;

use lineage::Operation;
use lineage::history::TieBreak;
use lineage::history::collect;
use lineage::history::merge;
use lineage::history::split;
use tracing_subscriber::EnvFilter;

fn load(path: &str) -> Result<Vec<Operation>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let operations: Vec<Operation> = serde_json::from_str(&text).map_err(|e| format!("cannot parse {path}: {e}"))?;
    return Ok(operations);
}

fn print_log(title: &str, operations: &[Operation]) {
    println!("--- {} ({} operations) ---", title, operations.len());
    for op in operations {
        let error = op.error.as_deref().map(|e| format!("  error: {e}")).unwrap_or_default();
        println!("  {:>4} skip {:<3} {:<24} {} {}{}", op.index, op.skip, op.id, op.timestamp, op.kind, error);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let [target_path, incoming_path, rest @ ..] = args else {
        return Err("usage: debug_merge <target.json> <incoming.json> [timestamp|timestampAndIndex]".into());
    };
    let tie_break = match rest.first().map(String::as_str) {
        None => TieBreak::default(),
        Some(name) => serde_json::from_value(serde_json::Value::String(name.to_string()))
            .map_err(|_| format!("unknown tie-break {name}"))?,
    };

    let target = load(target_path)?;
    let incoming = load(incoming_path)?;
    print_log("target", &target);
    print_log("incoming", &incoming);

    let parts = split(&collect(&target), &collect(&incoming));
    println!("\n=== Divergence ===");
    println!("common prefix: {} operations", parts.common.len());
    println!("target tail:   {:?}", parts.target.iter().map(|op| op.id.as_str()).collect::<Vec<_>>());
    println!("incoming tail: {:?}", parts.merge.iter().map(|op| op.id.as_str()).collect::<Vec<_>>());

    let merged = merge(&target, &incoming, tie_break)?;
    println!("\n=== Merged with {:?} ===", tie_break);
    print_log("merged", &merged);
    println!("\n{}", serde_json::to_string_pretty(&merged)?);
    return Ok(());
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    return match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("debug_merge: {error}");
            ExitCode::FAILURE
        }
    };
}
