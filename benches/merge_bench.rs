// Benchmark suite for the history helpers and the engine
//
// - garbage_collect over logs with scattered skips
// - merge of two replicas diverging after a shared prefix
// - full replay of a document
// - undo with and without cached states

use chrono::DateTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use lineage::document::{undo, PerScope};
use lineage::error::ActionError;
use lineage::history::{garbage_collect, merge, TieBreak};
use lineage::reducer::Reducer;
use lineage::{Action, Document, Engine, Operation, ReducerOptions, Scope};

struct Tally;

impl Reducer for Tally {
    type State = i64;

    fn reduce(&self, state: &mut i64, action: &Action) -> Result<(), ActionError> {
        *state += action.input.as_i64().unwrap_or(0);
        return Ok(());
    }
}

fn push(term: i64, seconds: i64) -> Action {
    let timestamp = DateTime::from_timestamp(seconds, 0).expect("timestamp in range");
    return Action::new("PUSH", term.into(), Scope::Global).with_timestamp(timestamp);
}

fn build(engine: &Engine<Tally>, size: usize, options: &ReducerOptions) -> Document<i64> {
    let mut doc = Document::new("tally", PerScope::new(0, 0)).with_id("bench");
    for i in 0..size {
        doc = engine.apply_with(&doc, push(1, i as i64), options).unwrap();
    }
    return doc;
}

// Random log where roughly one in eight entries supersedes a few before it.
fn skipping_log(size: usize, seed: u64) -> Vec<Operation> {
    let mut rng = StdRng::seed_from_u64(seed);
    return (0..size as u64)
        .map(|index| {
            let skip = if index > 4 && rng.gen_ratio(1, 8) { rng.gen_range(1..4) } else { 0 };
            Operation::from_action(&push(1, index as i64), index, skip)
        })
        .collect();
}

// =============================================================================
// History helpers
// =============================================================================

fn bench_garbage_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("garbage_collect");

    for size in [100, 1_000, 10_000] {
        let log = skipping_log(size, 7);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &log, |b, log| {
            b.iter(|| black_box(garbage_collect(log).len()));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let engine = Engine::new(Tally);

    for (prefix, tail) in [(100, 10), (1_000, 100), (1_000, 1_000)] {
        let base = build(&engine, prefix, &ReducerOptions::default());
        let mut a = base.clone();
        let mut b = base.clone();
        for i in 0..tail {
            a = engine.apply(&a, push(1, (prefix + 2 * i) as i64)).unwrap();
            b = engine.apply(&b, push(2, (prefix + 2 * i + 1) as i64)).unwrap();
        }

        let id = format!("{prefix}+{tail}");
        group.throughput(Throughput::Elements((prefix + 2 * tail) as u64));
        group.bench_with_input(BenchmarkId::new("log", &id), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| {
                let merged = merge(a.operations(Scope::Global), b.operations(Scope::Global), TieBreak::default()).unwrap();
                black_box(merged.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("document", &id), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| black_box(engine.merge(a, b).unwrap().state.global));
        });
    }

    group.finish();
}

// =============================================================================
// Engine
// =============================================================================

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let engine = Engine::new(Tally);

    for size in [100, 1_000] {
        let doc = build(&engine, size, &ReducerOptions::default());
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| {
                let replayed = engine.replay(doc, &doc.operations, &ReducerOptions::default()).unwrap();
                black_box(replayed.state.global)
            });
        });
    }

    group.finish();
}

fn bench_undo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo");
    let engine = Engine::new(Tally);

    for (name, options) in [("full", ReducerOptions::default()), ("cached", ReducerOptions::cached())] {
        let doc = build(&engine, 1_000, &options);
        group.bench_with_input(BenchmarkId::new(name, 1_000), &doc, |b, doc| {
            b.iter(|| {
                let undone = engine.apply_with(doc, undo(Scope::Global, 1), &options).unwrap();
                black_box(undone.state.global)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_garbage_collect,
    bench_merge,
    bench_replay,
    bench_undo,
);

criterion_main!(benches);
