//! Benchmarks for linedd-reducer
//!
//! Drives the engine with an in-process oracle so only batching and file
//! materialization are measured.

use std::path::Path;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use linedd_reducer::{Mode, OracleFn, ReduceError, Reducer, ReducerConfig, Verdict};

fn needle_oracle(path: &Path) -> linedd_reducer::Result<Verdict> {
    let text = std::fs::read_to_string(path).map_err(|e| ReduceError::io(path, e))?;
    Ok(Verdict(i32::from(text.contains("needle\n"))))
}

fn reduce_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut group = c.benchmark_group("reduce");
    for size in [64usize, 256] {
        let input = dir.path().join(format!("input-{size}.txt"));
        let mut lines: Vec<String> = (0..size).map(|i| format!("filler {i}\n")).collect();
        lines.insert(size / 2, "needle\n".to_string());
        std::fs::write(&input, lines.concat()).unwrap();
        let output = dir.path().join(format!("output-{size}.txt"));

        for mode in [Mode::Hierarchical, Mode::Linear] {
            let reducer = Reducer::new(
                OracleFn::new(needle_oracle),
                ReducerConfig::new().with_mode(mode).with_expected(Some(1)),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), size),
                &size,
                |b, _| {
                    b.to_async(&runtime)
                        .iter(|| async { reducer.reduce(&input, &output).await.unwrap() })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, reduce_benchmark);
criterion_main!(benches);
