//! Calibration and evaluation benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nx_slot::{EvCalibrator, ReelBuffer, presets};
use rand::SeedableRng;
use rand::rngs::StdRng;

const TRIALS: u64 = 20_000;

fn bench_calibrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate");
    group.throughput(Throughput::Elements(TRIALS));

    for config in presets::all() {
        for parallel in [false, true] {
            let calibrator = EvCalibrator {
                trials: TRIALS,
                seed: 7,
                parallel,
            };
            let id = format!("{}/{}", config.name, if parallel { "par" } else { "seq" });
            group.bench_with_input(BenchmarkId::from_parameter(id), &config, |b, config| {
                b.iter(|| black_box(calibrator.calculate(config)))
            });
        }
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for config in presets::all() {
        let mut rng = StdRng::seed_from_u64(1);
        let buffer = ReelBuffer::generate(config.grid, &config.weights, &mut rng)
            .expect("preset grid is valid");

        group.bench_with_input(BenchmarkId::from_parameter(&config.name), &buffer, |b, buffer| {
            b.iter(|| black_box(config.paytable.evaluate(black_box(buffer), config.stake)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calibrate, bench_evaluate);
criterion_main!(benches);
