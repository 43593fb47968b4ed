//! Benchmark for tiling record encoding
//!
//! Runs once per kernel launch on the host, so it sits on the launch path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ubtile_core::{PlatformBudget, Tiler, WorkDescriptor};
use ubtile_runtime::{CoreSpanTilingData, ElementwiseTilingData, LaunchPackage, TilingData};

fn benchmark_records(c: &mut Criterion) {
    let plan = Tiler::new(PlatformBudget::default())
        .plan(&WorkDescriptor::new(10_000_003, 4, 4).unwrap())
        .unwrap();

    c.bench_function("elementwise_from_plan", |b| {
        b.iter(|| {
            let record = ElementwiseTilingData::from_plan(black_box(&plan)).unwrap();
            black_box(record);
        })
    });

    let record = ElementwiseTilingData::from_plan(&plan).unwrap();
    c.bench_function("elementwise_encode", |b| {
        b.iter(|| {
            let bytes = black_box(&record).to_bytes();
            black_box(bytes);
        })
    });

    let bytes = record.to_bytes();
    c.bench_function("elementwise_decode", |b| {
        b.iter(|| {
            let decoded = ElementwiseTilingData::from_bytes(black_box(&bytes)).unwrap();
            black_box(decoded);
        })
    });
}

fn benchmark_launch_package(c: &mut Criterion) {
    let plan = Tiler::new(PlatformBudget::default())
        .plan(&WorkDescriptor::new(1 << 24, 2, 10).unwrap())
        .unwrap();

    c.bench_function("launch_package_core_span", |b| {
        b.iter(|| {
            let package = LaunchPackage::new::<CoreSpanTilingData>(black_box(&plan)).unwrap();
            black_box(package);
        })
    });
}

criterion_group!(benches, benchmark_records, benchmark_launch_package);
criterion_main!(benches);
