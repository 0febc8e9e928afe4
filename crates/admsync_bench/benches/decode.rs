//! Export decoding benchmarks.

use admsync_bench::{attribute_export, attribute_kind};
use admsync_decode::decode_str;
use admsync_model::decode_object_str;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark raw path decoding.
fn bench_path_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_decode");

    for properties in [0usize, 16, 256, 4096].iter() {
        let document = attribute_export("Weight", *properties);
        group.throughput(Throughput::Bytes(document.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(properties),
            &document,
            |b, document| {
                b.iter(|| {
                    let events = decode_str(black_box(document)).unwrap();
                    black_box(events);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark decoding into a canonical object.
fn bench_object_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_decode");
    let descriptor = attribute_kind();

    for properties in [16usize, 256, 4096].iter() {
        let document = attribute_export("Weight", *properties);
        group.throughput(Throughput::Elements(*properties as u64));
        group.bench_with_input(
            BenchmarkId::new("properties", properties),
            &document,
            |b, document| {
                b.iter(|| {
                    let object = decode_object_str(&descriptor, black_box(document)).unwrap();
                    black_box(object);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_path_decode, bench_object_decode);
criterion_main!(benches);
