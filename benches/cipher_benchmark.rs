use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tenant_envelope::{cipher, PlaintextKey};

fn benchmark_wrap_unwrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher");

    let key = PlaintextKey::generate().unwrap();
    let sizes = [("100B", 100), ("1KB", 1024), ("10KB", 10 * 1024), ("1MB", 1024 * 1024)];

    for (name, size) in sizes {
        let payload = vec![0u8; size];
        let wrapped = cipher::wrap_bytes(&key, &payload).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("wrap", name), &payload, |b, payload| {
            b.iter(|| cipher::wrap_bytes(black_box(&key), black_box(payload)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("unwrap", name), &wrapped, |b, wrapped| {
            b.iter(|| cipher::unwrap_bytes(black_box(&key), black_box(wrapped)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_wrap_unwrap);
criterion_main!(benches);
