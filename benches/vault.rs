use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

use contextvault::vault::{ContextVault, Scope};

fn gen_identities(n: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| format!("user-{:016x}", rng.gen::<u64>())).collect()
}

fn bench_vault(c: &mut Criterion) {
    let ns = [1_000usize, 100_000usize];
    let mut group = c.benchmark_group("context_vault");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);

    for &n in &ns {
        let ids = gen_identities(n, 0xBEEF_CAFE);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("write", n.to_string()), &n, |b, _| {
            b.iter(|| {
                let v = ContextVault::new(100);
                for id in &ids { let _ = v.write(id, "patient-1", "bench", None); }
                criterion::black_box(v.count());
            });
        });

        // Populate once for read/query benchmarks
        let base = ContextVault::new(100);
        for id in &ids { let _ = base.write(id, "patient-1", "bench", None); }

        group.bench_with_input(BenchmarkId::new("read_rand", n.to_string()), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(0xFACE_FEED);
            let idxs: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            b.iter(|| {
                let mut hits = 0usize;
                for &i in &idxs {
                    if base.read(&ids[i]).is_some() { hits += 1; }
                }
                criterion::black_box(hits);
            });
        });

        group.bench_with_input(BenchmarkId::new("query_all", n.to_string()), &n, |b, _| {
            b.iter(|| criterion::black_box(base.query_events(None, Scope::All).map(|e| e.len())));
        });

        // Sweep with a window nothing falls outside of, so the store stays populated.
        group.bench_with_input(BenchmarkId::new("sweep_noop", n.to_string()), &n, |b, _| {
            b.iter(|| criterion::black_box(base.sweep_idle(Duration::from_secs(3600))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_vault);
criterion_main!(benches);
