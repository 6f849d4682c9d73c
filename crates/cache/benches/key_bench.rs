//! Identity and cache hit path benchmarks
//!
//! Run with: cargo bench -p zeorun-cache --bench key_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use zeorun_cache::{ComputationCache, ComputationKey};
use zeorun_core::{ExecutionResult, ToolArguments};

fn bench_key_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_build");
    let args: ToolArguments = ["-ha", "-res", "result.res", "structure.cif"].into();

    for size in [1_024usize, 64 * 1_024, 1_024 * 1_024] {
        let content = vec![b'C'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| ComputationKey::build(black_box(content), &args, "pore_diameter"));
        });
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = Arc::new(ComputationCache::new(
        NonZeroUsize::new(1_024).unwrap(),
        64 * 1_024 * 1_024,
    ));
    let key = ComputationKey::build(b"data_bench", &ToolArguments::new(), "structure_info");

    rt.block_on(async {
        cache
            .get_or_compute(&key, || async {
                let mut outputs = BTreeMap::new();
                outputs.insert("result.strinfo".to_string(), b"1 channels".to_vec());
                Ok(ExecutionResult::completed(
                    Some(0),
                    String::new(),
                    outputs,
                    None,
                    Duration::ZERO,
                ))
            })
            .await
            .unwrap();
    });

    c.bench_function("cache_hit", |b| {
        b.to_async(&rt).iter(|| {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            async move {
                cache
                    .get_or_compute(&key, || async { unreachable!() })
                    .await
                    .unwrap()
            }
        });
    });
}

criterion_group!(benches, bench_key_build, bench_cache_hit);
criterion_main!(benches);
