use std::fs;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cachelib::config::CacheConfig;
use cachelib::simulator::Simulator;
use cachelib::util::get_test_cases;

/// Replays every sample case, plus a synthetic strided trace which is large enough to measure
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Samples");

    get_test_cases()
        .unwrap()
        .iter()
        .for_each(|case| {
            let config = CacheConfig::from_path(&case.config).unwrap();
            // For the purposes of this we aren't interested in IO effects
            let trace = fs::read(&case.trace).unwrap();
            let name = case.output.file_stem().unwrap().to_string_lossy().into_owned();
            group.bench_with_input(BenchmarkId::new("Sample", name), &(config, trace), |bench, (conf, trace)| {
                bench.iter(|| {
                    Simulator::with_seed(conf, 0).unwrap().simulate(trace.as_slice()).unwrap();
                });
            });
        });

    let strided: String = (0..100_000u64)
        .map(|i| format!("{} {:#x}\n", if i % 3 == 0 { 'W' } else { 'R' }, (i * 72) % (1 << 20)))
        .collect();
    for file in ["direct_wb", "twoway_lru_wb", "full_fifo_wt_nwa"] {
        let path = format!("{}/inputs/{file}.cfg", cachelib::util::SAMPLES_PATH);
        let mut config = CacheConfig::from_path(path).unwrap();
        // Scale the tiny sample caches up to realistic sizes
        config.cache_size *= 2048;
        group.bench_with_input(BenchmarkId::new("Strided", file), &config, |bench, conf| {
            bench.iter(|| {
                Simulator::with_seed(conf, 0).unwrap().simulate(strided.as_bytes()).unwrap();
            });
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
