use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stock_watcher::fetcher::QuoteSource;
use stock_watcher::{logging, poll, store::PriceStore, testkit::ScriptedSource};
use tokio::runtime::Runtime;

fn symbols(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("SYM{i:04}")).collect()
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_store");

    for count in [16usize, 256, 4_096] {
        let names = symbols(count);
        let store = PriceStore::with_symbols(names.iter().cloned());

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("update", count), &names, |b, names| {
            let mut price = 1.0;
            b.iter(|| {
                price += 0.01;
                for name in names {
                    store.update(name, price).expect("registered symbol");
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("snapshot", count), &store, |b, store| {
            b.iter(|| store.snapshot());
        });
    }

    group.finish();
}

fn bench_cycle(c: &mut Criterion) {
    logging::set_silent(true);
    let rt = Runtime::new().expect("failed to create Tokio runtime");

    let mut group = c.benchmark_group("poll_cycle");
    for count in [16usize, 256] {
        let names = symbols(count);
        let source = names
            .iter()
            .enumerate()
            .fold(ScriptedSource::new(Duration::from_secs(1)), |source, (i, name)| {
                source.with_price(name, 10.0 + i as f64)
            });
        let source: Arc<dyn QuoteSource> = Arc::new(source);
        let store = Arc::new(PriceStore::with_symbols(names.iter().cloned()));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(BenchmarkId::new("fan_out_fan_in", count), |b| {
            let mut cycle = 0u64;
            b.iter(|| {
                cycle += 1;
                rt.block_on(poll::run_cycle(cycle, Arc::clone(&source), Arc::clone(&store)))
                    .expect("cycle")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_store, bench_cycle);
criterion_main!(benches);
