use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use openmonte::core::PricingEngine;
use openmonte::engines::lsm::LongstaffSchwartzEngine;
use openmonte::engines::monte_carlo::{MonteCarloPricingEngine, SimulationConfig};
use openmonte::instruments::VanillaOption;
use openmonte::market::Market;

fn benchmark_market() -> Market {
    Market::builder()
        .spot(100.0)
        .rate(0.05)
        .dividend_yield(0.02)
        .vol(0.20)
        .build()
        .expect("benchmark market should be valid")
}

fn bench_mc_european_paths(c: &mut Criterion) {
    let market = benchmark_market();
    let option = VanillaOption::european_call(100.0, 1.0);
    let mut group = c.benchmark_group("mc_european_paths");

    for paths in [10_000, 50_000, 100_000] {
        let engine =
            MonteCarloPricingEngine::new(SimulationConfig::new(paths, 252).with_seed(42));
        group.bench_with_input(BenchmarkId::from_parameter(paths), &paths, |b, _| {
            b.iter(|| {
                let px = engine
                    .price(black_box(&option), black_box(&market))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_mc_antithetic(c: &mut Criterion) {
    let market = benchmark_market();
    let option = VanillaOption::european_call(100.0, 1.0);
    let mut group = c.benchmark_group("mc_antithetic");

    for antithetic in [false, true] {
        let engine = MonteCarloPricingEngine::new(
            SimulationConfig::new(50_000, 252)
                .with_seed(42)
                .with_antithetic(antithetic),
        );
        group.bench_with_input(
            BenchmarkId::from_parameter(antithetic),
            &antithetic,
            |b, _| {
                b.iter(|| {
                    let px = engine
                        .price(black_box(&option), black_box(&market))
                        .expect("pricing should succeed")
                        .price;
                    black_box(px)
                })
            },
        );
    }

    group.finish();
}

fn bench_lsm_american_put(c: &mut Criterion) {
    let market = Market::builder()
        .spot(36.0)
        .rate(0.06)
        .vol(0.2)
        .build()
        .expect("benchmark market should be valid");
    let option = VanillaOption::american_put(40.0, 1.0);
    let mut group = c.benchmark_group("lsm_american_put");
    group.sample_size(10);

    for paths in [10_000, 50_000] {
        let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(paths, 50).with_seed(42));
        group.bench_with_input(BenchmarkId::from_parameter(paths), &paths, |b, _| {
            b.iter(|| {
                let px = engine
                    .price(black_box(&option), black_box(&market))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mc_european_paths,
    bench_mc_antithetic,
    bench_lsm_american_put
);
criterion_main!(benches);
