use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use gravito::{
    AccelerationKind, BarnesHut, BhConfig, Body, Diagnostics, Direct, Engine, Fmm, FmmConfig,
    IntegratorKind, OversamplerKind, SemiImplicitEuler, Static, Vec3, Viewport, World,
};

fn uniform_disc(n: usize, seed: u64) -> Vec<Body> {
    fastrand::seed(seed);
    (0..n)
        .map(|_| {
            let p = Vec3::new(
                fastrand::f64() * 2.0e11 - 1e11,
                fastrand::f64() * 2.0e11 - 1e11,
                fastrand::f64() * 2.0e11 - 1e11,
            );
            Body::new(p, Vec3::zero(), 1e24, 1e6).unwrap()
        })
        .collect()
}

fn world(n: usize) -> World {
    World::new(
        uniform_disc(n, 7),
        false,
        false,
        Viewport::new(Vec3::new(-1e13, -1e13, -1e13), Vec3::new(1e13, 1e13, 1e13)),
    )
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("gravito_acceleration_strategies");
    group.sample_size(10);

    for &n in &[200usize, 2_000] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("direct_{n}"), |b| {
            b.iter_batched(
                || world(n),
                |mut w| {
                    let mut engine = Engine::new(
                        AccelerationKind::Direct(Direct),
                        IntegratorKind::SemiImplicit(SemiImplicitEuler),
                        OversamplerKind::Static(Static(1)),
                    );
                    engine.simulate(&mut w, 1.0);
                    w
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("barnes_hut_{n}"), |b| {
            b.iter_batched(
                || world(n),
                |mut w| {
                    let mut engine = Engine::new(
                        AccelerationKind::AdaptiveBarnesHut(BarnesHut::new(BhConfig::default())),
                        IntegratorKind::SemiImplicit(SemiImplicitEuler),
                        OversamplerKind::Static(Static(1)),
                    );
                    engine.simulate(&mut w, 1.0);
                    w
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("fmm_{n}"), |b| {
            b.iter_batched(
                || world(n),
                |mut w| {
                    let mut engine = Engine::new(
                        AccelerationKind::AdaptiveFastMultipole(Fmm::new(FmmConfig::default())),
                        IntegratorKind::SemiImplicit(SemiImplicitEuler),
                        OversamplerKind::Static(Static(1)),
                    );
                    engine.simulate(&mut w, 1.0);
                    w
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_barnes_hut_compute_only(c: &mut Criterion) {
    use gravito::AccelerationStrategy;

    let mut group = c.benchmark_group("gravito_barnes_hut_compute_only");
    let mut w = world(10_000);
    let active: Vec<usize> = (0..w.len()).collect();
    let diag = Diagnostics::new();
    let strategy = BarnesHut::new(BhConfig::default());

    group.throughput(Throughput::Elements(w.len() as u64));
    group.bench_function("compute", |b| {
        b.iter(|| strategy.compute(&w.clone(), &active, w.bodies_mut(), &diag));
    });
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_barnes_hut_compute_only);
criterion_main!(benches);
