//! Property-based checks of the quantified invariants in spec.md §8,
//! run across randomized small worlds.

use proptest::prelude::*;

use gravito::compute::G;
use gravito::{
    AccelerationKind, AccelerationStrategy, BarnesHut, BhConfig, Body, Diagnostics, Direct, Engine,
    IntegratorKind, Leapfrog, OversamplerKind, SemiImplicitEuler, Static, Vec3, Viewport, World,
};

fn bounded_world(n: usize, seed: u64, closed: bool, half: f64) -> World {
    fastrand::seed(seed);
    let bodies: Vec<Body> = (0..n)
        .map(|_| {
            let p = Vec3::new(
                fastrand::f64() * half - half / 2.0,
                fastrand::f64() * half - half / 2.0,
                fastrand::f64() * half - half / 2.0,
            );
            let v = Vec3::new(fastrand::f64() - 0.5, fastrand::f64() - 0.5, fastrand::f64() - 0.5);
            Body::new(p, v, 1.0 + fastrand::f64() * 9.0, 0.05).unwrap()
        })
        .collect();
    World::new(bodies, closed, false, Viewport::new(Vec3::new(-half, -half, -half), Vec3::new(half, half, half)))
}

proptest! {
    /// Invariant 1: every body not absorbed at the start still exists,
    /// under its original id, after a step (bodies here never collide
    /// since they start far apart relative to their radii).
    #[test]
    fn id_stability_holds_across_a_step(seed in 0u64..1000, n in 2usize..8) {
        let mut w = bounded_world(n, seed, false, 1e6);
        let ids: Vec<_> = w.bodies().iter().map(|b| b.id).collect();

        let mut engine = Engine::new(
            AccelerationKind::Direct(Direct),
            IntegratorKind::SemiImplicit(SemiImplicitEuler),
            OversamplerKind::Static(Static(1)),
        );
        engine.simulate(&mut w, 0.001);

        for id in ids {
            prop_assert!(w.find(id).is_some());
        }
    }

    /// Invariant 2: the absorbed count never decreases across a step.
    #[test]
    fn absorption_count_is_monotonic(seed in 0u64..1000, n in 2usize..10) {
        let mut w = bounded_world(n, seed, false, 5.0);
        let mut engine = Engine::new(
            AccelerationKind::Direct(Direct),
            IntegratorKind::SemiImplicit(SemiImplicitEuler),
            OversamplerKind::Static(Static(1)),
        );

        let mut before = w.len();
        for _ in 0..20 {
            engine.simulate(&mut w, 0.01);
            let after = w.len();
            prop_assert!(after <= before);
            before = after;
        }
    }

    /// Invariant 6: with closed boundaries, every active body stays
    /// within `[top_left + radius, bottom_right - radius]` after a step.
    #[test]
    fn closed_boundaries_contain_every_body(seed in 0u64..1000, n in 1usize..6) {
        let mut w = bounded_world(n, seed, true, 10.0);
        let mut engine = Engine::new(
            AccelerationKind::Direct(Direct),
            IntegratorKind::SemiImplicit(SemiImplicitEuler),
            OversamplerKind::Static(Static(1)),
        );

        let viewport = w.viewport;
        for _ in 0..10 {
            engine.simulate(&mut w, 0.05);
        }

        for b in w.bodies() {
            let r = b.radius;
            prop_assert!(b.position.x >= viewport.top_left.x + r - 1e-6);
            prop_assert!(b.position.y >= viewport.top_left.y + r - 1e-6);
            prop_assert!(b.position.z >= viewport.top_left.z + r - 1e-6);
            prop_assert!(b.position.x <= viewport.bottom_right.x - r + 1e-6);
            prop_assert!(b.position.y <= viewport.bottom_right.y - r + 1e-6);
            prop_assert!(b.position.z <= viewport.bottom_right.z - r + 1e-6);
        }
    }

    /// Invariant 7: Barnes-Hut agrees with Direct to within 1% relative
    /// per component for small random clusters (theta stays <= 0.2 up to
    /// n=50 per adaptive_theta's own small-N overrides).
    #[test]
    fn barnes_hut_agrees_with_direct_for_small_n(seed in 0u64..1000, n in 2usize..16) {
        let w_direct = bounded_world(n, seed, false, 20.0);
        let mut w_direct_mut = w_direct.clone();
        let mut w_bh = w_direct;
        let active: Vec<usize> = (0..w_bh.len()).collect();
        let diag = Diagnostics::new();

        Direct.compute(&w_direct_mut.clone(), &active, w_direct_mut.bodies_mut(), &diag);
        BarnesHut::new(BhConfig::default()).compute(&w_bh.clone(), &active, w_bh.bodies_mut(), &diag);

        for (a, b) in w_bh.bodies().iter().zip(w_direct_mut.bodies().iter()) {
            let rel_err = (a.acceleration - b.acceleration).mag() / b.acceleration.mag().max(1e-30);
            prop_assert!(rel_err < 0.01, "rel_err={rel_err}");
        }
    }
}

/// Invariant 3: momentum is conserved across many steps of a purely
/// two-body, open-boundary, non-colliding system (Leapfrog).
#[test]
fn momentum_conservation_over_many_steps() {
    let m = 1.0;
    let r_sep = 2.0;
    let v = (G * (2.0 * m) / (2.0 * r_sep)).sqrt();
    let a = Body::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, v, 0.0), m, 0.01).unwrap();
    let b = Body::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -v, 0.0), m, 0.01).unwrap();
    let mut w = World::new(vec![a, b], false, false, Viewport::new(Vec3::new(-1e6, -1e6, -1e6), Vec3::new(1e6, 1e6, 1e6)));

    let mut engine = Engine::new(
        AccelerationKind::Direct(Direct),
        IntegratorKind::Leapfrog(Leapfrog),
        OversamplerKind::Static(Static(1)),
    );

    let initial_momentum = w.bodies().iter().fold(Vec3::zero(), |acc, b| acc + b.velocity * b.mass);

    for _ in 0..5_000 {
        engine.simulate(&mut w, 0.01);
    }

    let final_momentum = w.bodies().iter().fold(Vec3::zero(), |acc, b| acc + b.velocity * b.mass);
    let scale = (m * v).max(1e-30);
    assert!((final_momentum - initial_momentum).mag() / scale < 1e-5);
}

/// Invariant 5: measured Kepler period matches the analytic prediction
/// for a two-body circular orbit under Direct + Leapfrog.
#[test]
fn kepler_period_matches_analytic_prediction() {
    let m1 = 1.0;
    let m2 = 1e-6; // negligible, so body 1 orbits a near-fixed body 0
    let r = 1.0;
    let mu = G * (m1 + m2);
    let v = (mu / r).sqrt();

    let a = Body::new(Vec3::zero(), Vec3::zero(), m1, 0.001).unwrap();
    let b = Body::new(Vec3::new(r, 0.0, 0.0), Vec3::new(0.0, v, 0.0), m2, 0.001).unwrap();
    let mut w = World::new(vec![a, b], false, false, Viewport::new(Vec3::new(-1e6, -1e6, -1e6), Vec3::new(1e6, 1e6, 1e6)));

    let mut engine = Engine::new(
        AccelerationKind::Direct(Direct),
        IntegratorKind::Leapfrog(Leapfrog),
        OversamplerKind::Static(Static(1)),
    );

    let analytic_period = 2.0 * std::f64::consts::PI * (r.powi(3) / mu).sqrt();
    let dt = analytic_period / 20_000.0;

    let mut prev_y = w.bodies()[1].position.y;
    let mut crossing_step = None;
    let max_steps = 25_000;
    for step in 1..=max_steps {
        engine.simulate(&mut w, dt);
        let y = w.bodies()[1].position.y;
        if prev_y < 0.0 && y >= 0.0 {
            crossing_step = Some(step);
            break;
        }
        prev_y = y;
    }

    let measured_period = crossing_step.expect("orbit should complete within max_steps") as f64 * dt;
    let rel_err = (measured_period - analytic_period).abs() / analytic_period;
    assert!(rel_err < 5e-3, "rel_err={rel_err} measured={measured_period} analytic={analytic_period}");
}

/// Invariant 8: within a single step's collision pass, no pair is ever
/// resolved twice — checked indirectly via momentum conservation on a
/// tight cluster where every body overlaps every other.
#[test]
fn collision_pass_does_not_double_resolve_pairs() {
    let bodies: Vec<Body> = (0..6)
        .map(|k| {
            let x = k as f64 * 0.05;
            Body::new(Vec3::new(x, 0.0, 0.0), Vec3::zero(), 1.0, 1.0).unwrap()
        })
        .collect();
    let mut w = World::new(bodies, false, false, Viewport::new(Vec3::new(-1e3, -1e3, -1e3), Vec3::new(1e3, 1e3, 1e3)));
    let active: Vec<usize> = (0..w.len()).collect();

    let total_mass_before: f64 = w.bodies().iter().map(|b| b.mass).sum();
    gravito::collide::resolve(&mut w, &active);
    w.remove_absorbed();
    let total_mass_after: f64 = w.bodies().iter().map(|b| b.mass).sum();

    // Every merge conserves mass exactly; if any pair were resolved twice
    // a body's mass would be double-counted and the totals would diverge.
    assert!((total_mass_before - total_mass_after).abs() < 1e-9);
}
