//! Classical 4th-order Runge-Kutta (spec §4.2): not symplectic, but the
//! most accurate per-step for smooth, slowly-changing forces.

use crate::body::Body;
use crate::compute::AccelerationStrategy;
use crate::diagnostics::Diagnostics;
use crate::vec3::Vec3;
use crate::world::World;

use super::Integrator;

#[derive(Clone, Copy, Debug, Default)]
pub struct Rk4;

/// Computes accelerations with every active body's position temporarily
/// moved to `positions`, then restores the body array exactly as found.
fn accelerations_at(
    world: &World,
    active: &[usize],
    bodies: &mut [Body],
    positions: &[Vec3],
    strategy: &dyn AccelerationStrategy,
    diagnostics: &Diagnostics,
) -> Vec<Vec3> {
    let saved: Vec<Vec3> = active.iter().map(|&i| bodies[i].position).collect();

    for (ai, &i) in active.iter().enumerate() {
        bodies[i].position = positions[ai];
    }

    let mut scratch = world.clone();
    scratch.bodies_mut().copy_from_slice(bodies);
    strategy.compute(&scratch, active, bodies, diagnostics);

    let out: Vec<Vec3> = active.iter().map(|&i| bodies[i].acceleration).collect();

    for (ai, &i) in active.iter().enumerate() {
        bodies[i].position = saved[ai];
    }

    out
}

impl Integrator for Rk4 {
    fn step(
        &mut self,
        world: &World,
        active: &[usize],
        bodies: &mut [Body],
        dt: f64,
        strategy: &dyn AccelerationStrategy,
        diagnostics: &Diagnostics,
    ) {
        if active.is_empty() {
            return;
        }

        let x0: Vec<Vec3> = active.iter().map(|&i| bodies[i].position).collect();
        let v0: Vec<Vec3> = active.iter().map(|&i| bodies[i].velocity).collect();

        let k1v = v0.clone();
        let k1a = accelerations_at(world, active, bodies, &x0, strategy, diagnostics);

        let x2: Vec<Vec3> = x0.iter().zip(&k1v).map(|(&x, &v)| x + v * (0.5 * dt)).collect();
        let k2v: Vec<Vec3> = v0.iter().zip(&k1a).map(|(&v, &a)| v + a * (0.5 * dt)).collect();
        let k2a = accelerations_at(world, active, bodies, &x2, strategy, diagnostics);

        let x3: Vec<Vec3> = x0.iter().zip(&k2v).map(|(&x, &v)| x + v * (0.5 * dt)).collect();
        let k3v: Vec<Vec3> = v0.iter().zip(&k2a).map(|(&v, &a)| v + a * (0.5 * dt)).collect();
        let k3a = accelerations_at(world, active, bodies, &x3, strategy, diagnostics);

        let x4: Vec<Vec3> = x0.iter().zip(&k3v).map(|(&x, &v)| x + v * dt).collect();
        let k4v: Vec<Vec3> = v0.iter().zip(&k3a).map(|(&v, &a)| v + a * dt).collect();
        let k4a = accelerations_at(world, active, bodies, &x4, strategy, diagnostics);

        for (ai, &i) in active.iter().enumerate() {
            let dv = (k1a[ai] + k2a[ai] * 2.0 + k3a[ai] * 2.0 + k4a[ai]) * (dt / 6.0);
            let dx = (k1v[ai] + k2v[ai] * 2.0 + k3v[ai] * 2.0 + k4v[ai]) * (dt / 6.0);
            bodies[i].velocity = v0[ai] + dv;
            bodies[i].position = x0[ai] + dx;
            bodies[i].acceleration = k4a[ai];
        }
    }
}
