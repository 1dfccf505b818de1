//! Leapfrog / kick-drift-kick (spec §4.2): symplectic, recommended default.

use rayon::prelude::*;

use super::Integrator;
use crate::body::Body;
use crate::compute::AccelerationStrategy;
use crate::diagnostics::Diagnostics;
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, Default)]
pub struct Leapfrog;

impl Integrator for Leapfrog {
    fn step(
        &mut self,
        world: &World,
        active: &[usize],
        bodies: &mut [Body],
        dt: f64,
        strategy: &dyn AccelerationStrategy,
        diagnostics: &Diagnostics,
    ) {
        strategy.compute(world, active, bodies, diagnostics);

        // Compute-into-a-`Vec`-then-write-back, the same shape as
        // `compute::direct` (spec §5: index-disjoint writes).
        let half_kicked: Vec<(Vec3, Vec3)> = active
            .par_iter()
            .map(|&i| {
                let body = &bodies[i];
                let velocity = body.velocity + body.acceleration * (0.5 * dt);
                let position = body.position + velocity * dt;
                (velocity, position)
            })
            .collect();

        for (&i, &(velocity, position)) in active.iter().zip(half_kicked.iter()) {
            bodies[i].velocity = velocity;
            bodies[i].position = position;
        }

        let mut moved = world.clone();
        for &i in active {
            *moved.bodies_mut().get_mut(i).expect("active index in range") = bodies[i];
        }
        strategy.compute(&moved, active, bodies, diagnostics);

        let velocities: Vec<Vec3> = active.par_iter().map(|&i| bodies[i].velocity + bodies[i].acceleration * (0.5 * dt)).collect();

        for (&i, &velocity) in active.iter().zip(velocities.iter()) {
            bodies[i].velocity = velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Direct;
    use crate::vec3::Vec3;
    use crate::world::Viewport;

    fn two_body_world() -> World {
        let sun = Body::new(Vec3::zero(), Vec3::zero(), 1.989e30, 6.957e8).unwrap();
        let earth = Body::new(
            Vec3::new(1.496e11, 0.0, 0.0),
            Vec3::new(0.0, 2.978e4, 0.0),
            5.972e24,
            6.371e6,
        )
        .unwrap();
        World::new(
            vec![sun, earth],
            false,
            false,
            Viewport::new(Vec3::new(-1e13, -1e13, -1e13), Vec3::new(1e13, 1e13, 1e13)),
        )
    }

    #[test]
    fn holds_roughly_circular_orbit_over_a_handful_of_steps() {
        let mut w = two_body_world();
        let active = vec![0usize, 1usize];
        let diag = Diagnostics::new();
        let r0 = (w.bodies()[1].position - w.bodies()[0].position).mag();

        let dt = 3600.0;
        for _ in 0..24 {
            Leapfrog.step(&w.clone(), &active, w.bodies_mut(), dt, &Direct, &diag);
        }

        let r1 = (w.bodies()[1].position - w.bodies()[0].position).mag();
        assert!((r1 - r0).abs() / r0 < 0.01, "r0={r0} r1={r1}");
    }

    #[test]
    fn single_body_with_no_force_moves_in_a_straight_line() {
        let body = Body::new(Vec3::zero(), Vec3::new(2.0, 0.0, 0.0), 1.0, 0.1).unwrap();
        let mut w = World::new(
            vec![body],
            false,
            false,
            Viewport::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0)),
        );
        let active = vec![0usize];
        let diag = Diagnostics::new();
        Leapfrog.step(&w.clone(), &active, w.bodies_mut(), 1.0, &Direct, &diag);
        assert!((w.bodies()[0].position.x - 2.0).abs() < 1e-9);
    }
}
