//! Semi-implicit (symplectic) Euler (spec §4.2): one acceleration compute
//! per step; velocity before position.

use rayon::prelude::*;

use super::Integrator;
use crate::body::Body;
use crate::compute::AccelerationStrategy;
use crate::diagnostics::Diagnostics;
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
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

        // Each worker reads one body and produces its own updated
        // velocity/position; the write-back below is sequential, the same
        // compute-into-a-`Vec`-then-write-back shape as `compute::direct`
        // (spec §5: index-disjoint writes, no shared mutable state while
        // parallel).
        let updated: Vec<(Vec3, Vec3)> = active
            .par_iter()
            .map(|&i| {
                let body = &bodies[i];
                let velocity = body.velocity + body.acceleration * dt;
                let position = body.position + velocity * dt;
                (velocity, position)
            })
            .collect();

        for (&i, &(velocity, position)) in active.iter().zip(updated.iter()) {
            bodies[i].velocity = velocity;
            bodies[i].position = position;
        }
    }
}
