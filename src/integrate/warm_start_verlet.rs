//! Velocity-Verlet with a warm-started acceleration cache (spec §4.2): after
//! the first step, only one force evaluation per step instead of two.

use std::collections::HashMap;

use crate::body::{Body, BodyId};
use crate::compute::AccelerationStrategy;
use crate::diagnostics::Diagnostics;
use crate::vec3::Vec3;
use crate::world::World;

use super::Integrator;

/// Caches `a(t)` per body id so a later step can reuse it instead of
/// recomputing forces at the pre-drift position. Bodies not yet in the
/// cache (new arrivals) fall back to a fresh compute this step.
#[derive(Clone, Debug, Default)]
pub struct WarmStartVerlet {
    cache: HashMap<BodyId, Vec3>,
}

impl WarmStartVerlet {
    pub fn new() -> Self {
        Self { cache: HashMap::new() }
    }
}

impl Integrator for WarmStartVerlet {
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

        let unprimed = active.iter().any(|&i| !self.cache.contains_key(&bodies[i].id));
        if unprimed {
            strategy.compute(world, active, bodies, diagnostics);
            for &i in active {
                self.cache.insert(bodies[i].id, bodies[i].acceleration);
            }
        }

        let a_old: Vec<Vec3> = active.iter().map(|&i| self.cache[&bodies[i].id]).collect();

        for (ai, &i) in active.iter().enumerate() {
            bodies[i].position += bodies[i].velocity * dt + a_old[ai] * (0.5 * dt * dt);
        }

        let mut scratch = world.clone();
        scratch.bodies_mut().copy_from_slice(bodies);
        strategy.compute(&scratch, active, bodies, diagnostics);

        for (ai, &i) in active.iter().enumerate() {
            let a_new = bodies[i].acceleration;
            bodies[i].velocity += (a_old[ai] + a_new) * (0.5 * dt);
            self.cache.insert(bodies[i].id, a_new);
        }
    }
}
