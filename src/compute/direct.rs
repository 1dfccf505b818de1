//! O(N^2) softened pairwise acceleration (spec §4.1.1), the reference
//! kernel every other strategy is checked against.

use rayon::prelude::*;

use super::{AccelerationStrategy, G};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl AccelerationStrategy for Direct {
    fn compute(&self, _world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics) {
        // Snapshot so every worker reads a stable, index-disjoint view while
        // writing only its own body's acceleration (spec §5).
        let snapshot: Vec<(Vec3, f64, f64)> = active
            .iter()
            .map(|&i| (bodies[i].position, bodies[i].mass, bodies[i].radius))
            .collect();

        let accelerations: Vec<Vec3> = (0..active.len())
            .into_par_iter()
            .map(|ai| {
                let (pi, _, ri) = snapshot[ai];
                let mut acc = Vec3::zero();
                for (aj, &(pj, mj, rj)) in snapshot.iter().enumerate() {
                    if aj == ai {
                        continue;
                    }
                    let d = pi - pj;
                    let actual_d2 = d.mag_sq();
                    if actual_d2 == 0.0 {
                        // Exactly coincident bodies: zero relative acceleration (spec §4.6).
                        continue;
                    }
                    let softened = (ri + rj) * (ri + rj);
                    let d2 = actual_d2.max(softened);
                    let dist = d2.sqrt();
                    acc -= d * (G * mj / (d2 * dist));
                }
                acc
            })
            .collect();

        for (ai, &i) in active.iter().enumerate() {
            bodies[i].acceleration = accelerations[ai];
        }

        diagnostics.set("Strategy", "Direct");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Viewport;

    fn world(bodies: Vec<Body>) -> World {
        World::new(bodies, false, false, Viewport::new(Vec3::new(-1e6, -1e6, -1e6), Vec3::new(1e6, 1e6, 1e6)))
    }

    #[test]
    fn two_bodies_attract_each_other() {
        let b1 = Body::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::zero(), 1e10, 0.0).unwrap();
        let b2 = Body::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zero(), 1e10, 0.0).unwrap();
        let mut w = world(vec![b1, b2]);
        let active: Vec<usize> = (0..w.len()).collect();
        let diag = Diagnostics::new();
        Direct.compute(&w, &active, w.bodies_mut(), &diag);

        assert!(w.bodies()[0].acceleration.x > 0.0, "body 0 pulled toward body 1");
        assert!(w.bodies()[1].acceleration.x < 0.0, "body 1 pulled toward body 0");
        assert_eq!(
            diag.get("Strategy"),
            Some(crate::diagnostics::DiagValue::Str(std::borrow::Cow::Borrowed("Direct")))
        );
    }

    #[test]
    fn coincident_bodies_produce_zero_acceleration_not_nan() {
        let b1 = Body::new(Vec3::zero(), Vec3::zero(), 1.0, 0.0).unwrap();
        let b2 = Body::new(Vec3::zero(), Vec3::zero(), 1.0, 0.0).unwrap();
        let mut w = world(vec![b1, b2]);
        let active: Vec<usize> = (0..w.len()).collect();
        let diag = Diagnostics::new();
        Direct.compute(&w, &active, w.bodies_mut(), &diag);
        for b in w.bodies() {
            assert!(crate::vec3::is_finite(b.acceleration));
        }
    }
}
