//! CFL-like adaptive oversampler (spec §4.3): substep length is bounded by
//! how far the fastest body could travel relative to its own radius.

use super::Oversampler;
use crate::diagnostics::Diagnostics;
use crate::world::World;

const SAFETY: f64 = 0.65;
const MIN_DT: f64 = 1e-6;
const MAX_SUBSTEPS: usize = 64;

#[derive(Clone, Copy, Debug, Default)]
pub struct Adaptive;

impl Oversampler for Adaptive {
    fn substeps(&self, world: &World, active: &[usize], dt: f64, diagnostics: &Diagnostics) -> Vec<f64> {
        if active.is_empty() {
            diagnostics.set("Substeps", 1usize);
            return vec![dt];
        }

        let bodies = world.bodies();
        let mut remaining = dt;
        let mut out = Vec::new();

        while remaining > 1e-15 && out.len() < MAX_SUBSTEPS {
            let mut limit = f64::INFINITY;
            for &i in active {
                let b = &bodies[i];
                let speed = b.velocity.mag();
                if speed > 0.0 && b.radius > 0.0 {
                    limit = limit.min(2.0 * b.radius / speed);
                }
            }

            let h = if limit.is_finite() {
                (SAFETY * limit).max(MIN_DT).min(remaining)
            } else {
                remaining
            };

            out.push(h);
            remaining -= h;
        }

        // Cap reached before the interval was exhausted: fold the leftover
        // into the final substep rather than silently dropping simulated
        // time (spec §4.3).
        if remaining > 1e-15 {
            if let Some(last) = out.last_mut() {
                *last += remaining;
            } else {
                out.push(remaining);
            }
        }

        diagnostics.set("Substeps", out.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::vec3::Vec3;
    use crate::world::Viewport;

    fn world_with(bodies: Vec<Body>) -> World {
        World::new(bodies, false, false, Viewport::new(Vec3::new(-1e6, -1e6, -1e6), Vec3::new(1e6, 1e6, 1e6)))
    }

    #[test]
    fn no_velocity_or_radius_signal_yields_a_single_whole_step() {
        let w = world_with(vec![Body::new(Vec3::zero(), Vec3::zero(), 1.0, 0.0).unwrap()]);
        let diag = Diagnostics::new();
        let out = Adaptive.substeps(&w, &[0], 2.0, &diag);
        assert_eq!(out, vec![2.0]);
    }

    #[test]
    fn fast_small_body_forces_many_substeps() {
        let fast = Body::new(Vec3::zero(), Vec3::new(1.0e6, 0.0, 0.0), 1.0, 1.0).unwrap();
        let w = world_with(vec![fast]);
        let diag = Diagnostics::new();
        let out = Adaptive.substeps(&w, &[0], 1.0, &diag);
        assert!(out.len() > 1);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(out.len() <= MAX_SUBSTEPS);
    }
}
