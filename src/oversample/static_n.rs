//! Fixed substep count, independent of body state (spec §4.3). `Static(1)`
//! is the no-op: the engine sees exactly the caller's `dt`.

use super::Oversampler;
use crate::diagnostics::Diagnostics;
use crate::world::World;

#[derive(Clone, Copy, Debug)]
pub struct Static(pub usize);

impl Default for Static {
    fn default() -> Self {
        Static(1)
    }
}

impl Oversampler for Static {
    fn substeps(&self, _world: &World, _active: &[usize], dt: f64, diagnostics: &Diagnostics) -> Vec<f64> {
        let n = self.0.max(1);
        diagnostics.set("Substeps", n);
        vec![dt / n as f64; n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Viewport;
    use crate::vec3::Vec3;

    #[test]
    fn one_is_a_no_op() {
        let w = World::new(vec![], false, false, Viewport::new(Vec3::zero(), Vec3::zero()));
        let diag = Diagnostics::new();
        let out = Static(1).substeps(&w, &[], 1.0, &diag);
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn splits_evenly() {
        let w = World::new(vec![], false, false, Viewport::new(Vec3::zero(), Vec3::zero()));
        let diag = Diagnostics::new();
        let out = Static(4).substeps(&w, &[], 1.0, &diag);
        assert_eq!(out.len(), 4);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
