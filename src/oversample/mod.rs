//! Oversampling (spec §4.3): splits one engine step's `dt` into one or more
//! substeps so the integrator sees a fixed or CFL-bounded interval.

mod adaptive;
mod static_n;

pub use adaptive::Adaptive;
pub use static_n::Static;

use crate::diagnostics::Diagnostics;
use crate::world::World;

/// Returns substep sizes summing to `dt`, in the order they should be
/// applied. Publishes `Substeps` to `diagnostics`; `Oversampling` is set
/// once by `Engine::simulate` after the call (spec §4.5).
pub trait Oversampler: Send + Sync {
    fn substeps(&self, world: &World, active: &[usize], dt: f64, diagnostics: &Diagnostics) -> Vec<f64>;
}

/// The recognized oversampler kinds exposed upward (spec §6).
pub enum OversamplerKind {
    Static(Static),
    Adaptive(Adaptive),
}

impl Oversampler for OversamplerKind {
    fn substeps(&self, world: &World, active: &[usize], dt: f64, diagnostics: &Diagnostics) -> Vec<f64> {
        match self {
            OversamplerKind::Static(o) => o.substeps(world, active, dt, diagnostics),
            OversamplerKind::Adaptive(o) => o.substeps(world, active, dt, diagnostics),
        }
    }
}
