//! Acceleration strategies (spec §4.1): polymorphic over
//! {Direct, Barnes-Hut, Particle-Mesh, FMM}.

mod barnes_hut;
mod direct;
mod fmm;
mod particle_mesh;

pub use barnes_hut::{adaptive_theta, BarnesHut, BhConfig};
pub use direct::Direct;
pub use fmm::{Fmm, FmmConfig};
pub use particle_mesh::{ParticleMesh, PmConfig};

use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::world::World;

/// Newton's gravitational constant, readable by all strategies, never
/// written (spec §9).
pub const G: f64 = 6.674e-11;

/// Sets `body.acceleration` for each active body from the mutual
/// gravitational field and publishes identifying diagnostics (spec §4.1).
pub trait AccelerationStrategy: Send + Sync {
    fn compute(&self, world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics);
}

/// The recognized engine kinds exposed upward (spec §6, "Selector
/// enumeration"). Held as a boxed trait object by `Engine`.
pub enum AccelerationKind {
    Direct(Direct),
    AdaptiveBarnesHut(BarnesHut),
    AdaptiveParticleMesh(ParticleMesh),
    AdaptiveFastMultipole(Fmm),
}

impl AccelerationStrategy for AccelerationKind {
    fn compute(&self, world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics) {
        match self {
            AccelerationKind::Direct(s) => s.compute(world, active, bodies, diagnostics),
            AccelerationKind::AdaptiveBarnesHut(s) => s.compute(world, active, bodies, diagnostics),
            AccelerationKind::AdaptiveParticleMesh(s) => s.compute(world, active, bodies, diagnostics),
            AccelerationKind::AdaptiveFastMultipole(s) => s.compute(world, active, bodies, diagnostics),
        }
    }
}
