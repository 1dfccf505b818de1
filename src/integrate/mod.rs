//! Integrators (spec §4.2): polymorphic over
//! {SemiImplicitEuler, Leapfrog, RK4, WarmStartVerlet}.

mod leapfrog;
mod rk4;
mod semi_implicit;
mod warm_start_verlet;

pub use leapfrog::Leapfrog;
pub use rk4::Rk4;
pub use semi_implicit::SemiImplicitEuler;
pub use warm_start_verlet::WarmStartVerlet;

use crate::body::Body;
use crate::compute::AccelerationStrategy;
use crate::diagnostics::Diagnostics;
use crate::world::World;

/// Advances position and velocity of every active body by `dt`, calling
/// `strategy` one or more times to obtain accelerations. Skips absorbed
/// bodies; parallelism is over the body index (spec §4.2).
pub trait Integrator: Send + Sync {
    fn step(
        &mut self,
        world: &World,
        active: &[usize],
        bodies: &mut [Body],
        dt: f64,
        strategy: &dyn AccelerationStrategy,
        diagnostics: &Diagnostics,
    );
}

/// The recognized integrator kinds exposed upward (spec §6).
pub enum IntegratorKind {
    SemiImplicit(SemiImplicitEuler),
    Leapfrog(Leapfrog),
    Rk4(Rk4),
    WarmStartVerlet(WarmStartVerlet),
}

impl Integrator for IntegratorKind {
    fn step(
        &mut self,
        world: &World,
        active: &[usize],
        bodies: &mut [Body],
        dt: f64,
        strategy: &dyn AccelerationStrategy,
        diagnostics: &Diagnostics,
    ) {
        match self {
            IntegratorKind::SemiImplicit(i) => i.step(world, active, bodies, dt, strategy, diagnostics),
            IntegratorKind::Leapfrog(i) => i.step(world, active, bodies, dt, strategy, diagnostics),
            IntegratorKind::Rk4(i) => i.step(world, active, bodies, dt, strategy, diagnostics),
            IntegratorKind::WarmStartVerlet(i) => i.step(world, active, bodies, dt, strategy, diagnostics),
        }
    }
}
