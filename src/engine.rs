//! The facade that composes a strategy, an integrator and an oversampler
//! into one simulation step (spec §4.5).

use crate::collide;
use crate::compute::{AccelerationKind, AccelerationStrategy};
use crate::diagnostics::Diagnostics;
use crate::integrate::{Integrator, IntegratorKind};
use crate::oversample::{Oversampler, OversamplerKind};
use crate::vec3::is_finite;
use crate::world::World;

/// Owns the three pluggable components plus the diagnostics map they write
/// to. Does not own the `World`; that is supplied fresh each call (spec
/// §6, "World contract").
pub struct Engine {
    acceleration: AccelerationKind,
    integrator: IntegratorKind,
    oversampler: OversamplerKind,
    diagnostics: Diagnostics,
}

impl Engine {
    pub fn new(acceleration: AccelerationKind, integrator: IntegratorKind, oversampler: OversamplerKind) -> Self {
        Self {
            acceleration,
            integrator,
            oversampler,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Advances `world` by `dt`: oversample into substeps, integrate each
    /// one with the configured acceleration strategy, resolve collisions,
    /// reflect off closed boundaries, then drop absorbed bodies (spec
    /// §4.5).
    pub fn simulate(&mut self, world: &mut World, dt: f64) {
        if world.is_empty() || dt <= 0.0 {
            return;
        }

        self.diagnostics.clear();
        log::trace!("simulate: dt={dt} bodies={}", world.len());

        let before = world.clone();
        let initial_active = world.active_bodies();
        let substeps = self.oversampler.substeps(world, &initial_active, dt, &self.diagnostics);
        log::debug!("oversampler produced {} substep(s)", substeps.len());
        self.diagnostics.set(
            "Oversampling",
            if substeps.len() == 1 { "Off".to_string() } else { format!("{}x", substeps.len()) },
        );

        for h in substeps {
            let active = world.active_bodies();
            if active.is_empty() {
                continue;
            }

            let snapshot = world.clone();
            self.integrator
                .step(&snapshot, &active, world.bodies_mut(), h, &self.acceleration, &self.diagnostics);

            collide::resolve(world, &active);

            if world.closed_boundaries {
                reflect_off_viewport(world, &active);
            }

            if !all_finite(world) {
                log::warn!("non-finite state detected mid-step, aborting and restoring prior world");
                *world = before;
                return;
            }
        }

        world.remove_absorbed();
    }
}

/// Every active body's position and velocity must remain finite (spec §4.6:
/// "if detected must abort the step and leave the prior state untouched").
fn all_finite(world: &World) -> bool {
    world.bodies().iter().all(|b| is_finite(b.position) && is_finite(b.velocity))
}

/// Reflects each active body off the axis-aligned viewport: clamps the
/// position to the radius-inset box (`top_left + ρ ..= bottom_right - ρ`,
/// spec §3, §8 property 6) and negates the velocity component that carried
/// it past the wall.
fn reflect_off_viewport(world: &mut World, active: &[usize]) {
    let viewport = world.viewport;
    for &i in active {
        let body = &mut world.bodies_mut()[i];
        let radius = body.radius;

        macro_rules! reflect_axis {
            ($axis:ident) => {
                let lo = viewport.top_left.$axis + radius;
                let hi = viewport.bottom_right.$axis - radius;
                if body.position.$axis < lo {
                    body.position.$axis = lo;
                    body.velocity.$axis = -body.velocity.$axis;
                } else if body.position.$axis > hi {
                    body.position.$axis = hi;
                    body.velocity.$axis = -body.velocity.$axis;
                }
            };
        }

        reflect_axis!(x);
        reflect_axis!(y);
        reflect_axis!(z);
    }
}
