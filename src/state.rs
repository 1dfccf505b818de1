//! Persisted, engine-visible state (spec §6): everything needed to resume
//! a run — world contents plus which strategy/integrator/oversampler were
//! configured — gated behind the `encode` feature.

#[cfg(feature = "encode")]
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};
use crate::compute::{AccelerationKind, BhConfig, Direct, Fmm, FmmConfig, ParticleMesh, PmConfig};
use crate::error::DomainError;
use crate::integrate::{IntegratorKind, Leapfrog, Rk4, SemiImplicitEuler, WarmStartVerlet};
use crate::oversample::{Adaptive, OversamplerKind, Static};
use crate::vec3::Vec3;
use crate::world::{Viewport, World};

/// Which acceleration strategy was in use, without its runtime state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Serialize, Deserialize))]
pub enum AccelerationTag {
    Direct,
    AdaptiveBarnesHut(BhConfig),
    AdaptiveParticleMesh(PmConfig),
    AdaptiveFastMultipole(FmmConfig),
}

impl From<&AccelerationKind> for AccelerationTag {
    fn from(kind: &AccelerationKind) -> Self {
        match kind {
            AccelerationKind::Direct(_) => AccelerationTag::Direct,
            AccelerationKind::AdaptiveBarnesHut(s) => AccelerationTag::AdaptiveBarnesHut(s.config),
            AccelerationKind::AdaptiveParticleMesh(s) => AccelerationTag::AdaptiveParticleMesh(s.config),
            AccelerationKind::AdaptiveFastMultipole(s) => AccelerationTag::AdaptiveFastMultipole(s.config),
        }
    }
}

impl From<AccelerationTag> for AccelerationKind {
    fn from(tag: AccelerationTag) -> Self {
        match tag {
            AccelerationTag::Direct => AccelerationKind::Direct(Direct),
            AccelerationTag::AdaptiveBarnesHut(config) => AccelerationKind::AdaptiveBarnesHut(crate::compute::BarnesHut::new(config)),
            AccelerationTag::AdaptiveParticleMesh(config) => AccelerationKind::AdaptiveParticleMesh(ParticleMesh::new(config)),
            AccelerationTag::AdaptiveFastMultipole(config) => AccelerationKind::AdaptiveFastMultipole(Fmm::new(config)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Serialize, Deserialize))]
pub enum IntegratorTag {
    SemiImplicit,
    Leapfrog,
    Rk4,
    WarmStartVerlet,
}

impl From<&IntegratorKind> for IntegratorTag {
    fn from(kind: &IntegratorKind) -> Self {
        match kind {
            IntegratorKind::SemiImplicit(_) => IntegratorTag::SemiImplicit,
            IntegratorKind::Leapfrog(_) => IntegratorTag::Leapfrog,
            IntegratorKind::Rk4(_) => IntegratorTag::Rk4,
            IntegratorKind::WarmStartVerlet(_) => IntegratorTag::WarmStartVerlet,
        }
    }
}

impl From<IntegratorTag> for IntegratorKind {
    fn from(tag: IntegratorTag) -> Self {
        match tag {
            IntegratorTag::SemiImplicit => IntegratorKind::SemiImplicit(SemiImplicitEuler),
            IntegratorTag::Leapfrog => IntegratorKind::Leapfrog(Leapfrog),
            IntegratorTag::Rk4 => IntegratorKind::Rk4(Rk4),
            // A freshly restored warm-start integrator always starts unprimed:
            // the acceleration cache is runtime state, not persisted state.
            IntegratorTag::WarmStartVerlet => IntegratorKind::WarmStartVerlet(WarmStartVerlet::new()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Serialize, Deserialize))]
pub enum OversamplerTag {
    Static(usize),
    Adaptive,
}

impl From<&OversamplerKind> for OversamplerTag {
    fn from(kind: &OversamplerKind) -> Self {
        match kind {
            OversamplerKind::Static(s) => OversamplerTag::Static(s.0),
            OversamplerKind::Adaptive(_) => OversamplerTag::Adaptive,
        }
    }
}

impl From<OversamplerTag> for OversamplerKind {
    fn from(tag: OversamplerTag) -> Self {
        match tag {
            OversamplerTag::Static(n) => OversamplerKind::Static(Static(n)),
            OversamplerTag::Adaptive => OversamplerKind::Adaptive(Adaptive),
        }
    }
}

/// A body stripped to the engine-visible fields listed in spec §6. Vectors
/// are stored as plain arrays so `State` does not require `ultraviolet`'s
/// `serde` feature to be reachable from outside this crate's own build.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Serialize, Deserialize))]
pub struct PersistedBody {
    pub id: BodyId,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    pub radius: f64,
}

impl From<&Body> for PersistedBody {
    fn from(b: &Body) -> Self {
        Self {
            id: b.id,
            position: [b.position.x, b.position.y, b.position.z],
            velocity: [b.velocity.x, b.velocity.y, b.velocity.z],
            mass: b.mass,
            radius: b.radius,
        }
    }
}

/// The full engine-visible record (spec §6, "Persisted state"): enough to
/// rebuild both the `World` and the composed `Engine` components, so that
/// load -> step -> save -> load -> step is idempotent with respect to
/// engine-visible fields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(Serialize, Deserialize))]
pub struct State {
    pub acceleration: AccelerationTag,
    pub integrator: IntegratorTag,
    pub oversampler: OversamplerTag,
    pub closed_boundaries: bool,
    pub elastic_collisions: bool,
    pub viewport_top_left: [f64; 3],
    pub viewport_bottom_right: [f64; 3],
    pub bodies: Vec<PersistedBody>,
}

impl State {
    pub fn capture(
        world: &World,
        acceleration: &AccelerationKind,
        integrator: &IntegratorKind,
        oversampler: &OversamplerKind,
    ) -> Self {
        Self {
            acceleration: acceleration.into(),
            integrator: integrator.into(),
            oversampler: oversampler.into(),
            closed_boundaries: world.closed_boundaries,
            elastic_collisions: world.elastic_collisions,
            viewport_top_left: [world.viewport.top_left.x, world.viewport.top_left.y, world.viewport.top_left.z],
            viewport_bottom_right: [
                world.viewport.bottom_right.x,
                world.viewport.bottom_right.y,
                world.viewport.bottom_right.z,
            ],
            bodies: world.bodies().iter().map(PersistedBody::from).collect(),
        }
    }

    /// Rebuilds the `World` this state describes, re-validating every body
    /// through the same invariants `Body::new` enforces (spec §7).
    pub fn into_world(self) -> Result<World, DomainError> {
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for pb in self.bodies {
            bodies.push(Body::with_id(
                pb.id,
                Vec3::new(pb.position[0], pb.position[1], pb.position[2]),
                Vec3::new(pb.velocity[0], pb.velocity[1], pb.velocity[2]),
                pb.mass,
                pb.radius,
            )?);
        }

        let viewport = Viewport::new(
            Vec3::new(self.viewport_top_left[0], self.viewport_top_left[1], self.viewport_top_left[2]),
            Vec3::new(
                self.viewport_bottom_right[0],
                self.viewport_bottom_right[1],
                self.viewport_bottom_right[2],
            ),
        );

        Ok(World::new(bodies, self.closed_boundaries, self.elastic_collisions, viewport))
    }

    pub fn acceleration_kind(&self) -> AccelerationKind {
        self.acceleration.into()
    }

    pub fn integrator_kind(&self) -> IntegratorKind {
        self.integrator.into()
    }

    pub fn oversampler_kind(&self) -> OversamplerKind {
        self.oversampler.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Direct as DirectStrategy;

    #[test]
    fn round_trips_a_world_through_capture_and_into_world() {
        let body = Body::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.1, 0.0, 0.0), 5.0, 0.5).unwrap();
        let id = body.id;
        let world = World::new(
            vec![body],
            true,
            false,
            Viewport::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0)),
        );

        let acceleration = AccelerationKind::Direct(DirectStrategy);
        let integrator = IntegratorKind::SemiImplicit(SemiImplicitEuler);
        let oversampler = OversamplerKind::Static(Static(1));

        let state = State::capture(&world, &acceleration, &integrator, &oversampler);
        let restored = state.into_world().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.bodies()[0].id, id);
        assert!(restored.closed_boundaries);
        assert!((restored.bodies()[0].position.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_a_persisted_body_with_invalid_mass() {
        let state = State {
            acceleration: AccelerationTag::Direct,
            integrator: IntegratorTag::SemiImplicit,
            oversampler: OversamplerTag::Static(1),
            closed_boundaries: false,
            elastic_collisions: false,
            viewport_top_left: [-1.0, -1.0, -1.0],
            viewport_bottom_right: [1.0, 1.0, 1.0],
            bodies: vec![PersistedBody {
                id: 0,
                position: [0.0, 0.0, 0.0],
                velocity: [0.0, 0.0, 0.0],
                mass: 0.0,
                radius: 1.0,
            }],
        };
        assert!(state.into_world().is_err());
    }
}
