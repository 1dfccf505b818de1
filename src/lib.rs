//! `gravito`: a pluggable N-body gravity engine.
//!
//! Composes an acceleration strategy, an integrator, and an oversampler
//! (each a small trait object) around a caller-owned [`World`], resolving
//! collisions and boundary reflection every step.

pub mod body;
pub mod collide;
pub mod compute;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod integrate;
pub mod oversample;
pub mod spatial;
pub mod state;
pub mod vec3;
pub mod world;

pub use body::{Body, BodyId};
pub use compute::{AccelerationKind, AccelerationStrategy, BarnesHut, BhConfig, Direct, Fmm, FmmConfig, ParticleMesh, PmConfig};
pub use diagnostics::{DiagValue, Diagnostics};
pub use engine::Engine;
pub use error::DomainError;
pub use integrate::{Integrator, IntegratorKind, Leapfrog, Rk4, SemiImplicitEuler, WarmStartVerlet};
pub use oversample::{Adaptive, Oversampler, OversamplerKind, Static};
pub use state::State;
pub use vec3::Vec3;
pub use world::{Viewport, World};
