//! The unit of simulation (spec §3).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DomainError;
use crate::vec3::{is_finite, Vec3};

/// Monotonically allocated, never reused. Stable across a run.
pub type BodyId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Allocates the next `BodyId`. Ids are never reused, matching spec §3:
/// "allocated monotonically; stable across a run; never reused".
pub fn next_body_id() -> BodyId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Presentation-only fields. The core reads and writes none of these; they
/// are carried through so the caller's render layer can round-trip them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct Appearance {
    pub color: [f32; 3],
    pub atmosphere_color: [f32; 3],
    pub atmosphere_thickness: f32,
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    pub id: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub mass: f64,
    pub radius: f64,
    pub absorbed: bool,
    pub appearance: Appearance,
}

impl Body {
    /// Validates and constructs a body with a freshly allocated id.
    ///
    /// Rejects non-positive mass, negative radius, and non-finite initial
    /// state per spec §7 ("invalid external input ... is rejected at body
    /// construction by the layer above").
    pub fn new(position: Vec3, velocity: Vec3, mass: f64, radius: f64) -> Result<Self, DomainError> {
        Self::validate(mass, radius, position, velocity)?;

        Ok(Self {
            id: next_body_id(),
            position,
            velocity,
            acceleration: Vec3::zero(),
            mass,
            radius,
            absorbed: false,
            appearance: Appearance::default(),
        })
    }

    /// Reconstructs a body with an explicit id, bypassing the id allocator.
    /// Used by `state::State::into_bodies` when restoring a saved run, where
    /// ids must match what was persisted rather than be freshly minted.
    pub fn with_id(id: BodyId, position: Vec3, velocity: Vec3, mass: f64, radius: f64) -> Result<Self, DomainError> {
        Self::validate(mass, radius, position, velocity)?;

        Ok(Self {
            id,
            position,
            velocity,
            acceleration: Vec3::zero(),
            mass,
            radius,
            absorbed: false,
            appearance: Appearance::default(),
        })
    }

    fn validate(mass: f64, radius: f64, position: Vec3, velocity: Vec3) -> Result<(), DomainError> {
        if mass <= 0.0 {
            return Err(DomainError::NonPositiveMass(mass));
        }
        if radius < 0.0 {
            return Err(DomainError::NegativeRadius(radius));
        }
        if !is_finite(position) || !is_finite(velocity) {
            return Err(DomainError::NonFiniteState);
        }
        Ok(())
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.absorbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_mass() {
        assert_eq!(
            Body::new(Vec3::zero(), Vec3::zero(), 0.0, 1.0).unwrap_err(),
            DomainError::NonPositiveMass(0.0)
        );
        assert_eq!(
            Body::new(Vec3::zero(), Vec3::zero(), -1.0, 1.0).unwrap_err(),
            DomainError::NonPositiveMass(-1.0)
        );
    }

    #[test]
    fn rejects_negative_radius() {
        assert_eq!(
            Body::new(Vec3::zero(), Vec3::zero(), 1.0, -1.0).unwrap_err(),
            DomainError::NegativeRadius(-1.0)
        );
    }

    #[test]
    fn rejects_non_finite_state() {
        assert_eq!(
            Body::new(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::zero(), 1.0, 1.0).unwrap_err(),
            DomainError::NonFiniteState
        );
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let a = Body::new(Vec3::zero(), Vec3::zero(), 1.0, 1.0).unwrap();
        let b = Body::new(Vec3::zero(), Vec3::zero(), 1.0, 1.0).unwrap();
        assert_ne!(a.id, b.id);
    }
}
