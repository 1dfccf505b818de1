//! `World`: the bodies plus the flags and viewport the engine reads each
//! step (spec §3, §6).

use crate::body::{Body, BodyId};
use crate::vec3::Vec3;

/// Axis-aligned box used only for boundary reflection (spec §3).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub top_left: Vec3,
    pub bottom_right: Vec3,
}

impl Viewport {
    pub fn new(top_left: Vec3, bottom_right: Vec3) -> Self {
        Self { top_left, bottom_right }
    }
}

/// A set of bodies plus the two world-level booleans from spec §3.
///
/// The engine never owns this; it is supplied by the caller each step
/// (spec §6, "World contract (supplied by the caller)").
#[derive(Clone, Debug)]
pub struct World {
    bodies: Vec<Body>,
    pub closed_boundaries: bool,
    pub elastic_collisions: bool,
    pub viewport: Viewport,
}

impl World {
    pub fn new(bodies: Vec<Body>, closed_boundaries: bool, elastic_collisions: bool, viewport: Viewport) -> Self {
        Self {
            bodies,
            closed_boundaries,
            elastic_collisions,
            viewport,
        }
    }

    pub fn push(&mut self, body: Body) {
        self.bodies.push(body);
    }

    /// All bodies, including absorbed ones — used by callers that want the
    /// full roster (e.g. to persist state).
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// The non-absorbed subset, stable within a step (spec §6).
    pub fn active_bodies(&self) -> Vec<usize> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Removes all bodies marked `absorbed`, called by the engine at the
    /// end of a step (spec §4.5, §6).
    pub fn remove_absorbed(&mut self) {
        self.bodies.retain(|b| !b.absorbed);
    }

    pub fn find(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
