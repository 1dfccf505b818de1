//! Double-precision 3D vector primitives shared by every subsystem.
//!
//! All positions, velocities and accelerations in the engine are `Vec3`.
//! We reuse `ultraviolet`'s double-precision type rather than rolling our
//! own arithmetic, the same choice the teacher made for its 2D state.

pub use ultraviolet::DVec3 as Vec3;

/// Elementwise minimum. `ultraviolet::DVec3::component_min` reduces to a
/// scalar; we need the vector form for incremental AABB accumulation.
#[inline]
pub fn elem_min(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

/// Elementwise maximum, see [`elem_min`].
#[inline]
pub fn elem_max(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}

/// True if every component is finite (no NaN/∞), per the invariant in
/// spec §3: "all components of position/velocity/acceleration finite".
#[inline]
pub fn is_finite(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
