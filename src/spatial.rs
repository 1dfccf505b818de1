//! Shared spatial-subdivision primitives used by both the Barnes-Hut and
//! FMM octrees (spec §3, "Arena-backed octree node — used by both").

use crate::vec3::Vec3;

/// An axis-aligned cubical bounding box (length = width = depth).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cube {
    pub center: Vec3,
    pub width: f64,
}

impl Cube {
    pub fn new(center: Vec3, width: f64) -> Self {
        Self { center, width }
    }

    /// Smallest cube containing every position in `positions`, padded to
    /// avoid degenerate zero-width boxes for a single body or coincident
    /// bodies (spec §4.1.2: "bounding box ... padded slightly if degenerate").
    pub fn containing(positions: impl Iterator<Item = Vec3>, pad: f64) -> Option<Self> {
        let mut min = Vec3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Vec3::new(f64::MIN, f64::MIN, f64::MIN);
        let mut any = false;

        for p in positions {
            any = true;
            min = crate::vec3::elem_min(min, p);
            max = crate::vec3::elem_max(max, p);
        }

        if !any {
            return None;
        }

        let size = max - min;
        let mut width = size.x.max(size.y).max(size.z);
        if width <= 0.0 {
            width = pad.max(1.0);
        } else {
            width += 2.0 * pad;
        }

        let center = (min + max) * 0.5;
        Some(Self::new(center, width))
    }

    /// Index 0..8 of the octant containing `pos`: bit0=x, bit1=y, bit2=z,
    /// set when `pos` is on the positive side of `center`. Matches the
    /// convention used consistently by `octant_bounds`.
    #[inline]
    pub fn octant_index(&self, pos: Vec3) -> usize {
        let mut idx = 0usize;
        if pos.x > self.center.x {
            idx |= 0b001;
        }
        if pos.y > self.center.y {
            idx |= 0b010;
        }
        if pos.z > self.center.z {
            idx |= 0b100;
        }
        idx
    }

    /// The bounds of a single octant, without materializing all eight.
    pub fn octant_bounds(&self, index: usize) -> Self {
        let half = self.width / 2.0;
        let quarter = self.width / 4.0;
        let sx = if index & 0b001 != 0 { quarter } else { -quarter };
        let sy = if index & 0b010 != 0 { quarter } else { -quarter };
        let sz = if index & 0b100 != 0 { quarter } else { -quarter };
        Self::new(self.center + Vec3::new(sx, sy, sz), half)
    }

    pub fn octants(&self) -> [Self; 8] {
        std::array::from_fn(|i| self.octant_bounds(i))
    }

    /// Grows the cube by `fraction` on each side, keeping it centered
    /// (spec §4.1.3: "pad by 10% to reduce boundary bias").
    pub fn padded(&self, fraction: f64) -> Self {
        Self::new(self.center, self.width * (1.0 + 2.0 * fraction))
    }
}

/// Bit-interleaves 21-bit-per-axis integer coordinates into a 63-bit Morton
/// key (spec §4.1.2). Coordinates are normalized into `bounds` first.
pub fn morton_key(pos: Vec3, bounds: &Cube) -> u64 {
    const BITS: u32 = 21;
    let half = bounds.width / 2.0;
    let lo = bounds.center - Vec3::new(half, half, half);
    let scale = ((1u64 << BITS) - 1) as f64;

    let axis = |v: f64, lo: f64| -> u32 {
        let t = if bounds.width > 0.0 {
            ((v - lo) / bounds.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (t * scale) as u32
    };

    let xi = axis(pos.x, lo.x);
    let yi = axis(pos.y, lo.y);
    let zi = axis(pos.z, lo.z);

    spread3(xi as u64) | (spread3(yi as u64) << 1) | (spread3(zi as u64) << 2)
}

/// Spreads the low 21 bits of `v` so that two zero bits follow each
/// original bit, the standard "split-by-3" step of a 3D Morton encode.
fn spread3(mut v: u64) -> u64 {
    v &= 0x1f_ffff;
    v = (v | (v << 32)) & 0x1f00000000ffff;
    v = (v | (v << 16)) & 0x1f0000ff0000ff;
    v = (v | (v << 8)) & 0x100f00f00f00f00f;
    v = (v | (v << 4)) & 0x10c30c30c30c30c3;
    v = (v | (v << 2)) & 0x1249249249249249;
    v
}
