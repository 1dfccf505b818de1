//! Particle-Mesh long-range solver with a direct short-range fallback
//! (spec §4.1.3): CIC assignment, 3D FFT, spectral Poisson solve, gradient
//! interpolation back to bodies.

use std::f64::consts::PI;

use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use super::{AccelerationStrategy, Direct, G};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::spatial::Cube;
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct PmConfig {
    /// Cells per axis. Must be a power of two; 64 is the spec's
    /// recommendation.
    pub grid_size: usize,
    /// Fractional padding applied to the active bounding box (spec: 10%).
    pub pad_fraction: f64,
    /// Below this active-body count the grid discretization error
    /// dominates and we fall back to the direct kernel (spec §4.1.3).
    pub small_n_threshold: usize,
}

impl Default for PmConfig {
    fn default() -> Self {
        Self {
            grid_size: 64,
            pad_fraction: 0.10,
            small_n_threshold: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ParticleMesh {
    pub config: PmConfig,
}

impl ParticleMesh {
    pub fn new(config: PmConfig) -> Self {
        Self { config }
    }
}

#[inline]
fn idx(x: usize, y: usize, z: usize, n: usize) -> usize {
    x + y * n + z * n * n
}

/// Three in-place 1D FFTs along X, Y, Z — a separable 3D FFT (spec
/// §4.1.3 step 3/5). Every pass is a batch of independent length-`n`
/// transforms, so each runs data-parallel across those rows/columns: the
/// X pass splits into disjoint contiguous chunks, while the strided Y and
/// Z passes gather each column into its own scratch buffer in parallel
/// and write the transformed columns back in a final sequential pass.
fn fft_3d(data: &mut [Complex<f64>], n: usize, inverse: bool) {
    let mut planner = FftPlanner::new();
    let fft: std::sync::Arc<dyn Fft<f64>> = if inverse {
        planner.plan_fft_inverse(n)
    } else {
        planner.plan_fft_forward(n)
    };

    // X: contiguous runs of length n.
    data.par_chunks_mut(n).for_each(|chunk| fft.process(chunk));

    // Y: stride n within each z-plane.
    let snapshot = data.to_vec();
    let y_columns: Vec<((usize, usize), Vec<Complex<f64>>)> = (0..n * n)
        .into_par_iter()
        .map(|k| {
            let (x, z) = (k % n, k / n);
            let plane = z * n * n;
            let mut buf: Vec<Complex<f64>> = (0..n).map(|y| snapshot[plane + y * n + x]).collect();
            fft.process(&mut buf);
            ((x, z), buf)
        })
        .collect();
    for ((x, z), buf) in y_columns {
        let plane = z * n * n;
        for (y, v) in buf.into_iter().enumerate() {
            data[plane + y * n + x] = v;
        }
    }

    // Z: stride n*n.
    let snapshot = data.to_vec();
    let z_columns: Vec<((usize, usize), Vec<Complex<f64>>)> = (0..n * n)
        .into_par_iter()
        .map(|k| {
            let (x, y) = (k % n, k / n);
            let mut buf: Vec<Complex<f64>> = (0..n).map(|z| snapshot[idx(x, y, z, n)]).collect();
            fft.process(&mut buf);
            ((x, y), buf)
        })
        .collect();
    for ((x, y), buf) in z_columns {
        for (z, v) in buf.into_iter().enumerate() {
            data[idx(x, y, z, n)] = v;
        }
    }

    if inverse {
        let scale = 1.0 / (n * n * n) as f64;
        data.par_iter_mut().for_each(|c| *c *= scale);
    }
}

/// Trilinear (cloud-in-cell) weights for the 8 vertices surrounding `rel`
/// (a position already divided by cell size `h`, relative to the grid
/// origin). Indices are clamped rather than wrapped: the domain is a
/// padded, non-periodic box.
fn cic_corners(rel: Vec3, n: usize) -> [(usize, usize, usize, f64); 8] {
    let ix = rel.x.floor();
    let iy = rel.y.floor();
    let iz = rel.z.floor();
    let fx = rel.x - ix;
    let fy = rel.y - iy;
    let fz = rel.z - iz;

    let clamp = |v: f64| -> usize { (v.max(0.0) as usize).min(n - 1) };

    let mut out = [(0usize, 0usize, 0usize, 0.0f64); 8];
    let mut k = 0;
    for dz in 0..2 {
        let (wz, zf) = if dz == 0 { (1.0 - fz, iz) } else { (fz, iz + 1.0) };
        for dy in 0..2 {
            let (wy, yf) = if dy == 0 { (1.0 - fy, iy) } else { (fy, iy + 1.0) };
            for dx in 0..2 {
                let (wx, xf) = if dx == 0 { (1.0 - fx, ix) } else { (fx, ix + 1.0) };
                out[k] = (clamp(xf), clamp(yf), clamp(zf), wx * wy * wz);
                k += 1;
            }
        }
    }
    out
}

impl AccelerationStrategy for ParticleMesh {
    fn compute(&self, world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics) {
        diagnostics.set("Strategy", "Particle-Mesh");
        diagnostics.set("GridSize", self.config.grid_size);
        diagnostics.set("Bodies", active.len());

        if active.len() < self.config.small_n_threshold {
            Direct.compute(world, active, bodies, diagnostics);
            diagnostics.set("Strategy", "Particle-Mesh");
            diagnostics.set("GridSize", self.config.grid_size);
            diagnostics.set("Bodies", active.len());
            return;
        }

        let n = self.config.grid_size;
        let positions: Vec<Vec3> = active.iter().map(|&i| bodies[i].position).collect();
        let masses: Vec<f64> = active.iter().map(|&i| bodies[i].mass).collect();

        let domain = Cube::containing(positions.iter().copied(), 0.0)
            .expect("active is non-empty")
            .padded(self.config.pad_fraction);

        let h = domain.width / n as f64;
        let origin = domain.center - Vec3::new(domain.width / 2.0, domain.width / 2.0, domain.width / 2.0);

        let mut density = vec![Complex::new(0.0, 0.0); n * n * n];
        for (p, &m) in positions.iter().zip(masses.iter()) {
            let rel = (*p - origin) / h;
            for &(x, y, z, w) in &cic_corners(rel, n) {
                density[idx(x, y, z, n)].re += m * w / (h * h * h);
            }
        }

        fft_3d(&mut density, n, false);

        let mut ax_hat = vec![Complex::new(0.0, 0.0); n * n * n];
        let mut ay_hat = vec![Complex::new(0.0, 0.0); n * n * n];
        let mut az_hat = vec![Complex::new(0.0, 0.0); n * n * n];
        let l = domain.width;
        let two_pi_over_l = 2.0 * PI / l;

        let wavenumber = |i: usize| -> f64 {
            if i <= n / 2 {
                i as f64 * two_pi_over_l
            } else {
                (i as f64 - n as f64) * two_pi_over_l
            }
        };

        for z in 0..n {
            let kz = wavenumber(z);
            for y in 0..n {
                let ky = wavenumber(y);
                for x in 0..n {
                    let kx = wavenumber(x);
                    let k2 = kx * kx + ky * ky + kz * kz;
                    let i = idx(x, y, z, n);
                    if k2 == 0.0 {
                        continue; // DC term: acceleration spectrum is zero.
                    }
                    let rho_hat = density[i];
                    let factor = 4.0 * PI * G / k2;
                    // a_hat(k) = i*k*(4*pi*G/k^2)*rho_hat(k): multiplying by
                    // `i` rotates (re, im) -> (-im, re).
                    let rotated = Complex::new(-rho_hat.im, rho_hat.re);
                    ax_hat[i] = rotated * (kx * factor);
                    ay_hat[i] = rotated * (ky * factor);
                    az_hat[i] = rotated * (kz * factor);
                }
            }
        }

        fft_3d(&mut ax_hat, n, true);
        fft_3d(&mut ay_hat, n, true);
        fft_3d(&mut az_hat, n, true);

        let accelerations: Vec<Vec3> = active
            .par_iter()
            .map(|&i| {
                let rel = (bodies[i].position - origin) / h;
                let mut acc = Vec3::zero();
                for &(x, y, z, w) in &cic_corners(rel, n) {
                    let cell = idx(x, y, z, n);
                    acc.x += w * ax_hat[cell].re;
                    acc.y += w * ay_hat[cell].re;
                    acc.z += w * az_hat[cell].re;
                }
                acc
            })
            .collect();

        for (&i, &acc) in active.iter().zip(accelerations.iter()) {
            bodies[i].acceleration = acc;
        }
    }
}
