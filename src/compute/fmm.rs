//! Fast Multipole Method: monopole + traceless-quadrupole (order P=2)
//! octree evaluation (spec §4.1.4).

use rayon::prelude::*;

use super::{AccelerationStrategy, Direct, G};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::spatial::Cube;
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct FmmConfig {
    pub max_bodies_per_leaf: usize,
    pub max_depth: usize,
    /// Well-separated opening angle; fixed, unlike Barnes-Hut's adaptive θ.
    pub theta: f64,
    pub small_n_threshold: usize,
}

impl Default for FmmConfig {
    fn default() -> Self {
        Self {
            max_bodies_per_leaf: 32,
            max_depth: 10,
            theta: 0.5,
            small_n_threshold: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Fmm {
    pub config: FmmConfig,
}

impl Fmm {
    pub fn new(config: FmmConfig) -> Self {
        Self { config }
    }
}

type Quad = [[f64; 3]; 3];

struct FmmNode {
    bounds: Cube,
    children: [i32; 8],
    body_indices: Vec<usize>,
    mass: f64,
    center_of_mass: Vec3,
    quad: Quad,
}

impl FmmNode {
    fn leaf(bounds: Cube, body_indices: Vec<usize>) -> Self {
        Self {
            bounds,
            children: [-1; 8],
            body_indices,
            mass: 0.0,
            center_of_mass: Vec3::zero(),
            quad: [[0.0; 3]; 3],
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.children[0] < 0
    }
}

fn build(positions: &[Vec3], bounds: Cube, config: &FmmConfig) -> Vec<FmmNode> {
    let mut nodes = vec![FmmNode::leaf(bounds, (0..positions.len()).collect())];
    let mut stack = vec![(0usize, 0usize)];

    while let Some((node_idx, depth)) = stack.pop() {
        if nodes[node_idx].body_indices.len() <= config.max_bodies_per_leaf || depth >= config.max_depth {
            continue;
        }

        let bb = nodes[node_idx].bounds;
        let indices = std::mem::take(&mut nodes[node_idx].body_indices);
        let mut buckets: [Vec<usize>; 8] = Default::default();
        for &i in &indices {
            buckets[bb.octant_index(positions[i])].push(i);
        }

        let first_child = nodes.len() as i32;
        for (k, bucket) in buckets.into_iter().enumerate() {
            nodes.push(FmmNode::leaf(bb.octant_bounds(k), bucket));
        }
        nodes[node_idx].children = std::array::from_fn(|k| first_child + k as i32);
        for k in 0..8 {
            stack.push((first_child as usize + k, depth + 1));
        }
    }

    nodes
}

/// Per-leaf monopole + traceless quadrupole, computed independently of
/// every other leaf (spec §4.1.4).
fn leaf_moments(node: &FmmNode, positions: &[Vec3], masses: &[f64]) -> (f64, Vec3, Quad) {
    let mut mass = 0.0;
    let mut weighted = Vec3::zero();
    for &bi in &node.body_indices {
        mass += masses[bi];
        weighted += positions[bi] * masses[bi];
    }
    let com = if mass > 0.0 { weighted / mass } else { Vec3::zero() };

    let mut quad = [[0.0; 3]; 3];
    for &bi in &node.body_indices {
        let r = positions[bi] - com;
        let rv = [r.x, r.y, r.z];
        let r2 = r.mag_sq();
        for a in 0..3 {
            for b in 0..3 {
                let delta = if a == b { 1.0 } else { 0.0 };
                quad[a][b] += masses[bi] * (3.0 * rv[a] * rv[b] - r2 * delta);
            }
        }
    }
    (mass, com, quad)
}

/// Upward pass: leaves are independent of each other so their moments are
/// assembled in parallel first; the parallel-axis-shifted combination up
/// to the root then runs as a single sequential reverse pass, since each
/// internal node's moments genuinely depend on its already-visited
/// children (spec §4.1.4).
fn finalize(nodes: &mut [FmmNode], positions: &[Vec3], masses: &[f64]) {
    let leaves: Vec<(usize, f64, Vec3, Quad)> = (0..nodes.len())
        .into_par_iter()
        .filter(|&i| nodes[i].is_leaf())
        .map(|i| {
            let (mass, com, quad) = leaf_moments(&nodes[i], positions, masses);
            (i, mass, com, quad)
        })
        .collect();

    for (i, mass, com, quad) in leaves {
        nodes[i].mass = mass;
        nodes[i].center_of_mass = com;
        nodes[i].quad = quad;
    }

    for i in (0..nodes.len()).rev() {
        if nodes[i].is_leaf() {
            continue;
        }

        let mut mass = 0.0;
        let mut weighted = Vec3::zero();
        for &c in &nodes[i].children {
            let child = &nodes[c as usize];
            mass += child.mass;
            weighted += child.center_of_mass * child.mass;
        }
        let com = if mass > 0.0 { weighted / mass } else { Vec3::zero() };

        let mut quad = [[0.0; 3]; 3];
        for &c in &nodes[i].children {
            let child = &nodes[c as usize];
            if child.mass <= 0.0 {
                continue;
            }
            let d = child.center_of_mass - com;
            let dv = [d.x, d.y, d.z];
            let d2 = d.mag_sq();
            for a in 0..3 {
                for b in 0..3 {
                    let delta = if a == b { 1.0 } else { 0.0 };
                    quad[a][b] += child.quad[a][b] + child.mass * (3.0 * dv[a] * dv[b] - d2 * delta);
                }
            }
        }

        nodes[i].mass = mass;
        nodes[i].center_of_mass = com;
        nodes[i].quad = quad;
    }
}

/// `aᵐᵒⁿᵒ + aᑫᵘᵃᵈ` evaluated at relative vector `r = target - source`,
/// `d = |r|` (spec §4.1.4).
fn multipole_acceleration(mass: f64, quad: &Quad, r: Vec3, d: f64) -> Vec3 {
    let mono = r * (-G * mass / (d * d * d));

    let rv = [r.x, r.y, r.z];
    let qr = [
        quad[0][0] * rv[0] + quad[0][1] * rv[1] + quad[0][2] * rv[2],
        quad[1][0] * rv[0] + quad[1][1] * rv[1] + quad[1][2] * rv[2],
        quad[2][0] * rv[0] + quad[2][1] * rv[1] + quad[2][2] * rv[2],
    ];
    let r_qr = rv[0] * qr[0] + rv[1] * qr[1] + rv[2] * qr[2];
    let d2 = d * d;
    let d5 = d2 * d2 * d;
    let coeff = G / (2.0 * d5);
    let quad_term = Vec3::new(
        coeff * (qr[0] - 5.0 * r_qr / d2 * rv[0]),
        coeff * (qr[1] - 5.0 * r_qr / d2 * rv[1]),
        coeff * (qr[2] - 5.0 * r_qr / d2 * rv[2]),
    );

    mono + quad_term
}

impl AccelerationStrategy for Fmm {
    fn compute(&self, world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics) {
        diagnostics.set("Strategy", "FMM");
        diagnostics.set("Bodies", active.len());
        diagnostics.set("MaxDepth", self.config.max_depth);

        if active.len() <= self.config.small_n_threshold {
            Direct.compute(world, active, bodies, diagnostics);
            diagnostics.set("Strategy", "FMM");
            diagnostics.set("Bodies", active.len());
            diagnostics.set("MaxDepth", self.config.max_depth);
            diagnostics.set("Cells", 1usize);
            return;
        }

        let positions: Vec<Vec3> = active.iter().map(|&i| bodies[i].position).collect();
        let masses: Vec<f64> = active.iter().map(|&i| bodies[i].mass).collect();
        let radii: Vec<f64> = active.iter().map(|&i| bodies[i].radius).collect();

        let bounds = Cube::containing(positions.iter().copied(), 1.0).expect("active is non-empty");
        let mut nodes = build(&positions, bounds, &self.config);
        finalize(&mut nodes, &positions, &masses);

        let theta = self.config.theta;

        let accelerations: Vec<Vec3> = (0..active.len())
            .into_par_iter()
            .map(|ai| {
                let b_pos = positions[ai];
                let mut acc = Vec3::zero();
                let mut stack = vec![0usize];

                while let Some(idx) = stack.pop() {
                    let node = &nodes[idx];
                    if node.mass <= 0.0 {
                        continue;
                    }

                    let r = b_pos - node.center_of_mass;
                    let d = r.mag();

                    let well_separated = d > node.bounds.width / theta;

                    if well_separated {
                        if d > 0.0 {
                            acc += multipole_acceleration(node.mass, &node.quad, r, d);
                        }
                    } else if node.is_leaf() {
                        let ri = radii[ai];
                        for &bi in &node.body_indices {
                            if bi == ai {
                                continue;
                            }
                            let d_vec = b_pos - positions[bi];
                            let actual_d2 = d_vec.mag_sq();
                            if actual_d2 == 0.0 {
                                continue;
                            }
                            let softened = (ri + radii[bi]) * (ri + radii[bi]);
                            let d2 = actual_d2.max(softened);
                            let dist = d2.sqrt();
                            acc -= d_vec * (G * masses[bi] / (d2 * dist));
                        }
                    } else {
                        stack.extend_from_slice(&node.children);
                    }
                }

                acc
            })
            .collect();

        for (ai, &i) in active.iter().enumerate() {
            bodies[i].acceleration = accelerations[ai];
        }

        diagnostics.set("Cells", nodes.len());
    }
}
