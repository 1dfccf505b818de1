//! Barnes-Hut octree acceleration (spec §4.1.2).
//!
//! An arena-backed octree: nodes live in a `Vec`, children are `i32`
//! indices (no sentinel needed here since a node is only ever `Internal`
//! after all eight children have been pushed as one contiguous block).

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::{AccelerationStrategy, G};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::spatial::{morton_key, Cube};
use crate::vec3::Vec3;
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "encode", derive(serde::Serialize, serde::Deserialize))]
pub struct BhConfig {
    pub max_depth: usize,
    /// A node stops subdividing once its width is at or below this, even
    /// if multiple distinct bodies remain (spec §4.1.2).
    pub eps: f64,
}

impl Default for BhConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            eps: 1e-12,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BarnesHut {
    pub config: BhConfig,
}

impl BarnesHut {
    pub fn new(config: BhConfig) -> Self {
        Self { config }
    }
}

enum NodeState {
    Empty,
    Single { pos: Vec3, mass: f64 },
    /// Degenerate leaf: depth/eps limit reached with >1 distinct body.
    /// Accumulates Σm and Σm·r directly, per spec §4.1.2.
    Aggregate { sum_m: f64, sum_mr: Vec3 },
    Internal,
}

struct Node {
    bounds: Cube,
    children: [i32; 8],
    state: NodeState,
    mass: f64,
    center_of_mass: Vec3,
}

impl Node {
    fn leaf(bounds: Cube) -> Self {
        Self {
            bounds,
            children: [-1; 8],
            state: NodeState::Empty,
            mass: 0.0,
            center_of_mass: Vec3::zero(),
        }
    }
}

struct Octree {
    nodes: Vec<Node>,
}

impl Octree {
    fn new(bounds: Cube) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds)],
        }
    }

    fn insert(&mut self, pos: Vec3, mass: f64, config: &BhConfig) {
        self.insert_at(0, pos, mass, 0, config);
    }

    fn insert_at(&mut self, node_idx: usize, pos: Vec3, mass: f64, depth: usize, config: &BhConfig) {
        let bounds = self.nodes[node_idx].bounds;

        // Take the state out so we can both inspect and overwrite it without
        // holding a borrow across the recursive call below.
        let state = std::mem::replace(&mut self.nodes[node_idx].state, NodeState::Internal);

        match state {
            NodeState::Empty => {
                self.nodes[node_idx].state = NodeState::Single { pos, mass };
            }
            NodeState::Single { pos: existing_pos, mass: existing_mass } => {
                if depth >= config.max_depth || bounds.width <= config.eps {
                    self.nodes[node_idx].state = NodeState::Aggregate {
                        sum_m: existing_mass + mass,
                        sum_mr: existing_pos * existing_mass + pos * mass,
                    };
                } else {
                    let first_child = self.nodes.len() as i32;
                    for octant in bounds.octants() {
                        self.nodes.push(Node::leaf(octant));
                    }
                    self.nodes[node_idx].children = std::array::from_fn(|k| first_child + k as i32);
                    self.nodes[node_idx].state = NodeState::Internal;

                    let c1 = first_child as usize + bounds.octant_index(existing_pos);
                    let c2 = first_child as usize + bounds.octant_index(pos);
                    self.insert_at(c1, existing_pos, existing_mass, depth + 1, config);
                    self.insert_at(c2, pos, mass, depth + 1, config);
                }
            }
            NodeState::Aggregate { sum_m, sum_mr } => {
                self.nodes[node_idx].state = NodeState::Aggregate {
                    sum_m: sum_m + mass,
                    sum_mr: sum_mr + pos * mass,
                };
            }
            NodeState::Internal => {
                self.nodes[node_idx].state = NodeState::Internal;
                let idx = bounds.octant_index(pos);
                let child = self.nodes[node_idx].children[idx] as usize;
                self.insert_at(child, pos, mass, depth + 1, config);
            }
        }
    }

    /// Single post-order pass computing mass and center-of-mass for every
    /// node (spec §4.1.2). Descendants are always at a higher index than
    /// their ancestor (insertion only appends), so a single reverse scan
    /// suffices.
    fn finalize(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            let (mass, com) = match &self.nodes[i].state {
                NodeState::Empty => (0.0, Vec3::zero()),
                NodeState::Single { pos, mass } => (*mass, *pos),
                NodeState::Aggregate { sum_m, sum_mr } => {
                    if *sum_m > 0.0 {
                        (*sum_m, *sum_mr / *sum_m)
                    } else {
                        (0.0, Vec3::zero())
                    }
                }
                NodeState::Internal => {
                    let mut mass = 0.0;
                    let mut weighted = Vec3::zero();
                    for &c in &self.nodes[i].children {
                        let child = &self.nodes[c as usize];
                        mass += child.mass;
                        weighted += child.center_of_mass * child.mass;
                    }
                    if mass > 0.0 {
                        (mass, weighted / mass)
                    } else {
                        (0.0, Vec3::zero())
                    }
                }
            };
            self.nodes[i].mass = mass;
            self.nodes[i].center_of_mass = com;
        }
    }

    #[inline]
    fn is_leaf(&self, idx: usize) -> bool {
        !matches!(self.nodes[idx].state, NodeState::Internal)
    }
}

/// Minimum pairwise separation over the max extent, sampled over the
/// first <=32 bodies, clamped to [0,1] (spec §4.1.2).
fn separation_ratio(positions: &[Vec3]) -> f64 {
    let sample = &positions[..positions.len().min(32)];
    if sample.len() < 2 {
        return 1.0;
    }

    let mut min = Vec3::new(f64::MAX, f64::MAX, f64::MAX);
    let mut max = Vec3::new(f64::MIN, f64::MIN, f64::MIN);
    for &p in sample {
        min = crate::vec3::elem_min(min, p);
        max = crate::vec3::elem_max(max, p);
    }
    let extent = (max - min).mag().max(1e-300);

    let mut min_d = f64::MAX;
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            let d = (sample[i] - sample[j]).mag();
            if d < min_d {
                min_d = d;
            }
        }
    }

    (min_d / extent).clamp(0.0, 1.0)
}

/// Adaptive opening angle θ from body count and cluster separation (spec
/// §4.1.2). Retunable without breaking the small-N exact overrides.
pub fn adaptive_theta(n: usize, positions: &[Vec3]) -> f64 {
    if n <= 3 {
        0.0
    } else if n <= 10 {
        0.1
    } else if n <= 50 {
        0.2
    } else {
        let s = separation_ratio(positions);
        let base = (0.62 + 0.22 * (n as f64).log10()).clamp(0.6, 1.0);
        base * (0.9 + 0.2 * s)
    }
}

impl AccelerationStrategy for BarnesHut {
    fn compute(&self, _world: &World, active: &[usize], bodies: &mut [Body], diagnostics: &Diagnostics) {
        diagnostics.set("Strategy", "Barnes-Hut");

        if active.is_empty() {
            return;
        }

        let positions: Vec<Vec3> = active.iter().map(|&i| bodies[i].position).collect();
        let bounds = Cube::containing(positions.iter().copied(), 1.0).expect("active is non-empty");

        // Morton-sorted insertion order for cache locality (spec §4.1.2).
        let mut order: Vec<usize> = (0..active.len()).collect();
        order.sort_by_key(|&k| morton_key(positions[k], &bounds));

        let mut tree = Octree::new(bounds);
        for &k in &order {
            tree.insert(positions[k], bodies[active[k]].mass, &self.config);
        }
        tree.finalize();

        let theta = adaptive_theta(active.len(), &positions);
        let theta_sq = theta * theta;
        let visits = AtomicUsize::new(0);

        let accelerations: Vec<Vec3> = (0..active.len())
            .into_par_iter()
            .map(|ai| {
                let b_pos = positions[ai];
                let mut acc = Vec3::zero();
                let mut stack: Vec<i32> = Vec::with_capacity(64);
                stack.push(0);
                let mut local_visits = 0usize;

                while let Some(node_idx) = stack.pop() {
                    local_visits += 1;
                    let idx = node_idx as usize;
                    let node = &tree.nodes[idx];
                    if node.mass <= 0.0 {
                        continue;
                    }

                    let diff = node.center_of_mass - b_pos;
                    let d2 = diff.mag_sq();
                    if d2 == 0.0 {
                        continue;
                    }

                    if tree.is_leaf(idx) || node.bounds.width * node.bounds.width < theta_sq * d2 {
                        let dist = d2.sqrt();
                        acc += diff * (G * node.mass / (d2 * dist));
                    } else {
                        stack.extend_from_slice(&node.children);
                    }
                }

                visits.fetch_add(local_visits, Ordering::Relaxed);
                acc
            })
            .collect();

        for (ai, &i) in active.iter().enumerate() {
            bodies[i].acceleration = accelerations[ai];
        }

        diagnostics.set("Nodes", tree.nodes.len());
        diagnostics.set("MaxDepth", self.config.max_depth);
        diagnostics.set("Visits", visits.load(Ordering::Relaxed));
        diagnostics.set("Theta", theta);
    }
}
