//! Pairwise collision detection and response (spec §4.4): a uniform grid
//! broad phase over the XY projection of each active body, followed by
//! elastic or inelastic response and overlap cancellation.

use std::collections::HashMap;

use crate::body::Body;
use crate::vec3::Vec3;
use crate::world::World;

/// Cell-size heuristic: twice the clamped median radius, so that most
/// bodies fit within a single cell width (spec §4.4).
fn cell_size(radii: &[f64]) -> f64 {
    if radii.is_empty() {
        return 1.0;
    }
    let mut sorted = radii.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let max = *sorted.last().unwrap();
    let median = sorted[sorted.len() / 2];
    1e-9_f64.max(2.0 * median.clamp(0.25 * max, max))
}

#[inline]
fn cell_of(pos: Vec3, c: f64) -> (i64, i64) {
    ((pos.x / c).floor() as i64, (pos.y / c).floor() as i64)
}

/// How many cells out a body's own radius forces the broad phase to look:
/// `1` while the body fits inside a cell, `2` while it spans at most two,
/// else `ceil(radius/c) + 1` for anything larger, e.g. a body grown past
/// several cell widths by repeated inelastic mergers (spec §4.4).
fn body_scan_radius(radius: f64, c: f64) -> i64 {
    if radius <= c {
        1
    } else if radius <= 2.0 * c {
        2
    } else {
        (radius / c).ceil() as i64 + 1
    }
}

/// Forward half-plane offsets out to Chebyshev distance `r`: together with
/// "same cell", these cover every unordered cell pair within `r` exactly
/// once, so no candidate pair is ever tested twice (spec §4.4). `r == 1`
/// reduces to the four offsets `(1,0),(0,1),(1,1),(-1,1)`.
fn forward_offsets(r: i64) -> Vec<(i64, i64)> {
    let mut offsets = Vec::new();
    for dy in 0..=r {
        let dx_start = if dy == 0 { 1 } else { -r };
        for dx in dx_start..=r {
            offsets.push((dx, dy));
        }
    }
    offsets
}

fn candidate_pairs(active: &[usize], bodies: &[Body], c: f64) -> Vec<(usize, usize)> {
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for &i in active {
        grid.entry(cell_of(bodies[i].position, c)).or_default().push(i);
    }

    // Each cell's own scan radius is driven by the largest body it holds;
    // a pair of cells is in range when either side's radius reaches the
    // other (spec §4.4).
    let mut cell_r: HashMap<(i64, i64), i64> = HashMap::new();
    for (&key, here) in &grid {
        let r = here.iter().map(|&i| body_scan_radius(bodies[i].radius, c)).max().unwrap_or(1);
        cell_r.insert(key, r);
    }
    let global_max_r = cell_r.values().copied().max().unwrap_or(1);
    let offsets = forward_offsets(global_max_r);

    let mut pairs = Vec::new();
    for (&(cx, cy), here) in &grid {
        for a in 0..here.len() {
            for b in (a + 1)..here.len() {
                pairs.push((here[a], here[b]));
            }
        }
        let r_here = cell_r[&(cx, cy)];
        for &(dx, dy) in &offsets {
            let there_key = (cx + dx, cy + dy);
            if let Some(there) = grid.get(&there_key) {
                let required = r_here.max(cell_r[&there_key]);
                if dx.abs().max(dy.abs()) <= required {
                    for &i in here {
                        for &j in there {
                            pairs.push((i, j));
                        }
                    }
                }
            }
        }
    }
    pairs
}

/// Pushes two overlapping bodies apart along their line of centers,
/// inverse-mass-weighted so the lighter body moves more. Only meaningful
/// when both survive the collision (spec §4.4).
fn cancel_overlap(a: &mut Body, b: &mut Body, normal: Vec3, overlap: f64) {
    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let total_inv = inv_a + inv_b;
    if total_inv <= 0.0 {
        return;
    }
    let share_a = if a.mass == b.mass { 0.5 } else { inv_a / total_inv };
    let share_b = 1.0 - share_a;
    a.position -= normal * (overlap * share_a);
    b.position += normal * (overlap * share_b);
}

/// Exchanges the normal component of velocity between two bodies along
/// `normal`, using the standard unequal-mass 1D elastic collision formula;
/// the tangential component is left untouched (spec §4.4).
fn elastic_response(a: &mut Body, b: &mut Body, normal: Vec3) {
    let rel = a.velocity - b.velocity;
    let v_n = rel.dot(normal);
    if v_n >= 0.0 {
        return; // already separating
    }
    let m1 = a.mass;
    let m2 = b.mass;
    let impulse = (2.0 * m2 / (m1 + m2)) * v_n;
    let impulse_other = (2.0 * m1 / (m1 + m2)) * v_n;
    a.velocity -= normal * impulse;
    b.velocity += normal * impulse_other;
}

/// Merges two bodies into the heavier one, conserving momentum. Ties are
/// broken deterministically by the lower id surviving (spec §4.4).
fn inelastic_merge(a: &mut Body, b: &mut Body) {
    let (survivor, absorbed) = if a.mass > b.mass || (a.mass == b.mass && a.id < b.id) {
        (a, b)
    } else {
        (b, a)
    };

    let total_mass = survivor.mass + absorbed.mass;
    survivor.velocity = (survivor.velocity * survivor.mass + absorbed.velocity * absorbed.mass) / total_mass;
    survivor.radius = (survivor.radius.powi(3) + absorbed.radius.powi(3)).cbrt();
    survivor.mass = total_mass;
    absorbed.absorbed = true;
}

/// Detects and resolves every overlapping pair among `active` bodies in
/// `world`, mutating positions, velocities, mass and `absorbed` in place.
/// Called once per engine step, after integration (spec §4.4, §4.5).
pub fn resolve(world: &mut World, active: &[usize]) {
    if active.len() < 2 {
        return;
    }

    let elastic = world.elastic_collisions;
    let radii: Vec<f64> = active.iter().map(|&i| world.bodies()[i].radius).collect();
    let c = cell_size(&radii);

    let pairs = candidate_pairs(active, world.bodies(), c);
    let bodies = world.bodies_mut();

    for (i, j) in pairs {
        if bodies[i].absorbed || bodies[j].absorbed {
            continue;
        }

        let delta = bodies[j].position - bodies[i].position;
        let dist_sq = delta.mag_sq();
        let min_dist = bodies[i].radius + bodies[j].radius;
        if dist_sq >= min_dist * min_dist || dist_sq == 0.0 {
            continue;
        }

        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        let overlap = min_dist - dist;

        if elastic {
            let (a, b) = split_pair(bodies, i, j);
            elastic_response(a, b, normal);
            cancel_overlap(a, b, normal, overlap);
        } else {
            let (a, b) = split_pair(bodies, i, j);
            inelastic_merge(a, b);
            if !a.absorbed && !b.absorbed {
                cancel_overlap(a, b, normal, overlap);
            }
        }
    }
}

/// Borrows two distinct elements of `bodies` mutably at once.
fn split_pair(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    assert_ne!(i, j);
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
