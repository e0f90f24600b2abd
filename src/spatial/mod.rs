use std::collections::HashMap;

use crate::{
    config,
    types::{Edge, Particle, Vec2},
};

/// Uniform grid bucketing point indices by `floor(pos / cell_size)`.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.cells.clear();
        for (idx, pos) in positions.into_iter().enumerate() {
            let key = self.cell_key(pos);
            self.cells.entry(key).or_default().push(idx);
        }
    }

    /// Collects every index in the 3x3 block of cells around `pos`.
    pub fn query_neighbors(&self, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_key(pos);
        for dy in -1..=1 {
            // Keys saturate at the i32 range for tiny cells; there is no cell past the edge.
            let Some(y) = cy.checked_add(dy) else {
                continue;
            };
            for dx in -1..=1 {
                let Some(x) = cx.checked_add(dx) else {
                    continue;
                };
                if let Some(indices) = self.cells.get(&(x, y)) {
                    out.extend_from_slice(indices);
                }
            }
        }
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

/// Rendering alpha for a pair `distance` apart; 0.22 when touching, 0 at the radius.
pub fn edge_alpha(distance: f32, connect_radius: f32) -> f32 {
    (1.0 - distance / connect_radius) * config::EDGE_ALPHA_MAX
}

/// Reusable state for computing the per-frame proximity graph.
#[derive(Debug, Default)]
pub struct ProximityGraph {
    grid: Option<SpatialHash>,
    neighbors: Vec<usize>,
}

impl ProximityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every pair `(a, b)`, `a < b`, closer than `connect_radius` into
    /// `out`, ordered by `a` then `b`. Returns how many candidates were
    /// examined. A radius of zero or less never connects anything.
    pub fn build(
        &mut self,
        particles: &[Particle],
        connect_radius: f32,
        out: &mut Vec<Edge>,
    ) -> usize {
        out.clear();
        if !(connect_radius > 0.0 && connect_radius.is_finite()) {
            self.grid = None;
            return 0;
        }

        if self
            .grid
            .as_ref()
            .is_some_and(|grid| grid.cell_size() != connect_radius)
        {
            self.grid = None;
        }
        let grid = self
            .grid
            .get_or_insert_with(|| SpatialHash::new(connect_radius));
        grid.rebuild(particles.iter().map(|p| p.pos));

        let mut candidates = 0;
        for (i, particle) in particles.iter().enumerate() {
            grid.query_neighbors(particle.pos, &mut self.neighbors);
            self.neighbors.sort_unstable();
            for &j in &self.neighbors {
                if j <= i {
                    continue;
                }
                candidates += 1;
                let dist = particle.pos.distance(particles[j].pos);
                if dist < connect_radius {
                    out.push(Edge {
                        a: i,
                        b: j,
                        alpha: edge_alpha(dist, connect_radius),
                    });
                }
            }
        }
        candidates
    }
}
