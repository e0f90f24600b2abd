use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{
    config::{self, EffectiveConfig, FieldConfig},
    spatial::ProximityGraph,
    types::{Bounds, Edge, FieldStats, Particle, Vec2},
};

/// Converts the time since the previous frame into a motion scale relative
/// to 60 Hz, capped so a stalled frame cannot teleport particles.
pub fn delta_frames(elapsed_ms: Option<f64>) -> f32 {
    match elapsed_ms {
        Some(ms) if ms.is_finite() && ms > 0.0 => {
            ((ms / config::FRAME_MS as f64) as f32).min(config::MAX_DELTA_FRAMES)
        }
        _ => 1.0,
    }
}

pub struct ParticleField<R: Rng = StdRng> {
    config: FieldConfig,
    effective: EffectiveConfig,
    bounds: Bounds,
    particles: Vec<Particle>,
    edges: Vec<Edge>,
    graph: ProximityGraph,
    last_candidates: usize,
    rng: R,
}

impl ParticleField<StdRng> {
    pub fn from_entropy(config: FieldConfig, width: f32, height: f32) -> Self {
        Self::initialize(config, width, height, StdRng::from_entropy())
    }

    pub fn seeded(config: FieldConfig, width: f32, height: f32, seed: u64) -> Self {
        Self::initialize(config, width, height, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ParticleField<R> {
    pub fn initialize(config: FieldConfig, width: f32, height: f32, rng: R) -> Self {
        let mut field = Self {
            config,
            effective: config.effective(),
            bounds: Bounds::new(width, height),
            particles: Vec::new(),
            edges: Vec::new(),
            graph: ProximityGraph::new(),
            last_candidates: 0,
            rng,
        };
        field.spawn_particles();
        field
    }

    /// Throws away every particle and respawns for the new viewport.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Bounds::new(width, height);
        self.spawn_particles();
    }

    pub fn tick(&mut self, elapsed_ms: Option<f64>) {
        self.advance(delta_frames(elapsed_ms));
        self.rebuild_edges();
    }

    pub fn advance(&mut self, delta_frames: f32) {
        let Bounds { width, height } = self.bounds;
        let max_speed = self.effective.max_speed;
        let perturb = self.effective.perturb;
        let rng = &mut self.rng;

        for p in &mut self.particles {
            p.pos += p.vel * delta_frames;
            let mut kicked = false;

            if p.pos.x < 0.0 || p.pos.x > width {
                p.vel.x = -p.vel.x + jitter(rng, config::BOUNCE_JITTER);
                p.pos.x = p.pos.x.clamp(0.0, width);
                kicked = true;
            }
            if p.pos.y < 0.0 || p.pos.y > height {
                p.vel.y = -p.vel.y + jitter(rng, config::BOUNCE_JITTER);
                p.pos.y = p.pos.y.clamp(0.0, height);
                kicked = true;
            }

            if perturb && rng.gen_bool(config::PERTURB_PROBABILITY) {
                p.vel += Vec2::new(
                    jitter(rng, config::PERTURB_JITTER),
                    jitter(rng, config::PERTURB_JITTER),
                );
                kicked = true;
            }

            // Bounce jitter is capped too, not only perturbation, so the speed
            // bound also holds on the frame after a bounce.
            if kicked {
                p.vel = cap_speed(p.vel, max_speed);
            }
            debug_assert!(self.bounds.contains(p.pos));
        }
    }

    pub fn rebuild_edges(&mut self) {
        self.last_candidates =
            self.graph
                .build(&self.particles, self.effective.connect_radius, &mut self.edges);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn effective(&self) -> &EffectiveConfig {
        &self.effective
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn stats(&self) -> FieldStats {
        let mut stats = FieldStats {
            particles: self.particles.len(),
            edges: self.edges.len(),
            candidates_avg: 0.0,
        };
        if !self.particles.is_empty() {
            stats.candidates_avg = self.last_candidates as f32 / self.particles.len() as f32;
        }
        stats
    }

    fn spawn_particles(&mut self) {
        let Bounds { width, height } = self.bounds;
        let half_speed = self.effective.max_speed / 2.0;
        let rng = &mut self.rng;

        self.particles.clear();
        self.edges.clear();
        self.last_candidates = 0;
        self.particles
            .extend((0..self.effective.particle_count).map(|_| Particle {
                pos: Vec2::new(uniform(rng, 0.0, width), uniform(rng, 0.0, height)),
                vel: Vec2::new(
                    uniform(rng, -half_speed, half_speed),
                    uniform(rng, -half_speed, half_speed),
                ),
            }));
        debug!(
            count = self.particles.len(),
            width, height, "spawned particle field"
        );
    }
}

/// Rescales `vel` to `max_speed` when faster, keeping its direction.
pub fn cap_speed(vel: Vec2, max_speed: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max_speed {
        vel * (max_speed / speed)
    } else {
        vel
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    uniform(rng, -amount, amount)
}

// gen_range panics on an empty range; a zero-sized viewport is valid here.
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}
