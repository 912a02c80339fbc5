//! Pollen and sparkles drifting over the bouquet.
//!
//! Ambient spawning starts once the bouquet has finished growing; pointer
//! presses and drags inside the container burst sparkles outward.

use glam::Vec2;
use log::debug;

use super::particle::{Motion, Particle, ParticlePool, Tint};
use super::rng::Rng;
use crate::api::collaborators::Canvas;
use crate::api::config::PollenConfig;
use crate::renderer::{CanvasLayer, SceneBuffer};

const SHRINK: f32 = 0.99;
const GOLD_HUE: f32 = 40.0;
const ROSE_HUE: f32 = 340.0;

pub struct PollenOverlay {
    canvas: Option<Canvas>,
    config: PollenConfig,
    pool: ParticlePool,
    rng: Rng,
    ready: bool,
}

impl PollenOverlay {
    pub fn new(canvas: Option<Canvas>, config: PollenConfig, rng: Rng) -> Self {
        if canvas.is_none() {
            debug!("pollen: no bouquet canvas, overlay disabled");
        }
        let pool = ParticlePool::new(config.max_particles);
        Self {
            canvas,
            config,
            pool,
            rng,
            ready: false,
        }
    }

    /// The bouquet finished growing; ambient pollen and interaction bursts may start.
    pub fn set_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// New container size. Ignored when the overlay has no canvas.
    pub fn resize(&mut self, canvas: Canvas) {
        if self.canvas.is_some() {
            self.canvas = Some(canvas);
        }
    }

    /// A sparkle with the burst defaults: gold or rose, lively, short-lived.
    fn sparkle(&mut self, pos: Vec2) -> Particle {
        let hue = if self.rng.chance(0.5) { GOLD_HUE } else { ROSE_HUE };
        let tint = Tint::new(hue, self.rng.range(60.0, 90.0), 75.0);
        let vel = Vec2::new(self.rng.signed(1.0), -self.rng.range(0.5, 3.0));
        let decay = self.rng.range(0.015, 0.035);
        let radius = self.rng.range(1.5, 4.0);
        let mut p = Particle::new(pos, vel, decay, radius, tint);
        p.alpha = 0.8;
        p
    }

    /// Spawn `count` sparkles at `pos` with random outward velocity.
    pub fn burst(&mut self, pos: Vec2, count: usize) {
        if self.canvas.is_none() {
            return;
        }
        for _ in 0..count {
            let mut p = self.sparkle(pos);
            p.vel = Vec2::new(self.rng.signed(2.0), self.rng.signed(2.0));
            self.pool.push(p);
        }
    }

    /// Pointer pressed inside the container (container-local coordinates).
    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.ready {
            self.burst(pos, self.config.press_burst);
        }
    }

    /// Pointer dragged/hovered inside the container.
    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.ready && self.rng.chance(self.config.drag_burst_chance) {
            self.burst(pos, 1);
        }
    }

    /// Celebration burst from the middle of the overlay.
    pub fn glow(&mut self) {
        if let Some(canvas) = self.canvas {
            let center = Vec2::new(canvas.width / 2.0, canvas.height / 2.0);
            self.burst(center, self.config.glow_burst);
        }
    }

    pub fn step(&mut self) {
        let Some(canvas) = self.canvas else { return };

        if self.ready && self.rng.chance(self.config.spawn_chance) {
            let pos = Vec2::new(
                self.rng.range(0.0, canvas.width),
                canvas.height * 0.2 + self.rng.range(0.0, canvas.height * 0.6),
            );
            let mut p = self.sparkle(pos);
            p.vel = Vec2::new(self.rng.signed(0.25), -self.rng.range(0.2, 1.0));
            p.decay = self.rng.range(0.005, 0.013);
            p.radius = self.rng.range(1.0, 2.5);
            self.pool.push(p);
        }

        self.pool.tick(Motion {
            gravity: self.config.gravity,
            shrink: SHRINK,
        });
    }

    pub fn render(&self, out: &mut SceneBuffer) {
        for p in self.pool.iter() {
            let mut dot = p.to_dot(CanvasLayer::Pollen);
            dot.alpha = p.life * p.alpha;
            out.push_dot(dot);
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
