//! Magnetic particle field behind the envelope.
//!
//! Each particle is pulled toward the pointer while inside the interaction
//! radius, always sprung back to its home, and damped every tick. Close pairs
//! are joined by faint links whose opacity falls off linearly with distance.

use glam::Vec2;
use log::debug;

use super::particle::{Particle, Tint};
use super::rng::Rng;
use crate::api::collaborators::Canvas;
use crate::api::config::FieldConfig;
use crate::input::hub::Viewport;
use crate::renderer::{CanvasLayer, LinkInstance, SceneBuffer};

/// Scales the attraction so the gain constant stays in a readable range.
const ATTRACTION_SCALE: f32 = 0.01;
const LINK_WIDTH: f32 = 0.5;
const LINK_HUE: f32 = 340.0;

pub struct ParticleField {
    canvas: Option<Canvas>,
    config: FieldConfig,
    particles: Vec<Particle>,
    rng: Rng,
}

impl ParticleField {
    /// An absent canvas yields an inert field.
    pub fn new(canvas: Option<Canvas>, config: FieldConfig, rng: Rng) -> Self {
        let mut field = Self {
            canvas,
            config,
            particles: Vec::new(),
            rng,
        };
        match field.canvas {
            Some(_) => field.seed(),
            None => debug!("particle field: no canvas, staying inert"),
        }
        field
    }

    pub fn is_active(&self) -> bool {
        self.canvas.is_some()
    }

    /// Density-scaled particle count, capped.
    pub fn capacity_for(config: &FieldConfig, canvas: Canvas) -> usize {
        let by_area = (canvas.width * canvas.height / config.area_per_particle).floor();
        (by_area.max(0.0) as usize).min(config.max_particles)
    }

    fn seed(&mut self) {
        let Some(canvas) = self.canvas else { return };
        let count = Self::capacity_for(&self.config, canvas);
        self.particles.clear();
        for _ in 0..count {
            let home = Vec2::new(
                self.rng.range(0.0, canvas.width),
                self.rng.range(0.0, canvas.height),
            );
            let tint = Tint::new(self.rng.range(330.0, 350.0), 70.0, 70.0);
            let mut p = Particle::new(home, Vec2::ZERO, 0.0, self.rng.range(1.0, 2.5), tint);
            p.alpha = self.rng.range(0.3, 0.7);
            self.particles.push(p);
        }
        debug!("particle field: seeded {} particles", count);
    }

    /// Match the viewport and redistribute homes.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.canvas.is_none() {
            return;
        }
        self.canvas = Some(Canvas::new(viewport.width, viewport.height));
        self.seed();
    }

    /// One simulation tick toward the pointer `target`.
    pub fn step(&mut self, target: Vec2) {
        let radius = self.config.interaction_radius;
        for p in &mut self.particles {
            let delta = target - p.pos;
            let dist = delta.length();
            if dist < radius {
                let force = (1.0 - dist / radius) * self.config.gain;
                p.vel += delta * force * ATTRACTION_SCALE;
            }
            p.vel += (p.home - p.pos) * self.config.spring;
            p.vel *= self.config.damping;
            p.pos += p.vel;
        }
    }

    /// Dots plus O(n²) proximity links.
    pub fn render(&self, out: &mut SceneBuffer) {
        let max = self.config.link_distance;
        for (i, p) in self.particles.iter().enumerate() {
            out.push_dot(p.to_dot(CanvasLayer::Field));
            for q in &self.particles[i + 1..] {
                let dist = p.pos.distance(q.pos);
                if dist < max {
                    out.push_link(LinkInstance {
                        x1: p.pos.x,
                        y1: p.pos.y,
                        x2: q.pos.x,
                        y2: q.pos.y,
                        width: LINK_WIDTH,
                        hue: LINK_HUE,
                        alpha: self.config.link_opacity * (1.0 - dist / max),
                        layer: CanvasLayer::Field as u8 as f32,
                    });
                }
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(particles: Vec<Particle>) -> ParticleField {
        ParticleField {
            canvas: Some(Canvas::new(1000.0, 1000.0)),
            config: FieldConfig::default(),
            particles,
            rng: Rng::new(1),
        }
    }

    fn at(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, 0.0, 1.0, Tint::new(340.0, 70.0, 70.0))
    }

    #[test]
    fn count_scales_with_area_and_caps() {
        let config = FieldConfig::default();
        assert_eq!(ParticleField::capacity_for(&config, Canvas::new(800.0, 600.0)), 40);
        assert_eq!(ParticleField::capacity_for(&config, Canvas::new(1920.0, 1080.0)), 80);
        assert_eq!(ParticleField::capacity_for(&config, Canvas::new(0.0, 0.0)), 0);

        let field = ParticleField::new(Some(Canvas::new(800.0, 600.0)), config, Rng::new(3));
        assert_eq!(field.particles().len(), 40);
        assert!(field
            .particles()
            .iter()
            .all(|p| (0.0..800.0).contains(&p.home.x) && (0.0..600.0).contains(&p.home.y)));
    }

    #[test]
    fn absent_canvas_is_inert() {
        let mut field = ParticleField::new(None, FieldConfig::default(), Rng::new(3));
        field.step(Vec2::new(10.0, 10.0));
        field.resize(Viewport::new(800.0, 600.0, 1.0));
        let mut out = SceneBuffer::new();
        field.render(&mut out);
        assert!(!field.is_active());
        assert_eq!(out.dot_count(), 0);
    }

    #[test]
    fn resize_reseeds_for_new_area() {
        let mut field = ParticleField::new(Some(Canvas::new(800.0, 600.0)), FieldConfig::default(), Rng::new(3));
        field.resize(Viewport::new(400.0, 300.0, 2.0));
        assert_eq!(field.particles().len(), 10);
    }

    #[test]
    fn pointer_inside_radius_attracts() {
        let mut field = field_with(vec![at(500.0, 500.0)]);
        field.step(Vec2::new(600.0, 500.0));
        let p = &field.particles()[0];
        assert!(p.pos.x > 500.0, "particle should move toward the pointer");
        assert_eq!(p.pos.y, 500.0);
    }

    #[test]
    fn pointer_outside_radius_has_no_pull() {
        let mut field = field_with(vec![at(500.0, 500.0)]);
        field.step(Vec2::new(900.0, 500.0));
        assert_eq!(field.particles()[0].pos, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn displaced_particle_settles_home_when_pointer_is_far() {
        let mut p = at(500.0, 500.0);
        p.pos = Vec2::new(550.0, 500.0);
        let mut field = field_with(vec![p]);
        let far = Vec2::new(-5_000.0, -5_000.0);

        // The spring is slightly underdamped: track the peak displacement per second.
        let mut peaks = Vec::new();
        for _ in 0..4 {
            let mut peak = 0.0_f32;
            for _ in 0..60 {
                field.step(far);
                let p = &field.particles()[0];
                peak = peak.max(p.pos.distance(p.home));
            }
            peaks.push(peak);
        }
        assert!(peaks[0] <= 50.0);
        for pair in peaks.windows(2) {
            assert!(pair[1] < pair[0], "peaks should shrink: {peaks:?}");
        }
        let p = &field.particles()[0];
        assert!(p.pos.distance(p.home) < 0.1);
    }

    #[test]
    fn links_fade_with_distance() {
        let field = field_with(vec![at(0.0, 0.0), at(50.0, 0.0), at(300.0, 0.0)]);
        let mut out = SceneBuffer::new();
        field.render(&mut out);
        assert_eq!(out.dot_count(), 3);
        assert_eq!(out.link_count(), 1);
        let link = out.links[0];
        assert!((link.alpha - 0.05).abs() < 1e-6);
        assert_eq!(link.width, 0.5);
    }
}
