//! Golden dust trailing the cursor.

use glam::Vec2;
use log::debug;

use super::particle::{Motion, Particle, ParticlePool, Tint};
use super::rng::Rng;
use crate::api::collaborators::Canvas;
use crate::api::config::DustConfig;
use crate::input::hub::{InputSnapshot, Viewport};
use crate::renderer::{CanvasLayer, DotInstance, SceneBuffer};

const UPWARD_BIAS: f32 = -0.2;

pub struct DustTrail {
    canvas: Option<Canvas>,
    config: DustConfig,
    pool: ParticlePool,
    rng: Rng,
    /// Wand tip position, when a pointer is known.
    tip: Option<Vec2>,
}

impl DustTrail {
    /// `canvas` is `None` without a fine pointer or without the trail element.
    pub fn new(canvas: Option<Canvas>, config: DustConfig, rng: Rng) -> Self {
        if canvas.is_none() {
            debug!("dust trail: no canvas or no fine pointer, trail disabled");
        }
        let pool = ParticlePool::new(config.max_particles);
        Self {
            canvas,
            config,
            pool,
            rng,
            tip: None,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(canvas) = &mut self.canvas {
            *canvas = Canvas::new(viewport.width, viewport.height);
        }
    }

    pub fn step(&mut self, input: &InputSnapshot) {
        if self.canvas.is_none() {
            return;
        }
        let pointer = input.pointer;
        self.tip = (input.pointer_seen && pointer.x > 0.0 && pointer.y > 0.0).then_some(pointer);

        if let Some(tip) = self.tip {
            let half = self.config.spread / 2.0;
            for _ in 0..self.config.per_frame {
                let pos = tip + Vec2::new(self.rng.signed(half), self.rng.signed(half));
                let vel = Vec2::new(self.rng.signed(0.4), self.rng.signed(0.4) + UPWARD_BIAS);
                let tint = Tint::new(self.rng.range(35.0, 50.0), 80.0, 90.0);
                let decay = self.rng.range(0.02, 0.05);
                let radius = self.rng.range(0.5, 2.0);
                self.pool.push(Particle::new(pos, vel, decay, radius, tint));
            }
        }

        self.pool.tick(Motion::default());
    }

    pub fn render(&self, out: &mut SceneBuffer) {
        for p in self.pool.iter() {
            // Fades and shrinks with life; white-hot center when fresh.
            let mut dot = p.to_dot(CanvasLayer::Dust);
            dot.radius = p.radius * p.life;
            dot.lightness = 50.0 + p.life * 40.0;
            dot.alpha = p.life;
            out.push_dot(dot);
        }
        if let Some(tip) = self.tip {
            out.push_dot(DotInstance {
                x: tip.x,
                y: tip.y,
                radius: 3.0,
                hue: 51.0,
                saturation: 100.0,
                lightness: 50.0,
                alpha: 0.8,
                layer: CanvasLayer::Dust as u8 as f32,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::hub::InputHub;

    fn trail() -> DustTrail {
        DustTrail::new(Some(Canvas::new(800.0, 600.0)), DustConfig::default(), Rng::new(5))
    }

    #[test]
    fn idle_until_pointer_seen() {
        let mut dust = trail();
        let hub = InputHub::new(Viewport::new(800.0, 600.0, 1.0));
        dust.step(hub.snapshot());
        assert!(dust.is_empty());
    }

    #[test]
    fn spawns_per_frame_near_pointer() {
        let mut dust = trail();
        let mut hub = InputHub::new(Viewport::new(800.0, 600.0, 1.0));
        hub.pointer_moved(100.0, 100.0);
        dust.step(hub.snapshot());
        assert_eq!(dust.len(), 4);
        assert!(dust.pool.iter().all(|p| p.pos.distance(Vec2::new(100.0, 100.0)) < 10.0));
    }

    #[test]
    fn never_exceeds_cap() {
        let mut dust = trail();
        let mut hub = InputHub::new(Viewport::new(800.0, 600.0, 1.0));
        hub.pointer_moved(100.0, 100.0);
        // Longest-lived particles (decay 0.02) would otherwise pile up to 4 × 50.
        let config = DustConfig { per_frame: 20, ..DustConfig::default() };
        dust.config = config;
        for _ in 0..200 {
            dust.step(hub.snapshot());
            assert!(dust.len() <= 250);
        }
        assert_eq!(dust.len(), 250);
    }

    #[test]
    fn no_canvas_no_dust() {
        let mut dust = DustTrail::new(None, DustConfig::default(), Rng::new(5));
        let mut hub = InputHub::default();
        hub.pointer_moved(100.0, 100.0);
        dust.step(hub.snapshot());
        let mut out = SceneBuffer::new();
        dust.render(&mut out);
        assert_eq!(out.dot_count(), 0);
    }

    #[test]
    fn renders_particles_and_wand_tip() {
        let mut dust = trail();
        let mut hub = InputHub::new(Viewport::new(800.0, 600.0, 1.0));
        hub.pointer_moved(100.0, 100.0);
        dust.step(hub.snapshot());
        let mut out = SceneBuffer::new();
        dust.render(&mut out);
        assert_eq!(out.dots_on(CanvasLayer::Dust).count(), 5);
    }
}
