//! The particle primitive shared by every simulation.

use std::collections::VecDeque;

use glam::Vec2;

use crate::renderer::{CanvasLayer, DotInstance};

/// HSL color class of a particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Tint {
    pub const fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self { hue, saturation, lightness }
    }
}

/// Per-tick motion applied by [`Particle::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Added to vertical velocity before integration.
    pub gravity: f32,
    /// Radius multiplier per tick (0 = keep size).
    pub shrink: f32,
}

/// A single simulated point.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rest position. Only the magnetic field pulls particles back to it.
    pub home: Vec2,
    /// Remaining life, 1 → 0.
    pub life: f32,
    /// Life lost per tick. Zero for immortal field particles.
    pub decay: f32,
    pub radius: f32,
    pub alpha: f32,
    pub tint: Tint,
}

impl Particle {
    /// Removal tolerance so `life -= decay` drift can't add an extra tick.
    pub const LIFE_EPSILON: f32 = 1e-5;

    pub fn new(pos: Vec2, vel: Vec2, decay: f32, radius: f32, tint: Tint) -> Self {
        Self {
            pos,
            vel,
            home: pos,
            life: 1.0,
            decay,
            radius,
            alpha: 1.0,
            tint,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life > Self::LIFE_EPSILON
    }

    /// Advance one tick: gravity, integrate, age, shrink. Returns false when expired.
    pub fn tick(&mut self, motion: Motion) -> bool {
        self.vel.y += motion.gravity;
        self.pos += self.vel;
        self.life -= self.decay;
        if motion.shrink > 0.0 {
            self.radius *= motion.shrink;
        }
        self.is_alive()
    }

    pub fn to_dot(&self, layer: CanvasLayer) -> DotInstance {
        DotInstance {
            x: self.pos.x,
            y: self.pos.y,
            radius: self.radius,
            hue: self.tint.hue,
            saturation: self.tint.saturation,
            lightness: self.tint.lightness,
            alpha: self.alpha,
            layer: layer as u8 as f32,
        }
    }
}

/// Bounded live set of short-lived particles. The oldest is evicted first when full.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: VecDeque<Particle>,
    cap: usize,
}

impl ParticlePool {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    pub fn push(&mut self, particle: Particle) {
        if self.cap == 0 {
            return;
        }
        while self.particles.len() >= self.cap {
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
    }

    /// Step every particle once and drop the expired ones.
    pub fn tick(&mut self, motion: Motion) {
        self.particles.retain_mut(|p| p.tick(motion));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLD: Tint = Tint::new(45.0, 100.0, 70.0);

    fn ticks_until_removed(decay: f32) -> u32 {
        let mut pool = ParticlePool::new(8);
        pool.push(Particle::new(Vec2::ZERO, Vec2::ZERO, decay, 1.0, GOLD));
        let mut ticks = 0;
        while !pool.is_empty() {
            pool.tick(Motion::default());
            ticks += 1;
            assert!(ticks < 10_000, "particle never expired");
        }
        ticks
    }

    #[test]
    fn removed_after_ceil_one_over_decay_ticks() {
        let cases = [(0.25_f32, 4), (0.1, 10), (0.03, 34), (0.02, 50), (0.015, 67), (0.007, 143)];
        for (decay, expected) in cases {
            assert_eq!(ticks_until_removed(decay), expected, "decay {decay}");
        }
    }

    #[test]
    fn life_only_decreases() {
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.05, 1.0, GOLD);
        let mut last = p.life;
        while p.tick(Motion::default()) {
            assert!(p.life < last);
            last = p.life;
        }
    }

    #[test]
    fn gravity_bends_trajectory_and_shrink_applies() {
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(1.0, -1.0), 0.0, 2.0, GOLD);
        p.tick(Motion { gravity: 0.5, shrink: 0.5 });
        assert_eq!(p.vel, Vec2::new(1.0, -0.5));
        assert_eq!(p.pos, Vec2::new(1.0, -0.5));
        assert_eq!(p.radius, 1.0);
    }

    #[test]
    fn pool_evicts_oldest_when_full() {
        let mut pool = ParticlePool::new(3);
        for i in 0..5 {
            pool.push(Particle::new(Vec2::new(i as f32, 0.0), Vec2::ZERO, 0.1, 1.0, GOLD));
        }
        assert_eq!(pool.len(), 3);
        let xs: Vec<f32> = pool.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
