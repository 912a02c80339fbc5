//! Particle simulations: the magnetic field, the cursor dust trail and the pollen overlay.
//!
//! All three share [`Particle`] and, for short-lived particles, [`ParticlePool`].

mod dust;
mod field;
mod particle;
mod pollen;
mod rng;

pub use dust::DustTrail;
pub use field::ParticleField;
pub use particle::{Motion, Particle, ParticlePool, Tint};
pub use pollen::PollenOverlay;
pub use rng::Rng;
