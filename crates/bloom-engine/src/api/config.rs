use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Every tunable of the stage, grouped per component.
/// Loaded from JSON by the host; any missing field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// RNG seed shared by all simulations (each derives its own stream).
    pub seed: u64,
    /// Fixed simulation step in milliseconds (default: 1000/60).
    pub step_ms: f64,
    pub gesture: GestureConfig,
    pub hold: HoldConfig,
    pub field: FieldConfig,
    pub dust: DustConfig,
    pub pollen: PollenConfig,
    pub timeline: TimelineConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            step_ms: 1000.0 / 60.0,
            gesture: GestureConfig::default(),
            hold: HoldConfig::default(),
            field: FieldConfig::default(),
            dust: DustConfig::default(),
            pollen: PollenConfig::default(),
            timeline: TimelineConfig::default(),
        }
    }
}

/// Unlock canvas and verification timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Path length that must be exceeded before verification is armed.
    pub threshold: f32,
    /// Quiet period after the last qualifying stroke.
    pub debounce_ms: f64,
    pub scanning_ms: f64,
    pub confirmed_ms: f64,
    pub min_width: f32,
    pub max_width: f32,
    /// Upper bound on sparkles spawned by one pointer move.
    pub max_sparkles: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            threshold: 80.0,
            debounce_ms: 500.0,
            scanning_ms: 1200.0,
            confirmed_ms: 800.0,
            min_width: 1.5,
            max_width: 5.5,
            max_sparkles: 3,
        }
    }
}

/// Press-and-hold seal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    pub duration_ms: f64,
    /// Progress points removed per frame while released.
    pub decay_per_frame: f32,
    /// Progress above which jitter and haptic pulses kick in.
    pub feedback_threshold: f32,
    pub jitter: f32,
    pub haptic_chance: f32,
    pub haptic_pulse_ms: u32,
    /// Length of the progress ring stroke (2πr for r = 45).
    pub ring_circumference: f32,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1500.0,
            decay_per_frame: 5.0,
            feedback_threshold: 80.0,
            jitter: 2.0,
            haptic_chance: 0.3,
            haptic_pulse_ms: 5,
            ring_circumference: 283.0,
        }
    }
}

/// Magnetic background field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub max_particles: usize,
    /// Viewport area (px²) per particle before the cap applies.
    pub area_per_particle: f32,
    pub interaction_radius: f32,
    pub gain: f32,
    pub spring: f32,
    pub damping: f32,
    pub link_distance: f32,
    pub link_opacity: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            max_particles: 80,
            area_per_particle: 12_000.0,
            interaction_radius: 200.0,
            gain: 0.08,
            spring: 0.005,
            damping: 0.92,
            link_distance: 100.0,
            link_opacity: 0.1,
        }
    }
}

/// Cursor dust trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustConfig {
    pub per_frame: usize,
    pub max_particles: usize,
    pub spread: f32,
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            per_frame: 4,
            max_particles: 250,
            spread: 8.0,
        }
    }
}

/// Pollen overlay around the bouquet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollenConfig {
    pub spawn_chance: f32,
    pub max_particles: usize,
    pub press_burst: usize,
    pub drag_burst_chance: f32,
    pub glow_burst: usize,
    pub gravity: f32,
}

impl Default for PollenConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.15,
            max_particles: 400,
            press_burst: 15,
            drag_burst_chance: 0.3,
            glow_burst: 30,
            gravity: 0.02,
        }
    }
}

/// Fixed delays of the phase cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Envelope flap animation before the reveal starts.
    pub open_delay_ms: f64,
    pub bouquet_delay_ms: f64,
    pub heart_rain_delay_ms: f64,
    pub confirmation_delay_ms: f64,
    /// Arms the seal even if the reveal never happens.
    pub confirmation_failsafe_ms: f64,
    /// Opens the envelope by itself after this long in the interactive phase.
    pub auto_open_ms: Option<f64>,
    /// Upper bound on any delegated animation.
    pub animation_timeout_ms: f64,
    pub dismiss_question_ms: f64,
    pub reveal_ticket_ms: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            open_delay_ms: 800.0,
            bouquet_delay_ms: 300.0,
            heart_rain_delay_ms: 500.0,
            confirmation_delay_ms: 1000.0,
            confirmation_failsafe_ms: 2000.0,
            auto_open_ms: None,
            animation_timeout_ms: 10_000.0,
            dismiss_question_ms: 800.0,
            reveal_ticket_ms: 500.0,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "positive",
            value,
        })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "within [0, 1]",
            value,
        })
    }
}

impl StageConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("step_ms", self.step_ms)?;

        let g = &self.gesture;
        positive("gesture.threshold", g.threshold as f64)?;
        positive("gesture.min_width", g.min_width as f64)?;
        if g.max_width < g.min_width {
            return Err(ConfigError::OutOfRange {
                field: "gesture.max_width",
                expected: "at least gesture.min_width",
                value: g.max_width as f64,
            });
        }

        positive("hold.duration_ms", self.hold.duration_ms)?;
        positive("hold.decay_per_frame", self.hold.decay_per_frame as f64)?;
        unit("hold.haptic_chance", self.hold.haptic_chance as f64)?;

        let f = &self.field;
        positive("field.area_per_particle", f.area_per_particle as f64)?;
        positive("field.interaction_radius", f.interaction_radius as f64)?;
        positive("field.link_distance", f.link_distance as f64)?;
        unit("field.damping", f.damping as f64)?;

        unit("pollen.spawn_chance", self.pollen.spawn_chance as f64)?;
        unit("pollen.drag_burst_chance", self.pollen.drag_burst_chance as f64)?;

        positive("timeline.animation_timeout_ms", self.timeline.animation_timeout_ms)?;
        Ok(())
    }
}
