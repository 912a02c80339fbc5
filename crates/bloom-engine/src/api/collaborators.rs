//! Contracts between the stage and the page it drives.
//!
//! Styling, audio, confetti and the counter live on the host side; the stage
//! only asks for them through these traits. Every visual surface is resolved
//! once by the host and handed over as an `Option`. `None` means the element
//! is absent and the component that needs it stays inert.

use super::types::Phase;
use crate::core::task::Completion;

/// Long-running visual transitions the orchestrator waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    UnlockToEnvelope,
    Reveal,
    GrowBouquet,
}

impl Animation {
    pub fn code(self) -> u32 {
        match self {
            Animation::UnlockToEnvelope => 1,
            Animation::Reveal => 2,
            Animation::GrowBouquet => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Animation::UnlockToEnvelope),
            2 => Some(Animation::Reveal),
            3 => Some(Animation::GrowBouquet),
            _ => None,
        }
    }
}

/// Fire-and-forget effects triggered at fixed points of the experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// First user interaction; lets the host start audio under autoplay rules.
    AudioUnlock,
    VerificationScanning,
    VerificationConfirmed,
    EnvelopeOpened,
    StartCounter,
    StartVisualizer,
    AnimateMemoryCards,
    Shimmer,
    AmbientMelody,
    ShowAudioToggle,
    HeartRain,
    SealConfetti,
    DismissQuestion,
    RevealTicket,
    ConfettiRain,
}

impl Cue {
    pub fn code(self) -> u32 {
        match self {
            Cue::AudioUnlock => 1,
            Cue::VerificationScanning => 2,
            Cue::VerificationConfirmed => 3,
            Cue::EnvelopeOpened => 4,
            Cue::StartCounter => 5,
            Cue::StartVisualizer => 6,
            Cue::AnimateMemoryCards => 7,
            Cue::Shimmer => 8,
            Cue::AmbientMelody => 9,
            Cue::ShowAudioToggle => 10,
            Cue::HeartRain => 11,
            Cue::SealConfetti => 12,
            Cue::DismissQuestion => 13,
            Cue::RevealTicket => 14,
            Cue::ConfettiRain => 15,
        }
    }
}

/// The page: plays animations and reacts to cues.
pub trait Presentation {
    /// Start `animation` and call `done.finish()` when it ends.
    /// Dropping `done` without finishing marks the animation abandoned.
    fn play(&self, animation: Animation, done: Completion);

    fn cue(&self, _cue: Cue) {}

    fn phase_changed(&self, _phase: Phase) {}
}

/// Observable state of the seal button and its progress ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SealVisuals {
    /// Progress in [0, 100].
    pub progress: f32,
    /// Ring stroke dash offset (full circumference = empty ring).
    pub dash_offset: f32,
    /// Button scale.
    pub scale: f32,
    /// Horizontal shake offset in px.
    pub jitter: f32,
}

/// Seal button + progress ring.
pub trait SealSurface {
    fn render(&mut self, visuals: &SealVisuals);

    /// Instruction text state changed (holding, released, sealed).
    fn status(&mut self, _status: SealStatus) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealStatus {
    Holding,
    Released,
    Sealed,
}

/// Vibration capability. Absent on most desktops.
pub trait Haptics {
    fn vibrate(&mut self, pattern_ms: &[u32]);
}

/// Logical size of a canvas element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Capability handles resolved once by the host.
#[derive(Default)]
pub struct Surfaces {
    /// Full-viewport magnetic field canvas.
    pub field: Option<Canvas>,
    /// Full-viewport cursor trail canvas (only with a fine pointer).
    pub dust: Option<Canvas>,
    /// Unlock drawing canvas.
    pub unlock: Option<Canvas>,
    /// Pollen canvas over the bouquet container.
    pub pollen: Option<Canvas>,
    pub seal: Option<Box<dyn SealSurface>>,
    pub haptics: Option<Box<dyn Haptics>>,
}

impl std::fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surfaces")
            .field("field", &self.field)
            .field("dust", &self.dust)
            .field("unlock", &self.unlock)
            .field("pollen", &self.pollen)
            .field("seal", &self.seal.is_some())
            .field("haptics", &self.haptics.is_some())
            .finish()
    }
}
