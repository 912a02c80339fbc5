use bytemuck::{Pod, Zeroable};

/// Stages of the experience, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Unlocking,
    EnvelopeTransition,
    EnvelopeInteractive,
    Revealing,
    PostReveal,
    Complete,
}

impl Phase {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Where the host observed an input event.
/// Element-local targets carry coordinates relative to that element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The window itself (global pointer tracking, window-level release).
    Viewport,
    UnlockCanvas,
    ClearButton,
    Envelope,
    EnvelopeSeal,
    Bouquet,
    RoyalSeal,
}

impl Target {
    /// Decode the numeric target id sent by the host.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Target::Viewport,
            1 => Target::UnlockCanvas,
            2 => Target::ClearButton,
            3 => Target::Envelope,
            4 => Target::EnvelopeSeal,
            5 => Target::Bouquet,
            6 => Target::RoyalSeal,
            _ => return None,
        })
    }
}

/// An event communicated from Rust to the host page.
/// `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StageEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl StageEvent {
    pub const FLOATS: usize = 4;

    /// Event kinds for `play` requests.
    pub const PLAY: f32 = 1.0;
    /// Event kinds for fire-and-forget cues.
    pub const CUE: f32 = 2.0;
    /// Phase changed; `a` is the new phase code.
    pub const PHASE: f32 = 3.0;
    /// Vibration request; `a/b/c` hold up to three pattern steps in ms.
    pub const VIBRATE: f32 = 4.0;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }

    /// View a run of events as the flat float array the host reads.
    pub fn floats(events: &[Self]) -> &[f32] {
        bytemuck::cast_slice(events)
    }
}
