//! Shared pointer and viewport state.
//!
//! One hub per stage replaces per-module window listeners: the stage feeds it
//! raw viewport events, every simulation reads the same [`InputSnapshot`].

use glam::Vec2;

/// Window size and device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// Read-only view of pointer and viewport state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    /// Raw pointer position in viewport pixels.
    pub pointer: Vec2,
    /// Pointer position relative to the viewport center, each axis in [-1, 1].
    pub normalized: Vec2,
    pub pressed: bool,
    /// Whether any real pointer position has been published yet.
    pub pointer_seen: bool,
    pub viewport: Viewport,
}

pub type SubscriptionId = u32;

type ResizeListener = Box<dyn FnMut(&Viewport)>;

pub struct InputHub {
    snapshot: InputSnapshot,
    pending_resize: Option<Viewport>,
    listeners: Vec<(SubscriptionId, ResizeListener)>,
    next_id: SubscriptionId,
}

impl InputHub {
    /// A hub with the pointer parked at the viewport center.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            snapshot: InputSnapshot {
                pointer: viewport.center(),
                normalized: Vec2::ZERO,
                pressed: false,
                pointer_seen: false,
                viewport,
            },
            pending_resize: None,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let half = self.snapshot.viewport.center();
        let norm = |v: f32, h: f32| if h > 0.0 { (v - h) / h } else { 0.0 };
        self.snapshot.pointer = Vec2::new(x, y);
        self.snapshot.normalized = Vec2::new(norm(x, half.x), norm(y, half.y));
        self.snapshot.pointer_seen = true;
    }

    pub fn pointer_pressed(&mut self) {
        self.snapshot.pressed = true;
    }

    pub fn pointer_released(&mut self) {
        self.snapshot.pressed = false;
    }

    /// Record a native resize. Bursts are coalesced until the next [`flush_resize`](Self::flush_resize).
    pub fn resized(&mut self, viewport: Viewport) {
        self.pending_resize = Some(viewport);
    }

    /// Apply the latest pending resize, once per frame, and notify subscribers.
    pub fn flush_resize(&mut self) -> Option<Viewport> {
        let viewport = self.pending_resize.take()?;
        self.snapshot.viewport = viewport;
        for (_, listener) in &mut self.listeners {
            listener(&viewport);
        }
        Some(viewport)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Viewport) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }
}

impl Default for InputHub {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}
