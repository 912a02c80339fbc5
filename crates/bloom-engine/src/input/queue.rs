use crate::api::types::Target;

/// Input event types the stage understands.
/// Coordinates are relative to `target` (viewport coordinates for `Target::Viewport`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { target: Target, x: f32, y: f32 },
    PointerMove { target: Target, x: f32, y: f32 },
    PointerUp { target: Target, x: f32, y: f32 },
    /// The pointer left the element mid-gesture.
    PointerLeave { target: Target },
    PointerCancel { target: Target },
    /// A completed click/tap on an element.
    Click { target: Target },
    /// The window was resized.
    Resize { width: f32, height: f32, dpr: f32 },
    /// The bouquet container changed size (CSS pixels).
    BouquetResize { width: f32, height: f32 },
}

/// An input event stamped with the host's event time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedInput {
    pub event: InputEvent,
    pub time_ms: f64,
}

/// A queue of input events.
/// JS writes events into the queue; Rust drains them at the start of each frame.
pub struct InputQueue {
    events: Vec<TimedInput>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent, time_ms: f64) {
        self.events.push(TimedInput { event, time_ms });
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&mut self) -> Vec<TimedInput> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
