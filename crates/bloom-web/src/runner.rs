use std::cell::RefCell;
use std::rc::Rc;

use bloom_engine::{
    Animation, Canvas, FixedTimestep, InputEvent, InputQueue, Phase, SceneBuffer, Stage,
    StageConfig, StageEvent, Surfaces, Viewport,
};
use log::warn;

use crate::bridge::{HapticsBridge, Outbox, SealBridge, SealFrame};

/// Logical size of the square unlock canvas.
pub const UNLOCK_CANVAS_SIZE: f32 = 200.0;

/// Which page elements exist, as a bit set sent by the host at init.
pub mod surface {
    pub const FIELD: u32 = 1;
    pub const DUST: u32 = 1 << 1;
    pub const UNLOCK: u32 = 1 << 2;
    pub const POLLEN: u32 = 1 << 3;
    pub const SEAL: u32 = 1 << 4;
    pub const HAPTICS: u32 = 1 << 5;
}

/// Host-side description of the page at init.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub viewport: Viewport,
    /// `surface::*` bits.
    pub surfaces: u32,
    /// Bouquet container size in CSS pixels.
    pub pollen: Canvas,
}

/// Drives a [`Stage`] from browser frames.
///
/// Input is queued as it arrives and applied at the start of the next tick;
/// the simulation then runs in fixed steps and the results are flattened into
/// buffers JavaScript reads through raw pointers.
pub struct StageRunner {
    stage: Stage,
    outbox: Rc<Outbox>,
    seal: Option<Rc<RefCell<SealFrame>>>,
    input: InputQueue,
    timestep: FixedTimestep,
    scene: SceneBuffer,
    events: Vec<StageEvent>,
    last_tick_ms: Option<f64>,
}

impl StageRunner {
    /// Parse `config_json` (empty means defaults). An invalid config is logged and replaced by defaults.
    pub fn new(config_json: &str, layout: PageLayout) -> Self {
        let config = if config_json.trim().is_empty() {
            StageConfig::default()
        } else {
            StageConfig::from_json(config_json).unwrap_or_else(|err| {
                warn!("runner: {err}; using the default config");
                StageConfig::default()
            })
        };

        let outbox = Rc::new(Outbox::new());
        let has = |bit: u32| layout.surfaces & bit != 0;
        let full = Canvas::new(layout.viewport.width, layout.viewport.height);

        let (seal_surface, seal) = if has(surface::SEAL) {
            let (bridge, frame) = SealBridge::new(config.hold.ring_circumference);
            (Some(Box::new(bridge) as Box<dyn bloom_engine::SealSurface>), Some(frame))
        } else {
            (None, None)
        };
        let surfaces = Surfaces {
            field: has(surface::FIELD).then_some(full),
            dust: has(surface::DUST).then_some(full),
            unlock: has(surface::UNLOCK).then_some(Canvas::new(UNLOCK_CANVAS_SIZE, UNLOCK_CANVAS_SIZE)),
            pollen: has(surface::POLLEN).then_some(layout.pollen),
            seal: seal_surface,
            haptics: has(surface::HAPTICS)
                .then(|| Box::new(HapticsBridge::new(Rc::clone(&outbox))) as Box<dyn bloom_engine::Haptics>),
        };

        let timestep = FixedTimestep::new(config.step_ms);
        let stage = Stage::new(config, surfaces, outbox.clone(), layout.viewport);

        Self {
            stage,
            outbox,
            seal,
            input: InputQueue::new(),
            timestep,
            scene: SceneBuffer::with_capacity(512, 512),
            events: Vec::with_capacity(32),
            last_tick_ms: None,
        }
    }

    pub fn start(&mut self, now_ms: f64) {
        self.stage.start(now_ms);
        self.last_tick_ms = Some(now_ms);
        self.outbox.drain_into(&mut self.events);
    }

    /// Queue an input event stamped with the host's event time.
    pub fn push_input(&mut self, event: InputEvent, time_ms: f64) {
        self.input.push(event, time_ms);
    }

    /// The host finished playing `kind` (an animation code).
    pub fn animation_complete(&mut self, kind: u32) {
        match Animation::from_code(kind) {
            Some(animation) => {
                self.outbox.complete(animation);
            }
            None => warn!("runner: unknown animation code {kind}"),
        }
    }

    /// Run one display frame at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        let frame_ms = self.last_tick_ms.map_or(0.0, |last| now_ms - last);
        self.last_tick_ms = Some(now_ms);

        for timed in self.input.drain() {
            self.stage.handle_input(timed.event, timed.time_ms);
        }

        let steps = self.timestep.accumulate(frame_ms);
        for _ in 0..steps {
            self.stage.step(now_ms);
        }

        self.stage.render(&mut self.scene);
        self.outbox.drain_into(&mut self.events);
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn scene(&self) -> &SceneBuffer {
        &self.scene
    }

    // ---- Pointer accessors for host reads ----

    pub fn dots_ptr(&self) -> *const f32 {
        self.scene.dot_floats().as_ptr()
    }

    pub fn dot_count(&self) -> u32 {
        self.scene.dot_count() as u32
    }

    pub fn links_ptr(&self) -> *const f32 {
        self.scene.link_floats().as_ptr()
    }

    pub fn link_count(&self) -> u32 {
        self.scene.link_count() as u32
    }

    pub fn events_ptr(&self) -> *const f32 {
        StageEvent::floats(&self.events).as_ptr()
    }

    pub fn event_count(&self) -> u32 {
        self.events.len() as u32
    }

    /// Null when the page has no seal.
    pub fn seal_ptr(&self) -> *const f32 {
        self.seal
            .as_ref()
            .map_or(std::ptr::null(), |frame| frame.as_ptr() as *const f32)
    }
}
