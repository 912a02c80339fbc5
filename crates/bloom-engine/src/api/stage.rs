use std::rc::Rc;

use glam::Vec2;
use log::{debug, info};

use super::collaborators::{Canvas, Cue, Presentation, Surfaces};
use super::config::StageConfig;
use super::types::{Phase, Target};
use crate::core::time::Clock;
use crate::input::hub::{InputHub, SubscriptionId, Viewport};
use crate::input::queue::InputEvent;
use crate::renderer::SceneBuffer;
use crate::systems::gesture::{GestureEvent, GestureUnlockDetector};
use crate::systems::hold::HoldConfirmationEngine;
use crate::systems::orchestrator::{OpenTrigger, PhaseOrchestrator};
use crate::systems::particles::{DustTrail, ParticleField, PollenOverlay, Rng};

/// The whole experience: owns every component, routes input and advances time.
pub struct Stage {
    config: StageConfig,
    clock: Clock,
    input: InputHub,
    presentation: Rc<dyn Presentation>,
    orchestrator: PhaseOrchestrator,
    gesture: GestureUnlockDetector,
    hold: HoldConfirmationEngine,
    field: ParticleField,
    dust: DustTrail,
    pollen: PollenOverlay,
}

impl Stage {
    pub fn new(
        config: StageConfig,
        surfaces: Surfaces,
        presentation: Rc<dyn Presentation>,
        viewport: Viewport,
    ) -> Self {
        debug!("stage: {:?}", surfaces);
        let clock = Clock::new(0.0);
        let mut rng = Rng::new(config.seed);
        let orchestrator = PhaseOrchestrator::new(
            clock.clone(),
            config.timeline.clone(),
            Rc::clone(&presentation),
        );

        let on_unlock = orchestrator.handle();
        let gesture = GestureUnlockDetector::new(
            surfaces.unlock,
            config.gesture.clone(),
            rng.fork(1),
            move || on_unlock.unlocked(),
        );
        let on_sealed = orchestrator.handle();
        let hold = HoldConfirmationEngine::new(
            surfaces.seal,
            surfaces.haptics,
            config.hold.clone(),
            rng.fork(2),
            move || on_sealed.sealed(),
        );
        let field = ParticleField::new(surfaces.field, config.field.clone(), rng.fork(3));
        let dust = DustTrail::new(surfaces.dust, config.dust.clone(), rng.fork(4));
        let pollen = PollenOverlay::new(surfaces.pollen, config.pollen.clone(), rng.fork(5));

        Self {
            config,
            clock,
            input: InputHub::new(viewport),
            presentation,
            orchestrator,
            gesture,
            hold,
            field,
            dust,
            pollen,
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.orchestrator.phase()
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Show the unlock screen. Timers count from `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        self.clock.advance_to(now_ms);
        info!("stage: starting at {:.0} ms", now_ms);
        self.orchestrator.start();
        self.settle();
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: f64) {
        self.clock.advance_to(now_ms);
        // Event stamps may trail the last frame; components only see the clock.
        let now_ms = self.clock.now();
        match event {
            InputEvent::PointerDown { target, x, y } => {
                self.orchestrator.first_interaction();
                let pos = Vec2::new(x, y);
                match target {
                    Target::Viewport => {
                        self.input.pointer_moved(x, y);
                        self.input.pointer_pressed();
                    }
                    Target::UnlockCanvas => self.gesture.pointer_down(pos, now_ms),
                    Target::Bouquet => self.pollen.pointer_down(pos),
                    Target::RoyalSeal => self.hold.press(now_ms),
                    _ => {}
                }
            }
            InputEvent::PointerMove { target, x, y } => {
                let pos = Vec2::new(x, y);
                match target {
                    Target::Viewport => self.input.pointer_moved(x, y),
                    Target::UnlockCanvas => self.gesture.pointer_move(pos, now_ms),
                    Target::Bouquet => self.pollen.pointer_move(pos),
                    _ => {}
                }
            }
            InputEvent::PointerUp { target, .. } | InputEvent::PointerCancel { target } => {
                if target == Target::Viewport {
                    self.input.pointer_released();
                }
                if target == Target::UnlockCanvas {
                    self.gesture.pointer_up(now_ms);
                }
                // The seal lets go on a release anywhere.
                self.hold.release();
            }
            InputEvent::PointerLeave { target } => {
                if target == Target::UnlockCanvas {
                    self.gesture.pointer_up(now_ms);
                }
            }
            InputEvent::Click { target } => match target {
                Target::ClearButton => self.gesture.clear(),
                Target::Envelope => self.orchestrator.request_open(OpenTrigger::Envelope),
                Target::EnvelopeSeal => self.orchestrator.request_open(OpenTrigger::Seal),
                Target::RoyalSeal => self.hold.click(),
                _ => {}
            },
            InputEvent::Resize { width, height, dpr } => {
                self.input.resized(Viewport::new(width, height, dpr));
            }
            InputEvent::BouquetResize { width, height } => {
                self.pollen.resize(Canvas::new(width, height));
            }
        }
    }

    /// One fixed simulation step at `now_ms`.
    pub fn step(&mut self, now_ms: f64) {
        self.clock.advance_to(now_ms);
        let now_ms = self.clock.now();
        if let Some(viewport) = self.input.flush_resize() {
            self.field.resize(viewport);
            self.dust.resize(viewport);
        }

        self.gesture.step(now_ms);
        for event in self.gesture.drain_events() {
            match event {
                GestureEvent::Scanning => self.presentation.cue(Cue::VerificationScanning),
                GestureEvent::Confirmed => self.presentation.cue(Cue::VerificationConfirmed),
                // Delivered through the unlock callback.
                GestureEvent::Unlocked => {}
            }
        }
        self.settle();

        self.hold.update(now_ms);
        self.settle();

        let snapshot = *self.input.snapshot();
        self.field.step(snapshot.pointer);
        self.dust.step(&snapshot);
        self.pollen.step();
    }

    /// Run pending routines and apply what they ask of the components.
    fn settle(&mut self) {
        self.orchestrator.poll();
        if self.orchestrator.take_confirmation_request() {
            self.hold.arm();
        }
        if self.orchestrator.take_bouquet_ready() {
            self.pollen.set_ready();
        }
        if self.orchestrator.take_glow_request() {
            self.pollen.glow();
        }
    }

    /// Replace `out` with this frame's dots and links for every canvas.
    pub fn render(&self, out: &mut SceneBuffer) {
        out.clear();
        self.field.render(out);
        self.dust.render(out);
        self.gesture.render(out);
        self.pollen.render(out);
    }

    /// Listen for coalesced viewport changes.
    pub fn subscribe_resize(&mut self, listener: impl FnMut(&Viewport) + 'static) -> SubscriptionId {
        self.input.subscribe(listener)
    }

    pub fn unsubscribe_resize(&mut self, id: SubscriptionId) -> bool {
        self.input.unsubscribe(id)
    }

    pub fn input(&self) -> &InputHub {
        &self.input
    }

    pub fn gesture(&self) -> &GestureUnlockDetector {
        &self.gesture
    }

    pub fn hold(&self) -> &HoldConfirmationEngine {
        &self.hold
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn dust(&self) -> &DustTrail {
        &self.dust
    }

    pub fn pollen(&self) -> &PollenOverlay {
        &self.pollen
    }
}
