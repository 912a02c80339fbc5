//! Phase sequencing.
//!
//! Each stretch of the experience is one `async` routine over clock sleeps and
//! animation completion signals. Entry points are guarded by [`Latch`]es so
//! that racing triggers (a double click, a failsafe timer) run a routine at
//! most once, and phases only ever move forward.

use std::cell::Cell;
use std::rc::Rc;

use futures_util::future::{join3, select, Either};
use log::{debug, info, warn};

use crate::api::collaborators::{Animation, Cue, Presentation};
use crate::api::config::TimelineConfig;
use crate::api::error::StageError;
use crate::api::types::Phase;
use crate::core::latch::Latch;
use crate::core::task::{completion, Spawner, TaskList};
use crate::core::time::Clock;

/// What asked for the envelope to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTrigger {
    Envelope,
    Seal,
    Failsafe,
}

struct Director {
    phase: Cell<Phase>,
    clock: Clock,
    timeline: TimelineConfig,
    presentation: Rc<dyn Presentation>,
    spawner: Spawner,
    started: Latch,
    unlocked: Latch,
    revealed: Latch,
    audio_unlocked: Latch,
    confirmation_armed: Latch,
    sealed: Latch,
    // Requests for components the stage owns.
    arm_requested: Cell<bool>,
    bouquet_ready: Cell<bool>,
    glow_requested: Cell<bool>,
}

impl Director {
    /// Move to `to` if it lies ahead of the current phase.
    fn advance(&self, to: Phase) -> bool {
        let from = self.phase.get();
        if to <= from {
            debug!("orchestrator: ignoring {:?} -> {:?}", from, to);
            return false;
        }
        info!("orchestrator: {:?} -> {:?}", from, to);
        self.phase.set(to);
        self.presentation.phase_changed(to);
        true
    }

    fn cue(&self, cue: Cue) {
        debug!("orchestrator: cue {:?}", cue);
        self.presentation.cue(cue);
    }

    /// Hand `animation` to the presentation and wait for it, bounded by the timeout.
    async fn played(&self, animation: Animation) -> Result<(), StageError> {
        let (done, signal) = completion();
        self.presentation.play(animation, done);
        let after_ms = self.timeline.animation_timeout_ms;
        match select(signal, self.clock.sleep(after_ms)).await {
            Either::Left((Ok(()), _)) => Ok(()),
            Either::Left((Err(_), _)) => Err(StageError::AnimationAbandoned { animation }),
            Either::Right(_) => Err(StageError::AnimationTimedOut { animation, after_ms }),
        }
    }

    async fn play_through(&self, animation: Animation) {
        if let Err(err) = self.played(animation).await {
            warn!("orchestrator: {err}; continuing");
        }
    }

    fn arm_confirmation(&self, source: &str) {
        if self.confirmation_armed.try_set() {
            info!("orchestrator: confirmation armed by {source}");
            self.arm_requested.set(true);
        } else {
            debug!("orchestrator: confirmation already armed, {source} ignored");
        }
    }

    async fn envelope(self: Rc<Self>) {
        self.advance(Phase::EnvelopeTransition);
        self.play_through(Animation::UnlockToEnvelope).await;
        self.advance(Phase::EnvelopeInteractive);

        if let Some(after_ms) = self.timeline.auto_open_ms {
            self.clock.sleep(after_ms).await;
            Self::open(&self, OpenTrigger::Failsafe);
        }
    }

    fn open(this: &Rc<Self>, trigger: OpenTrigger) {
        if this.phase.get() != Phase::EnvelopeInteractive {
            debug!("orchestrator: {:?} open ignored in {:?}", trigger, this.phase.get());
            return;
        }
        if !this.revealed.try_set() {
            debug!("orchestrator: already revealed, {:?} ignored", trigger);
            return;
        }
        info!("orchestrator: envelope opened by {:?}", trigger);
        this.spawner.spawn(Rc::clone(this).reveal());
    }

    async fn reveal(self: Rc<Self>) {
        self.cue(Cue::EnvelopeOpened);
        self.clock.sleep(self.timeline.open_delay_ms).await;

        self.advance(Phase::Revealing);
        self.play_through(Animation::Reveal).await;
        self.advance(Phase::PostReveal);

        self.cue(Cue::StartCounter);
        self.cue(Cue::StartVisualizer);
        self.cue(Cue::AnimateMemoryCards);
        join3(self.bloom(), self.heart_rain(), self.confirmation()).await;

        self.advance(Phase::Complete);
    }

    async fn bloom(&self) {
        self.clock.sleep(self.timeline.bouquet_delay_ms).await;
        self.cue(Cue::Shimmer);
        self.play_through(Animation::GrowBouquet).await;
        self.bouquet_ready.set(true);
        self.cue(Cue::AmbientMelody);
        self.cue(Cue::ShowAudioToggle);
    }

    async fn heart_rain(&self) {
        self.clock.sleep(self.timeline.heart_rain_delay_ms).await;
        self.cue(Cue::HeartRain);
    }

    async fn confirmation(&self) {
        self.clock.sleep(self.timeline.confirmation_delay_ms).await;
        self.arm_confirmation("reveal");
    }

    async fn failsafe(self: Rc<Self>) {
        self.clock.sleep(self.timeline.confirmation_failsafe_ms).await;
        self.arm_confirmation("failsafe");
    }

    async fn aftermath(self: Rc<Self>) {
        self.clock.sleep(self.timeline.dismiss_question_ms).await;
        self.cue(Cue::DismissQuestion);
        self.clock.sleep(self.timeline.reveal_ticket_ms).await;
        self.cue(Cue::RevealTicket);
        self.cue(Cue::ConfettiRain);
    }
}

/// Cloneable entry points, safe to capture in component callbacks.
#[derive(Clone)]
pub struct OrchestratorHandle {
    director: Rc<Director>,
}

impl OrchestratorHandle {
    pub fn phase(&self) -> Phase {
        self.director.phase.get()
    }

    /// Begin the experience: show the unlock screen and arm the confirmation failsafe.
    pub fn start(&self) {
        let d = &self.director;
        if !d.started.try_set() {
            return;
        }
        d.advance(Phase::Unlocking);
        d.spawner.spawn(Rc::clone(d).failsafe());
    }

    /// The signature was accepted.
    pub fn unlocked(&self) {
        let d = &self.director;
        if !d.unlocked.try_set() {
            debug!("orchestrator: duplicate unlock ignored");
            return;
        }
        d.spawner.spawn(Rc::clone(d).envelope());
    }

    pub fn request_open(&self, trigger: OpenTrigger) {
        Director::open(&self.director, trigger);
    }

    /// Any pointer press. Only the first one matters.
    pub fn first_interaction(&self) {
        if self.director.audio_unlocked.try_set() {
            self.director.cue(Cue::AudioUnlock);
        }
    }

    /// The hold ritual completed.
    pub fn sealed(&self) {
        let d = &self.director;
        if !d.sealed.try_set() {
            return;
        }
        d.cue(Cue::SealConfetti);
        d.glow_requested.set(true);
        d.spawner.spawn(Rc::clone(d).aftermath());
    }
}

pub struct PhaseOrchestrator {
    handle: OrchestratorHandle,
    tasks: TaskList,
}

impl PhaseOrchestrator {
    pub fn new(clock: Clock, timeline: TimelineConfig, presentation: Rc<dyn Presentation>) -> Self {
        let tasks = TaskList::new();
        let director = Director {
            phase: Cell::new(Phase::Idle),
            clock,
            timeline,
            presentation,
            spawner: tasks.spawner(),
            started: Latch::new(),
            unlocked: Latch::new(),
            revealed: Latch::new(),
            audio_unlocked: Latch::new(),
            confirmation_armed: Latch::new(),
            sealed: Latch::new(),
            arm_requested: Cell::new(false),
            bouquet_ready: Cell::new(false),
            glow_requested: Cell::new(false),
        };
        Self {
            handle: OrchestratorHandle {
                director: Rc::new(director),
            },
            tasks,
        }
    }

    pub fn handle(&self) -> OrchestratorHandle {
        self.handle.clone()
    }

    pub fn phase(&self) -> Phase {
        self.handle.phase()
    }

    pub fn start(&self) {
        self.handle.start();
    }

    pub fn request_open(&self, trigger: OpenTrigger) {
        self.handle.request_open(trigger);
    }

    pub fn first_interaction(&self) {
        self.handle.first_interaction();
    }

    /// Run every routine as far as the clock and completions allow.
    pub fn poll(&mut self) {
        self.tasks.run_until_stalled();
    }

    /// Routines still waiting on a timer or an animation.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// True once per confirmation arming.
    pub fn take_confirmation_request(&self) -> bool {
        self.handle.director.arm_requested.replace(false)
    }

    /// True once, when the bouquet has finished growing.
    pub fn take_bouquet_ready(&self) -> bool {
        self.handle.director.bouquet_ready.replace(false)
    }

    /// True once, when the seal celebration wants a pollen glow.
    pub fn take_glow_request(&self) -> bool {
        self.handle.director.glow_requested.replace(false)
    }
}
