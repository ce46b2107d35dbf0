//! Frame scheduler
//!
//! Drives one tick (input, physics, effects, render) per display refresh.
//! The host owns the actual frame callback: it calls [`GameLoop::frame`]
//! from each callback and asks for another one while the returned
//! [`FrameStep`] says so.

use serde::{Deserialize, Serialize};

use crate::renderer::Renderer;
use crate::settings::Settings;
use crate::sim::{self, Effects, FrameState, InputLatch, RoundOutcome};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// No round in progress (never started, or stopped)
    Idle,
    Running,
    Won,
    Lost,
}

/// Opaque id of the host's pending frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// Final numbers of a finished round.
///
/// Only the scheduler builds one, when a tick reaches a terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    /// Round counter of the loop that finished
    pub(crate) round: u64,
    /// `Win` or `LoseGame`
    pub outcome: RoundOutcome,
    pub score: u64,
    pub max_combo: u32,
    pub lives_left: u32,
    pub bricks_left: usize,
    pub ticks: u64,
}

/// What the host should do after a frame callback
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStep {
    /// Tick ran; request another frame
    Continue,
    /// Surface not ready, nothing changed; request another frame
    Skipped,
    /// Loop inactive; do not reschedule
    Halted,
    /// Round just ended; do not reschedule
    Finished(RoundSummary),
}

impl RoundSummary {
    pub fn round(&self) -> u64 {
        self.round
    }
}

impl FrameStep {
    /// Whether the host should request another frame
    pub fn reschedule(&self) -> bool {
        matches!(self, FrameStep::Continue | FrameStep::Skipped)
    }
}

type OutcomeListener = Box<dyn FnMut(&RoundSummary)>;

/// The scheduler: owns the frame state and everything that writes to it
pub struct GameLoop {
    state: FrameState,
    input: InputLatch,
    effects: Effects,
    loop_state: LoopState,
    is_active: bool,
    pending_frame: Option<FrameHandle>,
    on_outcome: Option<OutcomeListener>,
    rounds_started: u64,
}

impl GameLoop {
    /// Idle loop showing a fresh board
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: FrameState::new(),
            input: InputLatch::new(),
            effects: Effects::new(0, settings),
            loop_state: LoopState::Idle,
            is_active: false,
            pending_frame: None,
            on_outcome: None,
            rounds_started: 0,
        }
    }

    /// Read-only view of the frame state
    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn rounds_started(&self) -> u64 {
        self.rounds_started
    }

    /// Held-key latch for the input listener to write into
    pub fn input_mut(&mut self) -> &mut InputLatch {
        &mut self.input
    }

    /// Register the callback run once per terminal outcome
    pub fn set_outcome_listener(&mut self, listener: impl FnMut(&RoundSummary) + 'static) {
        self.on_outcome = Some(Box::new(listener));
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.effects.apply_settings(settings);
    }

    /// Begin a new round.
    ///
    /// Call after the entry fee is confirmed, or directly for free play.
    /// Refused while a round is running.
    pub fn start(&mut self, seed: u64) -> bool {
        if self.loop_state == LoopState::Running {
            log::warn!("Ignoring start: a round is already running");
            return false;
        }

        self.state = FrameState::new();
        self.input.clear();
        self.effects.reseed(seed);
        self.is_active = true;
        self.loop_state = LoopState::Running;
        self.rounds_started += 1;
        log::info!("Round {} started (seed {})", self.rounds_started, seed);
        true
    }

    /// Stop a running round on user request.
    ///
    /// Returns the pending frame callback for the host to cancel.
    pub fn stop(&mut self) -> Option<FrameHandle> {
        if self.loop_state != LoopState::Running {
            log::warn!("Ignoring stop in {:?}", self.loop_state);
            return None;
        }
        self.is_active = false;
        self.loop_state = LoopState::Idle;
        log::info!("Round {} stopped", self.rounds_started);
        self.pending_frame.take()
    }

    /// Record the host's pending frame callback
    pub fn frame_scheduled(&mut self, handle: FrameHandle) {
        self.pending_frame = Some(handle);
    }

    /// Run one frame callback.
    ///
    /// Without a renderer (surface not ready) the tick is skipped untouched
    /// and retried next frame.
    pub fn frame(&mut self, now_ms: f64, renderer: Option<&mut dyn Renderer>) -> FrameStep {
        self.pending_frame = None;
        if !self.is_active {
            return FrameStep::Halted;
        }
        let Some(renderer) = renderer else {
            return FrameStep::Skipped;
        };

        let input = self.input.sample(now_ms);
        let report = sim::tick(&mut self.state, &input);
        self.effects.update(&mut self.state, &report);
        renderer.render(&self.state);
        sim::decay_screen_shake(&mut self.state);

        if !report.outcome.is_terminal() {
            return FrameStep::Continue;
        }

        self.is_active = false;
        self.loop_state = match report.outcome {
            RoundOutcome::Win => LoopState::Won,
            _ => LoopState::Lost,
        };
        let summary = self.summary(report.outcome);
        log::info!(
            "Round {} finished: {:?}, score {}, best combo {}",
            self.rounds_started,
            summary.outcome,
            summary.score,
            summary.max_combo
        );
        if let Some(listener) = self.on_outcome.as_mut() {
            listener(&summary);
        }
        FrameStep::Finished(summary)
    }

    /// Paint the current state without ticking (idle board, resize)
    pub fn redraw(&self, renderer: &mut dyn Renderer) {
        renderer.render(&self.state);
    }

    fn summary(&self, outcome: RoundOutcome) -> RoundSummary {
        RoundSummary {
            round: self.rounds_started,
            outcome,
            score: self.state.score.score,
            max_combo: self.state.score.max_combo,
            lives_left: self.state.score.lives,
            bricks_left: self.state.visible_bricks(),
            ticks: self.state.time_ticks,
        }
    }

    /// Mutable state access for tests that stage scenarios
    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut FrameState {
        &mut self.state
    }
}
