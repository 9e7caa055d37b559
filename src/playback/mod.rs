//! Step playback over a planned path
//!
//! The controller is a plain state machine. It never sleeps; every
//! transition reports what the owner must do with the single auto-advance
//! timer through [`TimerEffect`].

use serde::Serialize;
use thiserror::Error;

use crate::common::Position;

/// State of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No path loaded
    Idle,
    /// Path loaded and paused at `current_step`
    Ready,
    /// Auto-advancing on the timer
    Playing,
    /// Stepped or dragged by hand; auto-play suspended
    Scrubbing,
}

/// What to do with the auto-advance timer after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    None,
    /// Schedule the next tick, replacing any pending one
    Arm,
    /// Drop the pending tick
    Cancel,
}

/// Errors for transitions that are not allowed in the current state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no path loaded")]
    NoPath,

    #[error("manual stepping is disabled while playing")]
    Playing,

    #[error("already at step {0}")]
    AtBoundary(usize),
}

/// Outcome of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUpdate {
    pub step: Option<usize>,
    /// Scan tag to surface for the step just entered
    pub scan: Option<String>,
    pub timer: TimerEffect,
}

/// The one timer slot the controller may hold
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot {
    armed: bool,
}

impl TimerSlot {
    fn arm(&mut self) -> TimerEffect {
        self.armed = true;
        TimerEffect::Arm
    }

    fn cancel(&mut self) -> TimerEffect {
        if std::mem::take(&mut self.armed) {
            TimerEffect::Cancel
        } else {
            TimerEffect::None
        }
    }

    // The pending tick fired; the slot is free again.
    fn fired(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Walks a loaded path forward on a timer or under manual control
#[derive(Debug, Clone)]
pub struct Playback {
    state: PlaybackState,
    path: Vec<Position>,
    current_step: usize,
    timer: TimerSlot,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    pub fn new() -> Self {
        Playback {
            state: PlaybackState::Idle,
            path: Vec::new(),
            current_step: 0,
            timer: TimerSlot::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current step, `None` while idle
    pub fn current_step(&self) -> Option<usize> {
        (self.state != PlaybackState::Idle).then_some(self.current_step)
    }

    pub fn total_steps(&self) -> usize {
        self.path.len()
    }

    pub fn current_position(&self) -> Option<&Position> {
        self.current_step().and_then(|step| self.path.get(step))
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn timer(&self) -> TimerSlot {
        self.timer
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Load a new path at step 0. An empty path leaves the controller idle.
    pub fn load(&mut self, path: Vec<Position>) -> PlaybackUpdate {
        let timer = self.timer.cancel();
        self.path = path;
        self.current_step = 0;
        self.state = if self.path.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Ready
        };
        PlaybackUpdate {
            step: self.current_step(),
            scan: None,
            timer,
        }
    }

    /// Drop the path and return to idle
    pub fn clear(&mut self) -> TimerEffect {
        self.path.clear();
        self.current_step = 0;
        self.state = PlaybackState::Idle;
        self.timer.cancel()
    }

    /// Start auto-play. At the last step playback restarts from step 0.
    pub fn play(&mut self) -> Result<PlaybackUpdate, PlaybackError> {
        if self.path.is_empty() {
            return Err(PlaybackError::NoPath);
        }
        if self.state == PlaybackState::Playing {
            return Ok(self.update(None, TimerEffect::None));
        }
        if self.current_step + 1 >= self.path.len() {
            self.current_step = 0;
        }
        if self.path.len() == 1 {
            self.state = PlaybackState::Ready;
            return Ok(self.update(None, TimerEffect::None));
        }
        self.state = PlaybackState::Playing;
        let timer = self.timer.arm();
        Ok(self.update(None, timer))
    }

    /// Stop auto-play and keep the current step
    pub fn pause(&mut self) -> PlaybackUpdate {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Ready;
        }
        let timer = self.timer.cancel();
        self.update(None, timer)
    }

    /// The auto-advance timer fired
    ///
    /// Returns `None` for a stale tick (not playing).
    pub fn tick(&mut self) -> Option<PlaybackUpdate> {
        self.timer.fired();
        if self.state != PlaybackState::Playing {
            return None;
        }
        if self.current_step + 1 >= self.path.len() {
            self.state = PlaybackState::Ready;
            return Some(self.update(None, TimerEffect::None));
        }

        self.current_step += 1;
        let timer = if self.current_step + 1 == self.path.len() {
            self.state = PlaybackState::Ready;
            TimerEffect::None
        } else {
            self.timer.arm()
        };
        let scan = self.scan_at(self.current_step);
        Some(self.update(scan, timer))
    }

    /// Manual single step forward
    pub fn step_forward(&mut self) -> Result<PlaybackUpdate, PlaybackError> {
        self.guard_manual()?;
        if self.current_step + 1 >= self.path.len() {
            return Err(PlaybackError::AtBoundary(self.current_step));
        }
        self.current_step += 1;
        Ok(self.enter_scrub())
    }

    /// Manual single step back
    pub fn step_back(&mut self) -> Result<PlaybackUpdate, PlaybackError> {
        self.guard_manual()?;
        if self.current_step == 0 {
            return Err(PlaybackError::AtBoundary(0));
        }
        self.current_step -= 1;
        Ok(self.enter_scrub())
    }

    /// Drag the slider to a step, clamped to the path
    pub fn scrub_to(&mut self, step: usize) -> Result<PlaybackUpdate, PlaybackError> {
        self.guard_manual()?;
        self.current_step = step.min(self.path.len() - 1);
        Ok(self.enter_scrub())
    }

    /// Slider released
    pub fn release(&mut self) -> PlaybackUpdate {
        if self.state == PlaybackState::Scrubbing {
            self.state = PlaybackState::Ready;
        }
        self.update(None, TimerEffect::None)
    }

    fn guard_manual(&self) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::Idle => Err(PlaybackError::NoPath),
            PlaybackState::Playing => Err(PlaybackError::Playing),
            PlaybackState::Ready | PlaybackState::Scrubbing => Ok(()),
        }
    }

    fn enter_scrub(&mut self) -> PlaybackUpdate {
        self.state = PlaybackState::Scrubbing;
        let scan = self.scan_at(self.current_step);
        self.update(scan, TimerEffect::None)
    }

    fn scan_at(&self, step: usize) -> Option<String> {
        self.path
            .get(step)
            .and_then(Position::scan_tag)
            .map(str::to_string)
    }

    fn update(&self, scan: Option<String>, timer: TimerEffect) -> PlaybackUpdate {
        PlaybackUpdate {
            step: self.current_step(),
            scan,
            timer,
        }
    }
}
