//! Simulator session state
//!
//! All state the visualizer needs lives in one [`Session`]. It changes only
//! through [`Session::apply`], which takes a [`SessionEvent`] and returns the
//! side effects the owner must carry out (send a plan request, arm or cancel
//! the playback timer, show a notification). The session never performs I/O
//! itself.

pub mod view;

pub use self::view::SessionView;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::{annotate_steps, StepAnnotations};
use crate::common::{Direction, Position};
use crate::grid::{GridError, GridLayout, ObstacleSet};
use crate::planner::{PlanData, PlanRequest};
use crate::playback::{Playback, PlaybackError, PlaybackUpdate, TimerEffect};
use crate::scenarios::ScenarioId;

/// Errors for events the session refuses
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a plan is running or playback is active")]
    Busy,

    #[error("scenario '{0}' is read-only")]
    ReadOnlyScenario(ScenarioId),

    #[error("no plan request is pending")]
    NoPendingRun,

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Inputs to the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SelectScenario(ScenarioId),
    SetStartPose { x: i32, y: i32, d: Direction },
    /// Add an obstacle on an empty cell or turn the face of an existing one
    CellClicked { x: i32, y: i32 },
    RemoveObstacle(u32),
    ClearObstacles,
    SetRetrying(bool),
    SetNumRuns(u32),
    SetBigTurn(Option<u8>),
    RunRequested,
    PlanSucceeded(PlanData),
    PlanFailed(String),
    Play,
    Pause,
    Tick,
    StepForward,
    StepBack,
    ScrubTo(usize),
    ReleaseScrub,
}

/// One-shot message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "snake_case")]
pub enum Notification {
    Success(String),
    Error(String),
    Warning(String),
    /// An obstacle face was photographed at the current step
    Scan(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(m)
            | Notification::Error(m)
            | Notification::Warning(m)
            | Notification::Scan(m) => m,
        }
    }
}

/// Work the session asks its owner to do
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendPlanRequest(PlanRequest),
    ArmTimer(Duration),
    CancelTimer,
    Notify(Notification),
}

/// Planner flags sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub retrying: bool,
    pub num_runs: u32,
    pub big_turn: Option<u8>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            retrying: false,
            num_runs: 1,
            big_turn: None,
        }
    }
}

/// Everything one planner response produced
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRun {
    pub path: Vec<Position>,
    pub commands: Vec<String>,
    pub motions: Option<Vec<String>>,
    pub annotations: StepAnnotations,
    pub cost: f64,
    pub runtime: f64,
}

impl PlanRun {
    pub fn new(data: PlanData) -> Self {
        let annotations = annotate_steps(&data.commands, data.motions.as_deref());
        PlanRun {
            path: data.path,
            commands: data.commands,
            motions: data.motions,
            annotations,
            cost: data.distance,
            runtime: data.runtime,
        }
    }
}

/// The robot starts here until the user moves it
pub const DEFAULT_START: (i32, i32, Direction) = (1, 1, Direction::North);

/// State of one visualizer session
#[derive(Debug, Clone)]
pub struct Session {
    layout: GridLayout,
    interval: Duration,
    scenario: ScenarioId,
    obstacles: ObstacleSet,
    start: Position,
    options: RunOptions,
    run: Option<PlanRun>,
    playback: Playback,
    loading: bool,
}

impl Session {
    pub fn new(layout: GridLayout, interval: Duration) -> Self {
        let (x, y, d) = DEFAULT_START;
        Session {
            layout,
            interval,
            scenario: ScenarioId::Custom,
            obstacles: ObstacleSet::new(),
            start: Position::new(x, y, d),
            options: RunOptions::default(),
            run: None,
            playback: Playback::new(),
            loading: false,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn scenario(&self) -> ScenarioId {
        self.scenario
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn start(&self) -> &Position {
        &self.start
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn run(&self) -> Option<&PlanRun> {
        self.run.as_ref()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Pose shown on the grid: the playback step, or the start pose
    pub fn current_pose(&self) -> &Position {
        self.playback.current_position().unwrap_or(&self.start)
    }

    /// Whether grid cells accept edits right now
    pub fn edit_enabled(&self) -> bool {
        self.scenario.is_editable() && !self.loading && !self.playback.is_playing()
    }

    /// Request body for the current obstacles and start pose
    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest {
            obstacles: self.obstacles.to_vec(),
            retrying: self.options.retrying,
            robot_dir: self.start.d,
            robot_x: self.start.x,
            robot_y: self.start.y,
            num_runs: self.options.num_runs,
            big_turn: self.options.big_turn,
        }
    }

    /// Apply one event and return the effects it triggers
    pub fn apply(&mut self, event: SessionEvent) -> Result<Vec<Effect>, SessionError> {
        debug!(?event, "session event");
        match event {
            SessionEvent::SelectScenario(id) => self.select_scenario(id),
            SessionEvent::SetStartPose { x, y, d } => {
                self.ensure_idle()?;
                let cell = self.layout.clamp(x, y);
                self.start = Position::new(cell.x, cell.y, d);
                Ok(self.clear_run())
            }
            SessionEvent::CellClicked { x, y } => {
                self.ensure_editable()?;
                let cell = self.layout.check(x, y)?;
                if self.layout.is_robot_cell(self.current_pose(), cell.x, cell.y) {
                    return Ok(Vec::new());
                }
                match self.obstacles.at(cell.x, cell.y).map(|o| o.id) {
                    Some(id) => {
                        self.obstacles.cycle_face(id)?;
                    }
                    None => {
                        self.obstacles.add(&self.layout, cell.x, cell.y)?;
                    }
                }
                Ok(self.clear_run())
            }
            SessionEvent::RemoveObstacle(id) => {
                self.ensure_editable()?;
                self.obstacles.remove(id)?;
                Ok(self.clear_run())
            }
            SessionEvent::ClearObstacles => {
                self.ensure_editable()?;
                self.obstacles.clear();
                Ok(self.clear_run())
            }
            SessionEvent::SetRetrying(retrying) => {
                self.options.retrying = retrying;
                Ok(Vec::new())
            }
            SessionEvent::SetNumRuns(num_runs) => {
                self.options.num_runs = num_runs.max(1);
                Ok(Vec::new())
            }
            SessionEvent::SetBigTurn(big_turn) => {
                self.options.big_turn = big_turn.map(|flag| flag.min(1));
                Ok(Vec::new())
            }
            SessionEvent::RunRequested => {
                self.ensure_idle()?;
                self.loading = true;
                info!(
                    scenario = %self.scenario,
                    obstacles = self.obstacles.len(),
                    "requesting plan"
                );
                Ok(vec![Effect::SendPlanRequest(self.plan_request())])
            }
            SessionEvent::PlanSucceeded(data) => self.plan_succeeded(data),
            SessionEvent::PlanFailed(message) => {
                if !std::mem::take(&mut self.loading) {
                    return Err(SessionError::NoPendingRun);
                }
                warn!(error = %message, "plan request failed");
                Ok(vec![Effect::Notify(Notification::Error(format!(
                    "Failed to run algorithm. Server Error: {message}"
                )))])
            }
            SessionEvent::Play => {
                let update = self.playback.play()?;
                Ok(self.playback_effects(update))
            }
            SessionEvent::Pause => {
                let update = self.playback.pause();
                Ok(self.playback_effects(update))
            }
            SessionEvent::Tick => Ok(self
                .playback
                .tick()
                .map(|update| self.playback_effects(update))
                .unwrap_or_default()),
            SessionEvent::StepForward => {
                let update = self.playback.step_forward()?;
                Ok(self.playback_effects(update))
            }
            SessionEvent::StepBack => {
                let update = self.playback.step_back()?;
                Ok(self.playback_effects(update))
            }
            SessionEvent::ScrubTo(step) => {
                let update = self.playback.scrub_to(step)?;
                Ok(self.playback_effects(update))
            }
            SessionEvent::ReleaseScrub => {
                let update = self.playback.release();
                Ok(self.playback_effects(update))
            }
        }
    }

    /// Snapshot for display
    pub fn view(&self) -> SessionView {
        SessionView::new(self)
    }

    fn select_scenario(&mut self, id: ScenarioId) -> Result<Vec<Effect>, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        let obstacles = ObstacleSet::from_obstacles(&self.layout, id.obstacles())?;
        let effects = self.clear_run();
        self.scenario = id;
        self.obstacles = obstacles;
        info!(scenario = %id, obstacles = self.obstacles.len(), "scenario selected");
        Ok(effects)
    }

    fn plan_succeeded(&mut self, data: PlanData) -> Result<Vec<Effect>, SessionError> {
        if !std::mem::take(&mut self.loading) {
            return Err(SessionError::NoPendingRun);
        }
        let run = PlanRun::new(data);
        let update = self.playback.load(run.path.clone());
        info!(
            steps = run.path.len(),
            cost = run.cost,
            runtime = run.runtime,
            "plan loaded"
        );

        let degraded = run.annotations.is_degraded();
        self.run = Some(run);

        let mut effects = self.playback_effects(update);
        effects.push(Effect::Notify(Notification::Success(
            "Algorithm ran successfully.".to_string(),
        )));
        if degraded {
            effects.push(Effect::Notify(Notification::Warning(
                "Commands and motions do not line up; showing raw commands".to_string(),
            )));
        }
        Ok(effects)
    }

    // Drop the loaded run and stop playback.
    fn clear_run(&mut self) -> Vec<Effect> {
        self.run = None;
        match self.playback.clear() {
            TimerEffect::Cancel => vec![Effect::CancelTimer],
            _ => Vec::new(),
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.loading || self.playback.is_playing() {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if !self.scenario.is_editable() {
            return Err(SessionError::ReadOnlyScenario(self.scenario));
        }
        self.ensure_idle()
    }

    fn playback_effects(&self, update: PlaybackUpdate) -> Vec<Effect> {
        let mut effects = Vec::new();
        match update.timer {
            TimerEffect::Arm => effects.push(Effect::ArmTimer(self.interval)),
            TimerEffect::Cancel => effects.push(Effect::CancelTimer),
            TimerEffect::None => {}
        }
        if let Some(tag) = update.scan {
            effects.push(Effect::Notify(Notification::Scan(format!("Image Scanned! {tag}"))));
        }
        effects
    }
}
