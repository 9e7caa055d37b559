//! Read-only snapshot of a session for rendering

use serde::Serialize;

use super::{RunOptions, Session};
use crate::commands::StepAnnotations;
use crate::common::{Obstacle, Position};
use crate::grid::{render_grid, RenderedGrid};
use crate::playback::PlaybackState;

/// Everything a front end needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub scenario: String,
    pub editable: bool,
    pub loading: bool,
    pub state: PlaybackState,
    pub pose: Position,
    pub start: Position,
    pub step: Option<usize>,
    pub total_steps: usize,
    /// Command label for the current step
    pub annotation: Option<String>,
    pub annotations_degraded: bool,
    /// Raw planner commands of the loaded run
    pub commands: Vec<String>,
    pub cost: Option<f64>,
    pub runtime: Option<f64>,
    pub obstacles: Vec<Obstacle>,
    pub options: RunOptions,
    pub grid: RenderedGrid,
}

impl SessionView {
    pub(super) fn new(session: &Session) -> Self {
        let playback = session.playback();
        let step = playback.current_step();
        let run = session.run();
        let annotations = run.map(|r| &r.annotations);
        let pose = session.current_pose().clone();
        let editable = session.edit_enabled();

        SessionView {
            scenario: session.scenario().name().to_string(),
            editable,
            loading: session.is_loading(),
            state: playback.state(),
            grid: render_grid(session.layout(), &pose, session.obstacles(), editable),
            pose,
            start: session.start().clone(),
            step,
            total_steps: playback.total_steps(),
            annotation: step
                .zip(annotations)
                .and_then(|(step, labels)| labels.label(step))
                .filter(|label| !label.is_empty())
                .map(str::to_string),
            annotations_degraded: annotations.is_some_and(StepAnnotations::is_degraded),
            commands: run.map(|r| r.commands.clone()).unwrap_or_default(),
            cost: run.map(|r| r.cost),
            runtime: run.map(|r| r.runtime),
            obstacles: session.obstacles().to_vec(),
            options: session.options().clone(),
        }
    }

    /// One-line status for text front ends
    pub fn status_line(&self) -> String {
        let step = match self.step {
            Some(step) => format!("step {}/{}", step + 1, self.total_steps),
            None => "no path".to_string(),
        };
        let mut line = format!(
            "[{}] {step} at ({}, {}) facing {}",
            self.scenario,
            self.pose.x,
            self.pose.y,
            self.pose.d.label()
        );
        if let (Some(cost), Some(runtime)) = (self.cost, self.runtime) {
            line.push_str(&format!(" | cost {cost:.2} in {runtime:.3}s"));
        }
        if let Some(annotation) = &self.annotation {
            line.push_str(" | ");
            line.push_str(annotation);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Direction;
    use crate::grid::{CellKind, GridLayout};
    use crate::planner::PlanData;
    use crate::session::SessionEvent;
    use std::time::Duration;

    #[test]
    fn idle_view_shows_start_pose_and_editable_grid() {
        let session = Session::new(GridLayout::default(), Duration::from_millis(100));
        let view = session.view();
        assert_eq!(view.scenario, "Custom");
        assert!(view.editable);
        assert_eq!(view.step, None);
        assert_eq!(view.pose, Position::new(1, 1, Direction::North));
        assert_eq!(view.grid.cell(1, 2).unwrap().kind, CellKind::RobotSensor);
        assert_eq!(view.status_line(), "[Custom] no path at (1, 1) facing North");
    }

    #[test]
    fn loaded_view_tracks_step_annotation_and_cost() {
        let mut session = Session::new(GridLayout::default(), Duration::from_millis(100));
        session.apply(SessionEvent::RunRequested).unwrap();
        session
            .apply(SessionEvent::PlanSucceeded(PlanData {
                path: vec![
                    Position::new(1, 1, Direction::North),
                    Position::new(1, 2, Direction::North),
                ],
                commands: vec!["T50|0|10".to_string(), "FIN".to_string()],
                motions: Some(vec!["FORWARD".to_string()]),
                distance: 10.0,
                runtime: 0.25,
            }))
            .unwrap();

        let view = session.view();
        assert_eq!(view.step, Some(0));
        assert_eq!(view.annotation, None);

        session.apply(SessionEvent::StepForward).unwrap();
        let view = session.view();
        assert_eq!(view.pose.y, 2);
        assert_eq!(view.annotation.as_deref(), Some("T50|0|10 (FORWARD)"));
        assert_eq!(view.cost, Some(10.0));
        assert_eq!(
            view.status_line(),
            "[Custom] step 2/2 at (1, 2) facing North | cost 10.00 in 0.250s | T50|0|10 (FORWARD)"
        );
    }
}
