//! Classifies every grid cell for display
//!
//! Rendering is a pure function of the robot pose, the obstacles and the edit
//! flag. Cells that can be edited carry a [`CellAction`] that the caller
//! feeds back into the session; nothing here mutates state.

use serde::Serialize;
use std::fmt::Write;

use super::{render_row, GridLayout, ObstacleSet};
use crate::common::{Direction, Position};

/// What occupies a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellKind {
    RobotBody,
    RobotSensor,
    Obstacle { id: u32, face: Direction },
    Empty,
}

/// Edit triggered by clicking a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CellAction {
    AddObstacle { x: i32, y: i32 },
    CycleFace { id: u32 },
}

/// One rendered cell in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    #[serde(flatten)]
    pub kind: CellKind,
    pub action: Option<CellAction>,
}

/// Cells in rendering order: row 0 is the top of the screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedGrid {
    pub width: i32,
    pub height: i32,
    pub rows: Vec<Vec<GridCell>>,
}

/// Render the grid for a robot pose and obstacle set
pub fn render_grid(
    layout: &GridLayout,
    pose: &Position,
    obstacles: &ObstacleSet,
    edit_enabled: bool,
) -> RenderedGrid {
    let sensor = layout.sensor_cell(pose);
    let mut rows = Vec::with_capacity(layout.height as usize);

    for row in 0..layout.height as usize {
        let y = layout.logical_y(row);
        let mut cells = Vec::with_capacity(layout.width as usize);
        for x in 0..layout.width {
            // Robot is checked first, so it draws over any obstacle it overlaps.
            let (kind, action) = if layout.is_robot_cell(pose, x, y) {
                let kind = if sensor.x == x && sensor.y == y {
                    CellKind::RobotSensor
                } else {
                    CellKind::RobotBody
                };
                (kind, None)
            } else if let Some(obstacle) = obstacles.at(x, y) {
                (
                    CellKind::Obstacle {
                        id: obstacle.id,
                        face: obstacle.d,
                    },
                    edit_enabled.then_some(CellAction::CycleFace { id: obstacle.id }),
                )
            } else {
                (
                    CellKind::Empty,
                    edit_enabled.then_some(CellAction::AddObstacle { x, y }),
                )
            };
            cells.push(GridCell { x, y, kind, action });
        }
        rows.push(cells);
    }

    RenderedGrid {
        width: layout.width,
        height: layout.height,
        rows,
    }
}

impl RenderedGrid {
    /// Cell at a logical coordinate
    pub fn cell(&self, x: i32, y: i32) -> Option<&GridCell> {
        if !(0..self.width).contains(&x) || !(0..self.height).contains(&y) {
            return None;
        }
        self.rows.get(render_row(self.height, y))?.get(x as usize)
    }

    /// Text rendering with axis labels
    ///
    /// `#` robot body, `@` camera, `^ > v <` obstacle faces (`o` for skip),
    /// `.` empty.
    pub fn to_ascii(&self) -> String {
        let label_width = (self.height - 1).max(0).to_string().len();
        let mut out = String::new();
        for row in &self.rows {
            let y = row.first().map_or(0, |c| c.y);
            let _ = write!(out, "{:>width$} ", y, width = label_width);
            for cell in row {
                let glyph = match cell.kind {
                    CellKind::RobotBody => '#',
                    CellKind::RobotSensor => '@',
                    CellKind::Obstacle { face, .. } => match face {
                        Direction::North => '^',
                        Direction::East => '>',
                        Direction::South => 'v',
                        Direction::West => '<',
                        Direction::Skip => 'o',
                    },
                    CellKind::Empty => '.',
                };
                out.push(' ');
                out.push(glyph);
            }
            out.push('\n');
        }
        // Column labels show the last digit to keep cells one character wide.
        let _ = write!(out, "{:>width$} ", "", width = label_width);
        for x in 0..self.width {
            let _ = write!(out, " {}", x % 10);
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Obstacle;

    fn corners() -> ObstacleSet {
        ObstacleSet::from_obstacles(
            &GridLayout::default(),
            [
                Obstacle::new(1, 1, 18, Direction::East),
                Obstacle::new(2, 18, 18, Direction::South),
                Obstacle::new(3, 18, 1, Direction::West),
            ],
        )
        .unwrap()
    }

    #[test]
    fn top_row_is_highest_y() {
        let layout = GridLayout::default();
        let grid = render_grid(&layout, &Position::new(1, 1, Direction::North), &corners(), false);
        assert_eq!(grid.rows.len(), 20);
        assert!(grid.rows[0].iter().all(|c| c.y == 19));
        assert!(grid.rows[19].iter().all(|c| c.y == 0));
        assert_eq!(grid.rows[0][0].x, 0);

        for (x, y) in [(0, 0), (7, 12), (19, 19)] {
            let cell = grid.cell(x, y).unwrap();
            assert_eq!((cell.x, cell.y), (x, y));
        }
        assert!(grid.cell(0, 20).is_none());
    }

    #[test]
    fn classifies_robot_sensor_and_obstacles() {
        let layout = GridLayout::default();
        let pose = Position::new(1, 1, Direction::North);
        let grid = render_grid(&layout, &pose, &corners(), false);

        assert_eq!(grid.cell(1, 2).unwrap().kind, CellKind::RobotSensor);
        assert_eq!(grid.cell(1, 1).unwrap().kind, CellKind::RobotBody);
        assert_eq!(grid.cell(0, 0).unwrap().kind, CellKind::RobotBody);
        assert_eq!(
            grid.cell(18, 18).unwrap().kind,
            CellKind::Obstacle {
                id: 2,
                face: Direction::South
            }
        );
        assert_eq!(grid.cell(5, 5).unwrap().kind, CellKind::Empty);

        let body = grid
            .rows
            .iter()
            .flatten()
            .filter(|c| matches!(c.kind, CellKind::RobotBody | CellKind::RobotSensor))
            .count();
        assert_eq!(body, 9);
    }

    #[test]
    fn robot_draws_over_obstacles() {
        let layout = GridLayout::default();
        let pose = Position::new(18, 2, Direction::South);
        let grid = render_grid(&layout, &pose, &corners(), true);
        assert_eq!(grid.cell(18, 1).unwrap().kind, CellKind::RobotSensor);
        assert_eq!(grid.cell(18, 1).unwrap().action, None);
    }

    #[test]
    fn edit_mode_attaches_actions() {
        let layout = GridLayout::default();
        let pose = Position::new(1, 1, Direction::North);

        let editable = render_grid(&layout, &pose, &corners(), true);
        assert_eq!(
            editable.cell(5, 5).unwrap().action,
            Some(CellAction::AddObstacle { x: 5, y: 5 })
        );
        assert_eq!(
            editable.cell(1, 18).unwrap().action,
            Some(CellAction::CycleFace { id: 1 })
        );

        let locked = render_grid(&layout, &pose, &corners(), false);
        assert!(locked.rows.iter().flatten().all(|c| c.action.is_none()));
    }

    #[test]
    fn ascii_marks_faces_and_labels_axes() {
        let layout = GridLayout::default();
        let grid = render_grid(&layout, &Position::new(1, 1, Direction::East), &corners(), false);
        let text = grid.to_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 21);
        assert!(lines[1].starts_with("18"));
        assert!(lines[1].contains('>'));
        assert!(lines[18].contains('@'));
        assert!(lines[20].trim_start().starts_with("0 1 2"));
    }
}
