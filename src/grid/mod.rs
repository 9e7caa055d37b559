//! Grid geometry for the arena
//!
//! Logical coordinates have their origin at the bottom-left cell. Rendering
//! rows run top-to-bottom, so row 0 is the highest `y`. The conversion lives
//! in [`render_row`] and [`logical_y`] only.

pub mod obstacles;
pub mod renderer;
pub mod svg;

pub use self::obstacles::ObstacleSet;
pub use self::renderer::{render_grid, CellAction, CellKind, GridCell, RenderedGrid};
pub use self::svg::{render_svg, SvgStyle};

use crate::common::Position;
use crate::config::{ConfigError, GridConfig};
use thiserror::Error;

/// Errors raised by grid edits
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({x}, {y}) already holds obstacle {id}")]
    CellOccupied { x: i32, y: i32, id: u32 },

    #[error("obstacle {0} already exists")]
    DuplicateId(u32),

    #[error("no obstacle with id {0}")]
    UnknownObstacle(u32),

    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

/// Cell coordinate in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapPoint {
    pub x: i32,
    pub y: i32,
}

/// Grid bounds and robot footprint, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub width: i32,
    pub height: i32,
    pub robot_width: i32,
    pub robot_height: i32,
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout {
            width: 20,
            height: 20,
            robot_width: 3,
            robot_height: 3,
        }
    }
}

impl GridLayout {
    /// Derive cell counts from the physical configuration
    pub fn from_config(config: &GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let block = config.block_size_cm;
        Ok(GridLayout {
            width: (config.width_cm / block) as i32,
            height: (config.height_cm / block) as i32,
            robot_width: (config.robot_width_cm / block) as i32,
            robot_height: (config.robot_height_cm / block) as i32,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    /// Clamp a user-supplied cell into the grid
    pub fn clamp(&self, x: i32, y: i32) -> MapPoint {
        MapPoint {
            x: x.clamp(0, self.width - 1),
            y: y.clamp(0, self.height - 1),
        }
    }

    /// Reject a cell outside the grid
    pub fn check(&self, x: i32, y: i32) -> Result<MapPoint, GridError> {
        if self.contains(x, y) {
            Ok(MapPoint { x, y })
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Whether a cell lies under the robot's footprint
    pub fn is_robot_cell(&self, pose: &Position, x: i32, y: i32) -> bool {
        let half_w = (self.robot_width - 1) / 2;
        let half_h = (self.robot_height - 1) / 2;
        (pose.x - half_w..=pose.x + half_w).contains(&x)
            && (pose.y - half_h..=pose.y + half_h).contains(&y)
    }

    /// The camera cell, one step from the center along the heading
    pub fn sensor_cell(&self, pose: &Position) -> MapPoint {
        let offset = pose.d.sensor_offset();
        MapPoint {
            x: pose.x + offset.x,
            y: pose.y + offset.y,
        }
    }

    /// Rendering row of a logical `y` on this grid
    pub fn render_row(&self, y: i32) -> usize {
        render_row(self.height, y)
    }

    /// Logical `y` of a rendering row on this grid
    pub fn logical_y(&self, row: usize) -> i32 {
        logical_y(self.height, row)
    }
}

/// Convert a logical `y` to a rendering row (row 0 is the top)
pub fn render_row(height: i32, y: i32) -> usize {
    (height - 1 - y) as usize
}

/// Convert a rendering row back to a logical `y`
pub fn logical_y(height: i32, row: usize) -> i32 {
    height - 1 - row as i32
}
