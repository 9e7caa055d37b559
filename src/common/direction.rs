//! Facing directions shared by the robot and obstacle image faces.
//!
//! The wire encoding leaves gaps between the cardinal values (0, 2, 4, 6, 8),
//! so rotating must walk the enumeration, never the raw integer.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::SimulatorError;

/// The direction an obstacle's image or the robot is facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    North,
    East,
    South,
    West,
    Skip,
}

impl Direction {
    /// Every direction in rotation order
    pub const CYCLE: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Skip,
    ];

    /// Wire value used by the planner service
    pub fn code(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 6,
            Direction::Skip => 8,
        }
    }

    /// Decode a wire value
    pub fn from_code(code: u8) -> Result<Self, SimulatorError> {
        match code {
            0 => Ok(Direction::North),
            2 => Ok(Direction::East),
            4 => Ok(Direction::South),
            6 => Ok(Direction::West),
            8 => Ok(Direction::Skip),
            other => Err(SimulatorError::InvalidDirection(other)),
        }
    }

    /// Next direction in the cycle NORTH -> EAST -> SOUTH -> WEST -> SKIP -> NORTH
    pub fn next(self) -> Self {
        let index = Self::CYCLE
            .iter()
            .position(|d| *d == self)
            .unwrap_or_default();
        Self::CYCLE[(index + 1) % Self::CYCLE.len()]
    }

    /// Rendering rotation in degrees, clockwise from north. `Skip` has none.
    pub fn rotation_degrees(self) -> Option<u16> {
        match self {
            Direction::North => Some(0),
            Direction::East => Some(90),
            Direction::South => Some(180),
            Direction::West => Some(270),
            Direction::Skip => None,
        }
    }

    /// Unit offset from the robot's center to its camera cell
    pub fn sensor_offset(self) -> Vector2<i32> {
        match self {
            Direction::East => Vector2::new(1, 0),
            Direction::North => Vector2::new(0, 1),
            Direction::West => Vector2::new(-1, 0),
            Direction::South => Vector2::new(0, -1),
            Direction::Skip => Vector2::new(0, 0),
        }
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::East => "East",
            Direction::South => "South",
            Direction::West => "West",
            Direction::Skip => "Skip",
        }
    }

    /// Parse a name or wire value, as typed by a user
    pub fn parse(input: &str) -> Result<Self, SimulatorError> {
        let trimmed = input.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code);
        }
        Self::CYCLE
            .iter()
            .copied()
            .find(|d| {
                d.label().eq_ignore_ascii_case(trimmed)
                    || d.label()[..1].eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| SimulatorError::UnknownDirection(trimmed.to_string()))
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::North
    }
}

impl TryFrom<u8> for Direction {
    type Error = SimulatorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Direction::from_code(code)
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.code()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
