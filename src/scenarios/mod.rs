//! Named obstacle layouts used to exercise the planner

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::common::{Direction, Obstacle};
use crate::common::Direction::{East, North, South, West};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown scenario '{0}'")]
pub struct UnknownScenario(pub String);

/// A built-in obstacle layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ScenarioId {
    /// Empty grid, editable by hand
    #[default]
    Custom,
    BasicMock,
    BasicUTurn,
    Corners,
    Obstacles7A,
    Obstacles7B,
    ShapeV,
    Obstacles5Basic,
    CollisionCheckA,
    CollisionCheckB,
    CollisionCheckC,
    OfficialMockLayout,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 12] = [
        ScenarioId::Custom,
        ScenarioId::BasicMock,
        ScenarioId::BasicUTurn,
        ScenarioId::Corners,
        ScenarioId::Obstacles7A,
        ScenarioId::Obstacles7B,
        ScenarioId::ShapeV,
        ScenarioId::Obstacles5Basic,
        ScenarioId::CollisionCheckA,
        ScenarioId::CollisionCheckB,
        ScenarioId::CollisionCheckC,
        ScenarioId::OfficialMockLayout,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScenarioId::Custom => "Custom",
            ScenarioId::BasicMock => "Basic Mock",
            ScenarioId::BasicUTurn => "Basic U-Turn",
            ScenarioId::Corners => "Corners",
            ScenarioId::Obstacles7A => "7 Obstacles (A)",
            ScenarioId::Obstacles7B => "7 Obstacles (B)",
            ScenarioId::ShapeV => "V Shape",
            ScenarioId::Obstacles5Basic => "5 Obstacles (Basic)",
            ScenarioId::CollisionCheckA => "Collision Checking (A)",
            ScenarioId::CollisionCheckB => "Collision Checking (B)",
            ScenarioId::CollisionCheckC => "Collision Checking (C)",
            ScenarioId::OfficialMockLayout => "Official Mock Layout",
        }
    }

    /// Whether obstacles may be edited by hand
    pub fn is_editable(self) -> bool {
        self == ScenarioId::Custom
    }

    /// Case-insensitive lookup by display name
    pub fn from_name(name: &str) -> Result<Self, UnknownScenario> {
        let name = name.trim();
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownScenario(name.to_string()))
    }

    /// Obstacles the scenario starts with
    pub fn obstacles(self) -> Vec<Obstacle> {
        let layout: &[(u32, i32, i32, Direction)] = match self {
            ScenarioId::Custom => &[],
            ScenarioId::BasicMock => &[(1, 15, 10, West), (2, 1, 18, South)],
            ScenarioId::BasicUTurn => &[(1, 11, 2, North)],
            ScenarioId::Corners => &[(1, 1, 18, East), (2, 18, 18, South), (3, 18, 1, West)],
            ScenarioId::Obstacles7A => &[
                (1, 1, 10, North),
                (2, 9, 8, West),
                (3, 6, 1, East),
                (4, 1, 18, East),
                (5, 18, 18, South),
                (6, 18, 0, North),
                (7, 12, 17, South),
            ],
            ScenarioId::Obstacles7B => &[
                (1, 0, 17, East),
                (2, 5, 12, South),
                (3, 7, 5, North),
                (4, 15, 2, West),
                (5, 11, 14, East),
                (6, 16, 19, South),
                (7, 19, 9, West),
            ],
            ScenarioId::ShapeV => &[(1, 2, 18, South), (2, 10, 2, North), (3, 18, 18, South)],
            ScenarioId::Obstacles5Basic => &[
                (1, 7, 19, South),
                (2, 6, 2, North),
                (3, 1, 15, South),
                (4, 18, 12, West),
                (5, 18, 6, West),
            ],
            ScenarioId::CollisionCheckA => &[(1, 1, 13, South), (2, 7, 13, West)],
            ScenarioId::CollisionCheckB => &[(1, 10, 15, South), (2, 10, 7, North)],
            ScenarioId::CollisionCheckC => &[(1, 9, 5, West), (2, 9, 9, East), (3, 17, 7, West)],
            ScenarioId::OfficialMockLayout => &[
                (1, 5, 9, South),
                (2, 7, 14, West),
                (3, 12, 9, East),
                (4, 15, 4, West),
                (5, 15, 15, South),
            ],
        };
        layout
            .iter()
            .map(|&(id, x, y, d)| Obstacle::new(id, x, y, d))
            .collect()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::from_name(s)
    }
}
