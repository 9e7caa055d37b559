//! Planner service interface
//!
//! The path planner runs out of process. This module defines the wire
//! format and a [`Planner`] trait with two backends: [`HttpPlanner`] for the
//! live service and [`ReplayPlanner`] for a saved response.

pub mod http;
pub mod replay;

pub use self::http::HttpPlanner;
pub use self::replay::ReplayPlanner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::common::{Direction, Obstacle, Position};

/// Errors from a planning round trip
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("planner returned HTTP {0}")]
    Status(u16),

    #[error("planner error: {0}")]
    Service(String),

    #[error("planner response has no data")]
    MissingData,

    #[error("failed to decode planner response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read replay file {path}: {source}")]
    Replay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Body of a planning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub obstacles: Vec<Obstacle>,
    pub retrying: bool,
    pub robot_dir: Direction,
    pub robot_x: i32,
    pub robot_y: i32,
    pub num_runs: u32,
    /// Only some planner builds understand this flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_turn: Option<u8>,
}

/// Payload of a successful plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    pub path: Vec<Position>,
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motions: Option<Vec<String>>,
    /// Path cost
    pub distance: f64,
    /// Planner runtime in seconds
    pub runtime: f64,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub data: Option<PlanData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PlanResponse {
    /// Unwrap the envelope; a non-null `error` is a service failure
    pub fn into_result(self) -> Result<PlanData, PlannerError> {
        if let Some(error) = self.error {
            return Err(PlannerError::Service(error));
        }
        self.data.ok_or(PlannerError::MissingData)
    }
}

/// A path planning backend
#[async_trait]
pub trait Planner: Send + Sync {
    /// Request a plan for the given obstacles and start pose
    async fn plan(&self, request: &PlanRequest) -> Result<PlanData, PlannerError>;

    /// Check that the backend is reachable
    async fn status(&self) -> Result<(), PlannerError>;
}
