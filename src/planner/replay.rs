//! Offline planner that serves a saved response

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::{PlanData, PlanRequest, PlanResponse, Planner, PlannerError};

/// Answers every request with the same recorded response
///
/// Requests are kept so callers can inspect what would have been sent.
#[derive(Debug)]
pub struct ReplayPlanner {
    response: PlanResponse,
    requests: Mutex<Vec<PlanRequest>>,
}

impl ReplayPlanner {
    pub fn new(response: PlanResponse) -> Self {
        ReplayPlanner {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `data` as a successful plan
    pub fn with_data(data: PlanData) -> Self {
        ReplayPlanner::new(PlanResponse {
            data: Some(data),
            error: None,
        })
    }

    /// Fail every request with a service error
    pub fn failing(message: impl Into<String>) -> Self {
        ReplayPlanner::new(PlanResponse {
            data: None,
            error: Some(message.into()),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        Ok(ReplayPlanner::new(serde_json::from_str(json)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PlannerError::Replay {
            path: path.to_path_buf(),
            source,
        })?;
        ReplayPlanner::from_json(&json)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Planner for ReplayPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanData, PlannerError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.response.clone().into_result()
    }

    async fn status(&self) -> Result<(), PlannerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Direction;

    fn request() -> PlanRequest {
        PlanRequest {
            obstacles: Vec::new(),
            retrying: true,
            robot_dir: Direction::East,
            robot_x: 2,
            robot_y: 3,
            num_runs: 2,
            big_turn: None,
        }
    }

    #[tokio::test]
    async fn replays_saved_response_and_records_requests() {
        let planner = ReplayPlanner::from_json(
            r#"{"data":{"path":[{"x":1,"y":1,"d":0}],"commands":["FIN"],"distance":0,"runtime":0.1},"error":null}"#,
        )
        .unwrap();
        let data = planner.plan(&request()).await.unwrap();
        assert_eq!(data.commands, vec!["FIN"]);
        assert_eq!(planner.requests(), vec![request()]);
        assert!(planner.status().await.is_ok());
    }

    #[tokio::test]
    async fn failing_planner_reports_service_error() {
        let planner = ReplayPlanner::failing("timeout");
        assert!(matches!(
            planner.plan(&request()).await,
            Err(PlannerError::Service(message)) if message == "timeout"
        ));
    }

    #[tokio::test]
    async fn keeps_recording_after_a_poisoned_lock() {
        let planner = ReplayPlanner::failing("timeout");
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = planner.requests.lock();
            panic!("poison the request log");
        }));
        assert!(planner.requests.is_poisoned());

        let _ = planner.plan(&request()).await;
        assert_eq!(planner.requests(), vec![request()]);
    }

    #[test]
    fn missing_file_is_a_replay_error() {
        assert!(matches!(
            ReplayPlanner::from_file("/nonexistent/plan.json"),
            Err(PlannerError::Replay { .. })
        ));
    }
}
