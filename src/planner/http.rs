//! HTTP client for the planner service

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{PlanData, PlanRequest, PlanResponse, Planner, PlannerError};
use crate::config::PlannerConfig;

/// Posts plan requests to a running planner service
#[derive(Debug, Clone)]
pub struct HttpPlanner {
    client: reqwest::Client,
    path_url: String,
    status_url: String,
}

impl HttpPlanner {
    pub fn new(config: &PlannerConfig) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let base = config.base_url.trim_end_matches('/');
        Ok(HttpPlanner {
            client,
            path_url: format!("{base}{}", config.path_endpoint),
            status_url: format!("{base}{}", config.status_endpoint),
        })
    }

    pub fn path_url(&self) -> &str {
        &self.path_url
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    #[instrument(skip_all, fields(url = %self.path_url, obstacles = request.obstacles.len()))]
    async fn plan(&self, request: &PlanRequest) -> Result<PlanData, PlannerError> {
        let response = self.client.post(&self.path_url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::Status(status.as_u16()));
        }
        let envelope: PlanResponse = response.json().await?;
        let data = envelope.into_result()?;
        debug!(steps = data.path.len(), commands = data.commands.len(), "plan received");
        Ok(data)
    }

    async fn status(&self) -> Result<(), PlannerError> {
        let response = self.client.get(&self.status_url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PlannerError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_url_and_endpoints() {
        let config = PlannerConfig {
            base_url: "http://192.168.1.10:5000/".to_string(),
            ..PlannerConfig::default()
        };
        let planner = HttpPlanner::new(&config).unwrap();
        assert_eq!(planner.path_url(), "http://192.168.1.10:5000/path");
        assert_eq!(planner.status_url, "http://192.168.1.10:5000/status");
    }
}
