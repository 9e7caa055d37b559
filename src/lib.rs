pub mod commands;
pub mod common;
pub mod config;
pub mod grid;
pub mod planner;
pub mod playback;
pub mod runtime;
pub mod scenarios;
pub mod session;

use std::sync::Arc;

use crate::config::{ConfigError, SimulatorConfig};
use crate::grid::GridLayout;
use crate::planner::{HttpPlanner, Planner, PlannerError};
use crate::runtime::{spawn_simulator, SimulatorHandle};
use crate::session::Session;

/// Entry point tying configuration to sessions and planners
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    layout: GridLayout,
}

impl Simulator {
    /// Create a simulator from a validated configuration
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        let layout = GridLayout::from_config(&config.grid)?;
        Ok(Simulator { config, layout })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// A fresh session on the configured grid
    pub fn session(&self) -> Session {
        Session::new(self.layout, self.config.animation_interval())
    }

    /// Client for the configured planner service
    pub fn http_planner(&self) -> Result<HttpPlanner, PlannerError> {
        HttpPlanner::new(&self.config.planner)
    }

    /// Spawn a driver task for a fresh session
    pub fn start(&self, planner: Arc<dyn Planner>) -> SimulatorHandle {
        spawn_simulator(self.session(), planner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn session_uses_configured_grid() {
        let mut config = SimulatorConfig::default();
        let mut params = HashMap::new();
        params.insert("width_cm".to_string(), 150.0);
        config.configure(&params).unwrap();

        let simulator = Simulator::new(config).unwrap();
        assert_eq!(simulator.layout().width, 15);
        assert_eq!(simulator.session().view().grid.rows[0].len(), 15);
    }
}
