//! Common utilities and types for the path simulator
pub mod direction;
pub mod error;
pub mod types;

pub use self::direction::Direction;
pub use self::error::SimulatorError;
pub use self::types::{Obstacle, Position};
