//! Error type for the shared data model.

use thiserror::Error;

/// Errors raised while decoding model values
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A direction wire value outside {0, 2, 4, 6, 8}
    #[error("invalid direction code: {0}")]
    InvalidDirection(u8),

    /// A direction name that is not one of the five facings
    #[error("unknown direction: {0}")]
    UnknownDirection(String),
}
