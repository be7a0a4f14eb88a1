//! Error types for the star reduction pipeline.

use thiserror::Error;

/// Error types for pipeline operations
///
/// Every error is deterministic given the inputs; the pipeline performs no
/// retries and never substitutes default data for a failed stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReductionError {
    /// Zero-sized array passed to statistics or detection
    #[error("empty input in {0}")]
    EmptyInput(&'static str),

    /// A caller-supplied parameter failed validation
    #[error("invalid parameter {name} = {value}: {requirement}")]
    InvalidParameter {
        /// Parameter name as it appears in [`crate::pipeline::ReductionParams`]
        name: &'static str,
        /// The rejected value
        value: f64,
        /// What the parameter must satisfy
        requirement: &'static str,
    },

    /// Arrays disagree in spatial shape
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Stage where the mismatch was detected
        context: &'static str,
        /// Spatial shape (rows, cols) the stage required
        expected: (usize, usize),
        /// Spatial shape it received
        actual: (usize, usize),
    },
}
