// THEORY:
// The `error` module holds the single error type of the engine. Degenerate but valid
// maps (all zeros, a single lit pixel, saturated density) are never errors: every stage
// has an explicit branch for them. The only things that can fail are a malformed input
// grid, a malformed configuration value, or a worker thread of the parallel pipeline.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The map has no cells at all.
    #[error("invalid input: density map is empty ({width}x{height})")]
    Empty { width: usize, height: usize },

    /// Rows of the input grid do not all have the same length.
    #[error("invalid input: row {row} has {found} cells, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The flat buffer does not match the declared dimensions.
    #[error("invalid input: {len} values cannot fill a {width}x{height} map")]
    DimensionMismatch { width: usize, height: usize, len: usize },

    #[error("invalid input: non-finite value at ({x}, {y})")]
    NonFinite { x: usize, y: usize },

    #[error("invalid input: negative density {value} at ({x}, {y})")]
    Negative { x: usize, y: usize, value: f64 },

    /// Every cell is finite but their total is not.
    #[error("invalid input: total density overflows")]
    SumOverflow,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A blocking worker of the parallel pipeline panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl AnalysisError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for every variant produced by input validation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Empty { .. }
                | Self::NotRectangular { .. }
                | Self::DimensionMismatch { .. }
                | Self::NonFinite { .. }
                | Self::Negative { .. }
                | Self::SumOverflow
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
