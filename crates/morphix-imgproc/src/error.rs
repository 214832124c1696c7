use morphix_image::{GridError, GridSize};

/// Errors raised by the grid processing operations.
///
/// Every operation validates its inputs before touching any pixel, so an error
/// never leaves a partially written result behind.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MorphologyError {
    /// Error coming from the grid construction.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Two grids that must share a shape do not.
    #[error("Grid size mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// The size of the reference grid.
        expected: GridSize,
        /// The size of the offending grid.
        actual: GridSize,
    },

    /// A companion grid has neither one channel nor the channel count of the source.
    #[error("Channel count mismatch: expected 1 or {expected}, got {actual}")]
    ChannelMismatch {
        /// The channel count of the source grid.
        expected: usize,
        /// The channel count of the offending grid.
        actual: usize,
    },

    /// The metric id is not one of the supported enumeration values.
    #[error("Invalid metric id ({0}), expected 0 (Chebyshev) to 3 (Squared-Euclidean)")]
    InvalidMetric(u32),

    /// The labeling tolerance must be finite and non-negative.
    #[error("Invalid tolerance ({0}), must be finite and non-negative")]
    InvalidTolerance(f64),

    /// The structuring element holds a NaN or infinite cell.
    #[error("Structuring element contains a non-finite value")]
    NonFiniteElement,
}
