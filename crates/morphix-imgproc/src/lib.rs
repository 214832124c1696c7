#![deny(missing_docs)]
//! Morphological image processing on dense 2D and 3D pixel grids.

/// Neighbourhood definitions shared by the region operations.
pub mod connectivity;

/// Exact distance transforms under four metrics.
pub mod distance_transform;

/// Error types for the imgproc module.
pub mod error;

/// Connected-component labeling.
pub mod label;

/// Grayscale erosion, dilation and their compositions.
pub mod morphology;

/// Utility functions for parallel processing.
pub mod parallel;

/// Seeded watershed flooding.
pub mod watershed;

pub use crate::error::MorphologyError;
