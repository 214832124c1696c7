#![deny(missing_docs)]
//! Dense pixel grid types for morphological image processing.

/// pixel grid representation shared by all algorithms.
pub mod grid;

/// Error types for the grid module.
pub mod error;

pub use crate::error::GridError;
pub use crate::grid::{Grid, GridDtype, GridSize};
