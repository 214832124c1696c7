use morphix_image::{Grid, GridDtype};
use num_traits::Zero;

use super::border::BorderPolicy;
use super::element::StructuringElement;
use super::masked::morph_masked;
use super::separable::morph_box;
use super::Extremum;
use crate::error::MorphologyError;
use crate::parallel::ExecutionStrategy;

/// Parameters shared by erosion, dilation and their compositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphologyConfig {
    /// How lookups outside the grid are answered.
    pub border: BorderPolicy,
    /// Divide the result by the amount of element cells inside the grid.
    ///
    /// Out-of-grid cells are skipped instead of going through `border`.
    pub normalized: bool,
    /// Scheduling of the row passes.
    pub strategy: ExecutionStrategy,
}

impl MorphologyConfig {
    /// Build a configuration from the boundary-condition and normalization flags.
    ///
    /// `boundary_conditions = true` replicates the edge values, `false` reads zeros.
    pub fn from_flags(boundary_conditions: bool, normalized: bool) -> Self {
        Self {
            border: boundary_conditions.into(),
            normalized,
            strategy: ExecutionStrategy::default(),
        }
    }

    /// Replace the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

fn morph<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: &MorphologyConfig,
    op: Extremum,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    element.validate()?;

    if let Some(window) = element.box_extent(src.is_3d()) {
        if config.border == BorderPolicy::ClampToEdge && !config.normalized {
            log::debug!("{:?} with box {:?} uses the separable path", op, window);
            return Ok(morph_box(src, window, op, config.strategy)?);
        }
    }

    let mut members = element.members(src.is_3d());
    if op == Extremum::Max {
        // dilation reads the element point-reflected
        members
            .iter_mut()
            .for_each(|m| m.offset = m.offset.map(|o| -o));
    }
    log::debug!(
        "{:?} with {} element cells on {}",
        op,
        members.len(),
        src.size()
    );
    Ok(morph_masked(src, &members, !element.is_flat(), config, op))
}

/// Erode a grid by a structuring element.
///
/// Each output value is the minimum of the input over the element window
/// centred on that pixel. Weighted elements subtract the cell weight before the
/// reduction. An element without any non-zero cell returns a copy of the input.
///
/// # Arguments
///
/// * `src` - The source grid.
/// * `element` - The structuring element.
/// * `config` - Border handling, normalization and scheduling.
///
/// # Returns
///
/// The eroded grid, with the same shape as `src`.
///
/// # Errors
///
/// [`MorphologyError::NonFiniteElement`] if the element holds a NaN or infinite cell.
///
/// # Example
///
/// ```
/// use morphix_image::Grid;
/// use morphix_imgproc::morphology::{erode, MorphologyConfig, StructuringElement};
///
/// let src = Grid::<u8, 1>::new([3, 1].into(), vec![4, 1, 7]).unwrap();
/// let eroded = erode(
///     &src,
///     &StructuringElement::flat_rect_mask(3, 1, 1),
///     MorphologyConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(eroded.as_slice(), &[1, 1, 1]);
/// ```
pub fn erode<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    morph(src, element, &config, Extremum::Min)
}

/// Dilate a grid by a structuring element.
///
/// Each output value is the maximum of the input over the point-reflected
/// element window centred on that pixel, `max_b src(p - b)`. Together with
/// [`erode`] this makes openings and closings idempotent and satisfies
/// `dilate(x, m) == -erode(-x, m.reflected(is_3d))`. Weighted elements add the cell
/// weight before the reduction. An element without any non-zero cell returns a
/// copy of the input.
///
/// # Errors
///
/// [`MorphologyError::NonFiniteElement`] if the element holds a NaN or infinite cell.
pub fn dilate<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    morph(src, element, &config, Extremum::Max)
}

/// Erode a grid by a flat `sx` x `sy` x `sz` box with replicated borders.
///
/// Use `sz = 1` for a planar box. A zero-sized box returns a copy of the input.
pub fn erode_rect<T, const C: usize>(
    src: &Grid<T, C>,
    sx: usize,
    sy: usize,
    sz: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    erode(
        src,
        &StructuringElement::Rect { sx, sy, sz },
        MorphologyConfig::default(),
    )
}

/// Erode a grid by a flat square of side `size`, a cube on 3D grids.
pub fn erode_square<T, const C: usize>(
    src: &Grid<T, C>,
    size: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    erode(
        src,
        &StructuringElement::Square { size },
        MorphologyConfig::default(),
    )
}

/// Dilate a grid by a flat `sx` x `sy` x `sz` box with replicated borders.
///
/// Use `sz = 1` for a planar box. A zero-sized box returns a copy of the input.
pub fn dilate_rect<T, const C: usize>(
    src: &Grid<T, C>,
    sx: usize,
    sy: usize,
    sz: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    dilate(
        src,
        &StructuringElement::Rect { sx, sy, sz },
        MorphologyConfig::default(),
    )
}

/// Dilate a grid by a flat square of side `size`, a cube on 3D grids.
pub fn dilate_square<T, const C: usize>(
    src: &Grid<T, C>,
    size: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    dilate(
        src,
        &StructuringElement::Square { size },
        MorphologyConfig::default(),
    )
}
