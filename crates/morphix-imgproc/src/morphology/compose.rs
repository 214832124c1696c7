use morphix_image::{Grid, GridDtype};
use num_traits::Zero;

use super::element::StructuringElement;
use super::ops::{dilate, dilate_square, erode, erode_square, MorphologyConfig};
use crate::error::MorphologyError;

/// Opening: erosion followed by dilation with the same element and configuration.
///
/// Removes bright structures smaller than the element.
pub fn mopening<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    let eroded = erode(src, element, config)?;
    dilate(&eroded, element, config)
}

/// Closing: dilation followed by erosion with the same element and configuration.
///
/// Fills dark structures smaller than the element.
pub fn mclosing<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    let dilated = dilate(src, element, config)?;
    erode(&dilated, element, config)
}

/// Opening by a flat square of side `size`.
pub fn mopening_square<T, const C: usize>(
    src: &Grid<T, C>,
    size: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    dilate_square(&erode_square(src, size)?, size)
}

/// Closing by a flat square of side `size`.
pub fn mclosing_square<T, const C: usize>(
    src: &Grid<T, C>,
    size: usize,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    erode_square(&dilate_square(src, size)?, size)
}

fn difference<T: GridDtype, const C: usize>(a: &Grid<T, C>, b: &Grid<T, C>) -> Grid<T, C> {
    let b_data = b.as_slice();
    let mut out = a.clone();
    out.as_slice_mut()
        .iter_mut()
        .zip(b_data)
        .for_each(|(o, &v)| *o = T::from_f64(o.to_f64() - v.to_f64()));
    out
}

/// Morphological gradient: dilation minus erosion.
pub fn gradient<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    let dilated = dilate(src, element, config)?;
    let eroded = erode(src, element, config)?;
    Ok(difference(&dilated, &eroded))
}

/// White top-hat: the input minus its opening.
pub fn top_hat<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    let opened = mopening(src, element, config)?;
    Ok(difference(src, &opened))
}

/// Black top-hat: the closing minus the input.
pub fn black_hat<T, const C: usize>(
    src: &Grid<T, C>,
    element: &StructuringElement,
    config: MorphologyConfig,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
{
    let closed = mclosing(src, element, config)?;
    Ok(difference(&closed, src))
}
