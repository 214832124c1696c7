use morphix_image::{Grid, GridDtype};
use num_traits::Zero;

use super::element::Member;
use super::ops::MorphologyConfig;
use super::Extremum;
use crate::parallel::for_each_row;

/// Reduce the neighbourhood of every pixel with `op`, visiting `members` in order.
///
/// Flat elements without normalization compare the raw pixel values, so a tie
/// keeps the first member in raster order. Weighted or normalized reductions run
/// in f64 and are converted back with [`GridDtype::from_f64`].
pub(crate) fn morph_masked<T, const C: usize>(
    src: &Grid<T, C>,
    members: &[Member],
    weighted: bool,
    config: &MorphologyConfig,
    op: Extremum,
) -> Grid<T, C>
where
    T: GridDtype + Zero,
{
    let mut dst = src.clone();
    if members.is_empty() || src.is_empty() {
        return dst;
    }

    let (width, height, depth) = (src.width(), src.height(), src.depth());
    let src_data = src.as_slice();
    let border = config.border;
    let normalized = config.normalized;
    let use_f64 = weighted || normalized;

    for_each_row(dst.as_slice_mut(), width * C, config.strategy, |r, row| {
        let (y, z) = (r % height, r / height);

        for x in 0..width {
            let center = src.offset(x, y, z);

            for c in 0..C {
                // `None` marks a member skipped by the normalized mode.
                let fetch = |m: &Member| -> Option<T> {
                    let nx = x as isize + m.offset[0];
                    let ny = y as isize + m.offset[1];
                    let nz = z as isize + m.offset[2];
                    let inside = nx >= 0
                        && ny >= 0
                        && nz >= 0
                        && (nx as usize) < width
                        && (ny as usize) < height
                        && (nz as usize) < depth;
                    if !inside && normalized {
                        return None;
                    }
                    match (
                        border.resolve(nx, width),
                        border.resolve(ny, height),
                        border.resolve(nz, depth),
                    ) {
                        (Some(px), Some(py), Some(pz)) => {
                            Some(src_data[src.offset(px, py, pz) * C + c])
                        }
                        _ => Some(border.fill_value()),
                    }
                };

                let original = src_data[center * C + c];

                row[x * C + c] = if use_f64 {
                    let mut best: Option<f64> = None;
                    let mut measure = 0.0;
                    for m in members {
                        let Some(v) = fetch(m) else { continue };
                        let value = v.to_f64() + op.weight_sign() * m.weight;
                        if best.map_or(true, |b| op.prefers(&value, &b)) {
                            best = Some(value);
                        }
                        measure += if weighted { m.weight } else { 1.0 };
                    }
                    match best {
                        Some(b) if normalized && measure != 0.0 => T::from_f64(b / measure),
                        Some(b) => T::from_f64(b),
                        None => original,
                    }
                } else {
                    let mut best: Option<T> = None;
                    for m in members {
                        let Some(v) = fetch(m) else { continue };
                        if best.map_or(true, |b| op.prefers(&v, &b)) {
                            best = Some(v);
                        }
                    }
                    best.unwrap_or(original)
                };
            }
        }
    });

    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorphologyError;
    use crate::morphology::{BorderPolicy, StructuringElement};
    use crate::parallel::ExecutionStrategy;

    fn config(border: BorderPolicy, normalized: bool) -> MorphologyConfig {
        MorphologyConfig {
            border,
            normalized,
            strategy: ExecutionStrategy::Serial,
        }
    }

    #[test]
    fn test_cross_erosion() -> Result<(), MorphologyError> {
        let src = Grid::<u8, 1>::new([3, 3].into(), vec![5, 3, 7, 6, 2, 8, 9, 4, 1])?;
        let members = StructuringElement::cross(3).members(false);
        let out = morph_masked(
            &src,
            &members,
            false,
            &config(BorderPolicy::ClampToEdge, false),
            Extremum::Min,
        );
        assert_eq!(out.as_slice(), &[3, 2, 3, 2, 2, 1, 4, 1, 1]);

        Ok(())
    }

    #[test]
    fn test_zero_fill_dilation_ignores_fill() -> Result<(), MorphologyError> {
        let src = Grid::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        let members = StructuringElement::flat_square_mask(3).members(false);
        let out = morph_masked(
            &src,
            &members,
            false,
            &config(BorderPolicy::ZeroFill, false),
            Extremum::Max,
        );
        assert_eq!(out.as_slice(), &[4, 4, 4, 4]);

        Ok(())
    }

    #[test]
    fn test_weighted_dilation() -> Result<(), MorphologyError> {
        // weights: left 1, centre 0 (not a member), right 2
        let mask = Grid::<f64, 1>::new([3, 1].into(), vec![1.0, 0.0, 2.0])?;
        let members = StructuringElement::Weighted(mask).members(false);
        let src = Grid::<f32, 1>::new([3, 1].into(), vec![1.0, 5.0, 2.0])?;
        let out = morph_masked(
            &src,
            &members,
            true,
            &config(BorderPolicy::ClampToEdge, false),
            Extremum::Max,
        );
        // x=0: max(src[0] + 1, src[1] + 2) = 7
        // x=1: max(src[0] + 1, src[2] + 2) = 4
        // x=2: max(src[1] + 1, src[2] + 2) = 6
        assert_eq!(out.as_slice(), &[7.0, 4.0, 6.0]);

        Ok(())
    }

    #[test]
    fn test_normalized_erosion_counts_inside_cells() -> Result<(), MorphologyError> {
        let src = Grid::<f64, 1>::from_size_val([3, 1].into(), 6.0)?;
        let members = StructuringElement::flat_rect_mask(3, 1, 1).members(false);
        let out = morph_masked(
            &src,
            &members,
            false,
            &config(BorderPolicy::ZeroFill, true),
            Extremum::Min,
        );
        // borders see two cells, the centre sees three; the zero fill is not used
        assert_eq!(out.as_slice(), &[3.0, 2.0, 3.0]);

        Ok(())
    }

    #[test]
    fn test_normalized_weighted_erosion_divides_by_weights() -> Result<(), MorphologyError> {
        // left member weight 1, right member weight 2
        let mask = Grid::<f64, 1>::new([3, 1].into(), vec![1.0, 0.0, 2.0])?;
        let members = StructuringElement::Weighted(mask).members(false);
        let src = Grid::<f64, 1>::from_size_val([3, 1].into(), 6.0)?;
        let out = morph_masked(
            &src,
            &members,
            true,
            &config(BorderPolicy::ZeroFill, true),
            Extremum::Min,
        );
        // x=0: only the right member is inside, (6 - 2) / 2
        // x=1: min(6 - 1, 6 - 2) / (1 + 2)
        // x=2: only the left member is inside, (6 - 1) / 1
        assert_eq!(out.as_slice(), &[2.0, 4.0 / 3.0, 5.0]);

        Ok(())
    }

    #[test]
    fn test_multichannel_3d() -> Result<(), MorphologyError> {
        let src = Grid::<i32, 2>::from_fn([2, 1, 2].into(), |x, _, z| {
            [(x + 2 * z) as i32, -((x + 2 * z) as i32)]
        });
        let members = StructuringElement::flat_rect_mask(1, 1, 3).members(true);
        let out = morph_masked(
            &src,
            &members,
            false,
            &config(BorderPolicy::ClampToEdge, false),
            Extremum::Min,
        );
        assert_eq!(out.as_slice(), &[0, -2, 1, -3, 0, -2, 1, -3]);

        Ok(())
    }
}
