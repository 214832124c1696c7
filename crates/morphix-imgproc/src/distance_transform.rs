use morphix_image::{Grid, GridDtype, GridSize};

use crate::error::MorphologyError;
use crate::parallel::{map_lines, ExecutionStrategy};

/// Distance function between two grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// Largest absolute offset over the axes.
    Chebyshev = 0,
    /// Sum of the absolute offsets.
    Manhattan = 1,
    /// Square root of the sum of squared offsets.
    #[default]
    Euclidean = 2,
    /// Sum of squared offsets, without the square root.
    SquaredEuclidean = 3,
}

impl TryFrom<u32> for Metric {
    type Error = MorphologyError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Metric::Chebyshev),
            1 => Ok(Metric::Manhattan),
            2 => Ok(Metric::Euclidean),
            3 => Ok(Metric::SquaredEuclidean),
            _ => Err(MorphologyError::InvalidMetric(id)),
        }
    }
}

impl Metric {
    // The squared metrics carry squared distances through the passes.
    fn is_squared(&self) -> bool {
        matches!(self, Metric::Euclidean | Metric::SquaredEuclidean)
    }

    /// Cost of reaching `x` from column `i` whose partial distance is `g`.
    #[inline]
    fn f(&self, x: i64, i: i64, g: i64) -> i64 {
        match self {
            Metric::Chebyshev => (x - i).abs().max(g),
            Metric::Manhattan => (x - i).abs() + g,
            Metric::Euclidean | Metric::SquaredEuclidean => (x - i) * (x - i) + g,
        }
    }

    /// First position where column `u` is at least as close as column `i < u`.
    #[inline]
    fn sep(&self, i: i64, u: i64, gi: i64, gu: i64) -> i64 {
        const FAR: i64 = i64::MAX / 4;
        match self {
            Metric::Chebyshev => {
                if gi <= gu {
                    (i + gu).max((i + u) / 2)
                } else {
                    (u - gi).min((i + u) / 2)
                }
            }
            Metric::Manhattan => {
                if gu >= gi + u - i {
                    FAR
                } else if gi > gu + u - i {
                    -FAR
                } else {
                    (gu - gi + u + i) / 2
                }
            }
            Metric::Euclidean | Metric::SquaredEuclidean => {
                (u * u - i * i + gu - gi).div_euclid(2 * (u - i))
            }
        }
    }
}

/// Exact distance transform in linear time.
///
/// Computes for every cell the distance to the nearest feature cell under the
/// configured [`Metric`]. The first pass scans each row for the nearest feature
/// along x; every further axis folds the partial distances through a lower
/// envelope of per-column distance functions. Each pass is independent across
/// lines and follows the execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceTransform {
    /// Distance function.
    pub metric: Metric,
    /// Scheduling of the line passes.
    pub strategy: ExecutionStrategy,
}

impl DistanceTransform {
    /// Create an executor for `metric` with the default strategy.
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            strategy: ExecutionStrategy::default(),
        }
    }

    /// Replace the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sentinel larger than any reachable partial distance on a grid of `size`.
    fn infinity(&self, size: GridSize) -> i64 {
        let n = (size.width + size.height + size.depth) as i64 + 1;
        if self.metric.is_squared() {
            4 * n * n
        } else {
            4 * n
        }
    }

    /// Run the transform on every channel of `src`, with `value` marking the
    /// feature cells.
    ///
    /// Feature cells get exactly 0. A channel without any feature cell is
    /// [`f64::INFINITY`] everywhere.
    pub fn execute<T: GridDtype, const C: usize>(
        &self,
        src: &Grid<T, C>,
        value: T,
    ) -> Result<Grid<f64, C>, MorphologyError> {
        let size = src.size();
        let inf = self.infinity(size);
        let metric = self.metric;
        let squared = metric.is_squared();

        let features = src.as_slice().iter().map(|&v| v == value).collect::<Vec<_>>();

        log::debug!("{:?} distance transform on {}", metric, size);

        let mut partial = map_lines(&features, size, C, 0, self.strategy, |line, out| {
            nearest_along_line(line, out, squared, inf)
        });

        for axis in 1..3 {
            let m = size.extent(axis);
            if m <= 1 {
                continue;
            }
            log::trace!("lower envelope pass along axis {}", axis);
            partial = map_lines(&partial, size, C, axis, self.strategy, |line, out| {
                lower_envelope(line, out, metric, inf)
            });
        }

        let data = partial
            .into_iter()
            .map(|d| {
                if d >= inf {
                    f64::INFINITY
                } else if metric == Metric::Euclidean {
                    (d as f64).sqrt()
                } else {
                    d as f64
                }
            })
            .collect();

        Ok(Grid::new(size, data)?)
    }
}

/// Distance to the nearest feature within one line, squared when `squared`.
fn nearest_along_line(line: &[bool], out: &mut [i64], squared: bool, inf: i64) {
    let mut last = None;
    for (i, (&is_feature, o)) in line.iter().zip(out.iter_mut()).enumerate() {
        if is_feature {
            last = Some(i);
        }
        *o = last.map_or(inf, |l| (i - l) as i64);
    }

    let mut next = None;
    for (i, (&is_feature, o)) in line.iter().zip(out.iter_mut()).enumerate().rev() {
        if is_feature {
            next = Some(i);
        }
        if let Some(n) = next {
            *o = (*o).min((n - i) as i64);
        }
        if *o < inf && squared {
            *o *= *o;
        }
    }
}

/// Fold the partial distances `g` of one line along a new axis.
fn lower_envelope(g: &[i64], out: &mut [i64], metric: Metric, inf: i64) {
    let m = g.len() as i64;
    // s: columns on the envelope, t: position where each starts to win
    let mut s = vec![0i64; g.len()];
    let mut t = vec![0i64; g.len()];
    let mut q = 0usize;

    for u in 1..m {
        let gu = g[u as usize];
        loop {
            let sq = s[q];
            if metric.f(t[q], sq, g[sq as usize]) <= metric.f(t[q], u, gu) {
                break;
            }
            if q == 0 {
                break;
            }
            q -= 1;
        }

        let sq = s[q];
        if q == 0 && metric.f(t[0], sq, g[sq as usize]) > metric.f(t[0], u, gu) {
            s[0] = u;
        } else {
            let w = 1 + metric.sep(sq, u, g[sq as usize], gu);
            if w < m {
                q += 1;
                s[q] = u;
                t[q] = w;
            }
        }
    }

    for u in (0..m).rev() {
        let sq = s[q];
        out[u as usize] = metric.f(u, sq, g[sq as usize]).min(inf);
        if q > 0 && u == t[q] {
            q -= 1;
        }
    }
}

/// Distance from every cell to the nearest cell equal to `value`.
///
/// # Arguments
///
/// * `src` - The input grid, processed channel by channel.
/// * `value` - The value marking the feature cells.
/// * `metric` - The distance function.
///
/// # Returns
///
/// A grid of the same shape holding the distances. Euclidean distances are the
/// square root of an exact integer; the other metrics are exact integers.
///
/// # Example
///
/// ```
/// use morphix_image::Grid;
/// use morphix_imgproc::distance_transform::{distance_transform, Metric};
///
/// let src = Grid::<u8, 1>::new([4, 1].into(), vec![0, 1, 1, 1]).unwrap();
/// let dist = distance_transform(&src, 0, Metric::Manhattan).unwrap();
///
/// assert_eq!(dist.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
/// ```
pub fn distance_transform<T: GridDtype, const C: usize>(
    src: &Grid<T, C>,
    value: T,
    metric: Metric,
) -> Result<Grid<f64, C>, MorphologyError> {
    DistanceTransform::new(metric).execute(src, value)
}

/// Same as [`distance_transform`] with the metric given by its numeric id.
///
/// # Errors
///
/// [`MorphologyError::InvalidMetric`] if `metric_id` is not in `0..=3`.
pub fn distance_transform_with_id<T: GridDtype, const C: usize>(
    src: &Grid<T, C>,
    value: T,
    metric_id: u32,
) -> Result<Grid<f64, C>, MorphologyError> {
    let metric = Metric::try_from(metric_id)?;
    distance_transform(src, value, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_force<T: GridDtype>(src: &Grid<T, 1>, value: T, metric: Metric) -> Vec<f64> {
        let features = (0..src.num_pixels())
            .filter(|&i| src.as_slice()[i] == value)
            .map(|i| src.coords(i))
            .collect::<Vec<_>>();
        (0..src.num_pixels())
            .map(|i| {
                let (x, y, z) = src.coords(i);
                features
                    .iter()
                    .map(|&(fx, fy, fz)| {
                        let d = [
                            x.abs_diff(fx) as f64,
                            y.abs_diff(fy) as f64,
                            z.abs_diff(fz) as f64,
                        ];
                        match metric {
                            Metric::Chebyshev => d[0].max(d[1]).max(d[2]),
                            Metric::Manhattan => d[0] + d[1] + d[2],
                            Metric::Euclidean => d.iter().map(|v| v * v).sum::<f64>().sqrt(),
                            Metric::SquaredEuclidean => d.iter().map(|v| v * v).sum(),
                        }
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }

    fn single_feature() -> Grid<u8, 1> {
        Grid::from_fn([7, 5].into(), |x, y, _| [u8::from(x != 0 || y != 0)])
    }

    #[test]
    fn test_single_feature_euclidean() -> Result<(), MorphologyError> {
        let src = single_feature();
        let dist = distance_transform(&src, 0, Metric::Euclidean)?;
        for y in 0..5 {
            for x in 0..7 {
                let expected = ((x * x + y * y) as f64).sqrt();
                assert_relative_eq!(dist.as_slice()[y * 7 + x], expected, epsilon = 1e-12);
            }
        }
        assert_eq!(dist.as_slice()[0], 0.0);

        Ok(())
    }

    #[test]
    fn test_single_feature_other_metrics() -> Result<(), MorphologyError> {
        let src = single_feature();
        let chebyshev = distance_transform(&src, 0, Metric::Chebyshev)?;
        let manhattan = distance_transform(&src, 0, Metric::Manhattan)?;
        let squared = distance_transform(&src, 0, Metric::SquaredEuclidean)?;
        for y in 0..5usize {
            for x in 0..7usize {
                let i = y * 7 + x;
                assert_eq!(chebyshev.as_slice()[i], x.max(y) as f64);
                assert_eq!(manhattan.as_slice()[i], (x + y) as f64);
                assert_eq!(squared.as_slice()[i], (x * x + y * y) as f64);
            }
        }

        Ok(())
    }

    #[test]
    fn test_no_feature_is_infinite() -> Result<(), MorphologyError> {
        let src = Grid::<u8, 1>::from_size_val([4, 3].into(), 1)?;
        for metric in [
            Metric::Chebyshev,
            Metric::Manhattan,
            Metric::Euclidean,
            Metric::SquaredEuclidean,
        ] {
            let dist = distance_transform(&src, 0, metric)?;
            assert!(dist.as_slice().iter().all(|d| d.is_infinite()));
        }

        Ok(())
    }

    #[test]
    fn test_one_dimensional() -> Result<(), MorphologyError> {
        let src = Grid::<i32, 1>::new([8, 1].into(), vec![1, 0, 0, 1, 0, 0, 0, 0])?;
        let dist = distance_transform(&src, 1, Metric::Euclidean)?;
        assert_eq!(dist.as_slice(), &[0.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 4.0]);

        // a column grid only runs the envelope pass
        let column = Grid::<i32, 1>::new([1, 5].into(), vec![0, 0, 0, 0, 1])?;
        let dist = distance_transform(&column, 1, Metric::Chebyshev)?;
        assert_eq!(dist.as_slice(), &[4.0, 3.0, 2.0, 1.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_matches_brute_force_3d() -> Result<(), MorphologyError> {
        let src = Grid::<u16, 1>::from_fn([6, 5, 4].into(), |x, y, z| {
            [u16::from((x * 7 + y * 13 + z * 5) % 11 == 0)]
        });
        for metric in [
            Metric::Chebyshev,
            Metric::Manhattan,
            Metric::Euclidean,
            Metric::SquaredEuclidean,
        ] {
            let dist = distance_transform(&src, 1, metric)?;
            let expected = brute_force(&src, 1, metric);
            for (got, want) in dist.as_slice().iter().zip(expected.iter()) {
                assert_relative_eq!(got, want, epsilon = 1e-9);
            }
        }

        Ok(())
    }

    #[test]
    fn test_channels_are_independent() -> Result<(), MorphologyError> {
        // channel 0 has a feature at x = 0, channel 1 at x = 2
        let src = Grid::<u8, 2>::new([3, 1].into(), vec![0, 1, 1, 1, 1, 0])?;
        let dist = distance_transform(&src, 0, Metric::Manhattan)?;
        assert_eq!(dist.as_slice(), &[0.0, 2.0, 1.0, 1.0, 2.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_strategies_agree() -> Result<(), MorphologyError> {
        let src = Grid::<u8, 1>::from_fn([90, 80].into(), |x, y, _| {
            [u8::from((x * 31 + y * 17) % 97 == 0)]
        });
        let serial = DistanceTransform::new(Metric::Euclidean)
            .with_strategy(ExecutionStrategy::Serial)
            .execute(&src, 1)?;
        let parallel = DistanceTransform::new(Metric::Euclidean)
            .with_strategy(ExecutionStrategy::Parallel)
            .execute(&src, 1)?;
        assert_eq!(serial, parallel);

        Ok(())
    }

    #[test]
    fn test_metric_ids() -> Result<(), MorphologyError> {
        assert_eq!(Metric::try_from(0)?, Metric::Chebyshev);
        assert_eq!(Metric::try_from(3)?, Metric::SquaredEuclidean);
        assert_eq!(Metric::default(), Metric::Euclidean);

        let src = Grid::<u8, 1>::new([2, 1].into(), vec![0, 1])?;
        assert_eq!(
            distance_transform_with_id(&src, 0, 7),
            Err(MorphologyError::InvalidMetric(7))
        );
        let dist = distance_transform_with_id(&src, 0, 1)?;
        assert_eq!(dist.as_slice(), &[0.0, 1.0]);

        Ok(())
    }

    #[test]
    fn test_empty() -> Result<(), MorphologyError> {
        let src = Grid::<u8, 1>::new([0, 4].into(), vec![])?;
        let dist = distance_transform(&src, 0, Metric::Euclidean)?;
        assert!(dist.is_empty());

        Ok(())
    }
}
