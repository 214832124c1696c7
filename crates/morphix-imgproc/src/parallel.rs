use rayon::prelude::*;

use morphix_image::GridSize;

/// Number of values above which [`ExecutionStrategy::Auto`] switches to rayon.
pub const PARALLEL_THRESHOLD: usize = 64 * 64;

/// Controls how the independent row and line passes are executed.
///
/// Every strategy produces bit-identical results; only the scheduling differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small grids, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Use the global Rayon thread pool for every pass.
    Parallel,

    /// Go parallel once the grid holds at least [`PARALLEL_THRESHOLD`] values.
    #[default]
    Auto,
}

impl ExecutionStrategy {
    /// Whether a pass over `num_values` values should run on the thread pool.
    pub fn is_parallel(&self, num_values: usize) -> bool {
        match self {
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel => true,
            ExecutionStrategy::Auto => num_values >= PARALLEL_THRESHOLD,
        }
    }
}

/// Apply a function to each row of `dst`, passing the row index.
///
/// A row is `row_len` consecutive values; row `r` of a grid is the x-line at
/// `y = r % height`, `z = r / height`.
pub fn for_each_row<T: Send>(
    dst: &mut [T],
    row_len: usize,
    strategy: ExecutionStrategy,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) {
    if row_len == 0 {
        return;
    }
    if strategy.is_parallel(dst.len()) {
        dst.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        dst.chunks_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

/// Layout of the 1D lines running along one axis of an interleaved grid buffer.
#[derive(Debug, Clone, Copy)]
struct LineLayout {
    len: usize,
    stride: usize,
    block: usize,
    count: usize,
}

impl LineLayout {
    fn new(size: GridSize, channels: usize, axis: usize) -> Self {
        let total = size.num_pixels() * channels;
        let len = size.extent(axis);
        let stride = match axis {
            0 => channels,
            1 => size.width * channels,
            _ => size.width * size.height * channels,
        };
        let block = stride * len;
        let count = if block == 0 { 0 } else { total / len };
        Self {
            len,
            stride,
            block,
            count,
        }
    }

    // Lines are enumerated as (outer block, offset within stride).
    fn start(&self, line: usize) -> usize {
        (line / self.stride) * self.block + line % self.stride
    }
}

/// Run `f` independently on every line of `src` along `axis` and gather the
/// results into a new buffer of the same layout.
///
/// `src` is an interleaved buffer of `size.num_pixels() * channels` values and
/// the channels are processed as separate lines. The closure receives the input
/// line and an output line of the same length.
pub fn map_lines<T, U, F>(
    src: &[T],
    size: GridSize,
    channels: usize,
    axis: usize,
    strategy: ExecutionStrategy,
    f: F,
) -> Vec<U>
where
    T: Copy + Send + Sync,
    U: Copy + Default + Send + Sync,
    F: Fn(&[T], &mut [U]) + Send + Sync,
{
    let layout = LineLayout::new(size, channels, axis);
    let mut dst = vec![U::default(); src.len()];
    if layout.count == 0 {
        return dst;
    }

    let process = |line: usize| -> Vec<U> {
        let start = layout.start(line);
        let input = (0..layout.len)
            .map(|k| src[start + k * layout.stride])
            .collect::<Vec<T>>();
        let mut output = vec![U::default(); layout.len];
        f(&input, &mut output);
        output
    };

    let lines: Vec<Vec<U>> = if strategy.is_parallel(src.len()) {
        (0..layout.count).into_par_iter().map(process).collect()
    } else {
        (0..layout.count).map(process).collect()
    };

    for (line, values) in lines.into_iter().enumerate() {
        let start = layout.start(line);
        for (k, v) in values.into_iter().enumerate() {
            dst[start + k * layout.stride] = v;
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parallel() {
        assert!(!ExecutionStrategy::Serial.is_parallel(usize::MAX));
        assert!(ExecutionStrategy::Parallel.is_parallel(1));
        assert!(!ExecutionStrategy::Auto.is_parallel(PARALLEL_THRESHOLD - 1));
        assert!(ExecutionStrategy::Auto.is_parallel(PARALLEL_THRESHOLD));
    }

    #[test]
    fn test_for_each_row() {
        let mut dst = vec![0usize; 6];
        for_each_row(&mut dst, 2, ExecutionStrategy::Parallel, |r, row| {
            row.iter_mut().for_each(|v| *v = r);
        });
        assert_eq!(dst, vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_map_lines_axes() {
        // 3x2x2 grid with two channels, value = linear index
        let size: GridSize = [3, 2, 2].into();
        let src = (0..24).collect::<Vec<i64>>();

        // reverse each line so the permutation reveals the traversal order
        let reverse = |input: &[i64], output: &mut [i64]| {
            output
                .iter_mut()
                .zip(input.iter().rev())
                .for_each(|(o, i)| *o = *i);
        };

        let along_x = map_lines(&src, size, 2, 0, ExecutionStrategy::Serial, reverse);
        assert_eq!(&along_x[..6], &[4, 5, 2, 3, 0, 1]);

        let along_y = map_lines(&src, size, 2, 1, ExecutionStrategy::Serial, reverse);
        assert_eq!(&along_y[..6], &[6, 7, 8, 9, 10, 11]);

        let along_z = map_lines(&src, size, 2, 2, ExecutionStrategy::Parallel, reverse);
        assert_eq!(&along_z[..2], &[12, 13]);
        assert_eq!(&along_z[12..14], &[0, 1]);
    }

    #[test]
    fn test_map_lines_strategies_agree() {
        let size: GridSize = [70, 65].into();
        let src = (0..70 * 65).map(|v| (v * 7919) % 101).collect::<Vec<i64>>();
        let prefix_max = |input: &[i64], output: &mut [i64]| {
            let mut acc = i64::MIN;
            for (o, &i) in output.iter_mut().zip(input) {
                acc = acc.max(i);
                *o = acc;
            }
        };
        let serial = map_lines(&src, size, 1, 1, ExecutionStrategy::Serial, prefix_max);
        let parallel = map_lines(&src, size, 1, 1, ExecutionStrategy::Parallel, prefix_max);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_map_lines_empty() {
        let out: Vec<i64> = map_lines(
            &[] as &[i64],
            [0, 4].into(),
            1,
            0,
            ExecutionStrategy::Serial,
            |_, _| {},
        );
        assert!(out.is_empty());
    }
}
