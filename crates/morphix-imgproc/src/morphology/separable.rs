use std::collections::VecDeque;

use morphix_image::{Grid, GridDtype, GridError};

use super::Extremum;
use crate::parallel::{map_lines, ExecutionStrategy};

/// Running extremum of `src` over a window of `window` cells.
///
/// The window of output `i` covers `i - before ..= i + after` as given by
/// [`Extremum::span`], restricted to the line, which is what replicating the
/// edge values yields for a min or max. A monotonic deque of candidate indices
/// keeps the cost linear in the line length whatever the window size. NaN
/// values win over every other value, as in [`Extremum::prefers`].
pub(crate) fn running_extremum<T: PartialOrd + Copy>(
    src: &[T],
    dst: &mut [T],
    window: usize,
    op: Extremum,
) {
    let n = src.len();
    if n == 0 {
        return;
    }
    if window <= 1 {
        dst.copy_from_slice(src);
        return;
    }

    let (before, after) = op.span(window);
    let mut candidates: VecDeque<usize> = VecDeque::with_capacity(window.min(n));
    let mut next = 0;

    for (i, out) in dst.iter_mut().enumerate() {
        let hi = (i + after).min(n - 1);
        while next <= hi {
            // drop candidates the new value beats or ties; on ties the newer index
            // survives longer, which cannot change the reduced value
            while let Some(&back) = candidates.back() {
                if op.prefers(&src[back], &src[next]) {
                    break;
                }
                candidates.pop_back();
            }
            candidates.push_back(next);
            next += 1;
        }

        let lo = i.saturating_sub(before);
        while let Some(&front) = candidates.front() {
            if front >= lo {
                break;
            }
            candidates.pop_front();
        }

        if let Some(&front) = candidates.front() {
            *out = src[front];
        }
    }
}

/// Separable flat box reduction with a `[sx, sy, sz]` window.
///
/// Runs one running-extremum pass per axis whose window and extent are both
/// larger than one cell.
pub(crate) fn morph_box<T, const C: usize>(
    src: &Grid<T, C>,
    window: [usize; 3],
    op: Extremum,
    strategy: ExecutionStrategy,
) -> Result<Grid<T, C>, GridError>
where
    T: GridDtype,
{
    let size = src.size();
    if src.is_empty() || window.iter().any(|&k| k == 0) {
        return Ok(src.clone());
    }

    let mut data = src.as_slice().to_vec();
    for (axis, &k) in window.iter().enumerate() {
        if k <= 1 || size.extent(axis) <= 1 {
            continue;
        }
        log::trace!("box {:?} pass along axis {} with window {}", op, axis, k);
        data = map_lines(&data, size, C, axis, strategy, |line, out| {
            running_extremum(line, out, k, op)
        });
    }

    Grid::new(size, data)
}
