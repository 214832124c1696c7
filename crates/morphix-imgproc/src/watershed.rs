use std::cmp::Ordering;
use std::collections::BinaryHeap;

use morphix_image::{Grid, GridDtype};
use num_traits::Zero;

use crate::connectivity::{neighbor, Connectivity};
use crate::error::MorphologyError;

/// What happens to pixels where two regions meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WatershedLines {
    /// Line pixels take the label of their first labelled neighbour.
    #[default]
    Filled,
    /// Line pixels stay 0 and stop the flood.
    Kept,
}

impl From<bool> for WatershedLines {
    fn from(fill_lines: bool) -> Self {
        if fill_lines {
            WatershedLines::Filled
        } else {
            WatershedLines::Kept
        }
    }
}

/// A pending pixel, ordered so the max-heap pops the lowest priority first and
/// the oldest entry among equal priorities.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    priority: f64,
    seq: u64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Grow the non-zero seeds of `src` over the zero pixels, lowest priority first.
///
/// Every channel is flooded independently, channel `c` using the priority
/// channel `c % PC`, so a single-channel priority drives every channel.
///
/// Every pixel enters the queue once, when a neighbour gets labelled. A popped
/// pixel whose labelled neighbours carry two or more distinct labels is a
/// watershed line: it stays 0 with [`WatershedLines::Kept`] and does not
/// propagate further; with [`WatershedLines::Filled`] it takes the first
/// labelled neighbour in adjacency order. Any other pixel takes the label of its
/// first labelled neighbour. Pixels with equal priority are processed in the
/// order they were queued.
///
/// # Arguments
///
/// * `src` - Seed labels, 0 marking the pixels to fill.
/// * `priority` - Flooding priority, same size as `src` with 1 or `C` channels.
/// * `lines` - Handling of the pixels where regions meet.
/// * `connectivity` - The neighbourhood used for the flood.
///
/// # Errors
///
/// [`MorphologyError::ShapeMismatch`] if `priority` does not have the size of `src`,
/// [`MorphologyError::ChannelMismatch`] if it has neither 1 nor `C` channels.
///
/// # Example
///
/// ```
/// use morphix_image::Grid;
/// use morphix_imgproc::connectivity::Connectivity;
/// use morphix_imgproc::watershed::{watershed, WatershedLines};
///
/// let seeds = Grid::<u8, 1>::new([3, 1].into(), vec![1, 0, 2]).unwrap();
/// let priority = Grid::<f32, 1>::from_size_val([3, 1].into(), 0.0).unwrap();
///
/// let kept = watershed(&seeds, &priority, WatershedLines::Kept, Connectivity::Low).unwrap();
/// assert_eq!(kept.as_slice(), &[1, 0, 2]);
/// ```
pub fn watershed<T, P, const C: usize, const PC: usize>(
    src: &Grid<T, C>,
    priority: &Grid<P, PC>,
    lines: WatershedLines,
    connectivity: Connectivity,
) -> Result<Grid<T, C>, MorphologyError>
where
    T: GridDtype + Zero,
    P: GridDtype,
{
    if priority.size() != src.size() {
        return Err(MorphologyError::ShapeMismatch {
            expected: src.size(),
            actual: priority.size(),
        });
    }
    if PC != 1 && PC != C {
        return Err(MorphologyError::ChannelMismatch {
            expected: C,
            actual: PC,
        });
    }

    let mut data = src.as_slice().to_vec();
    for (c, seeds) in src.split_channels()?.iter().enumerate() {
        let priority = priority.channel(c % PC)?;
        let labels = flood(seeds, &priority, lines, connectivity);
        for (dst, label) in data.iter_mut().skip(c).step_by(C).zip(labels) {
            *dst = label;
        }
    }

    Ok(Grid::new(src.size(), data)?)
}

/// Priority flood of a single channel, returning the labels in raster order.
fn flood<T, P>(
    src: &Grid<T, 1>,
    priority: &Grid<P, 1>,
    lines: WatershedLines,
    connectivity: Connectivity,
) -> Vec<T>
where
    T: GridDtype + Zero,
    P: GridDtype,
{
    let size = src.size();
    let extent = [size.width, size.height, size.depth];
    let offsets = connectivity.offsets(size.is_3d());
    let priorities = priority.as_slice();

    let mut labels = src.as_slice().to_vec();
    let mut queued = labels.iter().map(|l| !l.is_zero()).collect::<Vec<_>>();
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    let mut enqueue_neighbors =
        |idx: usize, labels: &[T], queued: &mut [bool], heap: &mut BinaryHeap<Candidate>| {
            let (x, y, z) = src.coords(idx);
            for &offset in offsets.iter() {
                let Some((nx, ny, nz)) = neighbor(x, y, z, offset, extent) else {
                    continue;
                };
                let nidx = src.offset(nx, ny, nz);
                if queued[nidx] || !labels[nidx].is_zero() {
                    continue;
                }
                queued[nidx] = true;
                heap.push(Candidate {
                    priority: priorities[nidx].to_f64(),
                    seq,
                    index: nidx,
                });
                seq += 1;
            }
        };

    for idx in 0..labels.len() {
        if !labels[idx].is_zero() {
            enqueue_neighbors(idx, &labels, &mut queued, &mut heap);
        }
    }

    let mut num_lines = 0usize;
    while let Some(Candidate { index, .. }) = heap.pop() {
        let (x, y, z) = src.coords(index);

        let mut first: Option<T> = None;
        let mut is_line = false;
        for &offset in offsets.iter() {
            let Some((nx, ny, nz)) = neighbor(x, y, z, offset, extent) else {
                continue;
            };
            let label = labels[src.offset(nx, ny, nz)];
            if label.is_zero() {
                continue;
            }
            match first {
                None => first = Some(label),
                Some(f) if f != label => is_line = true,
                _ => {}
            }
        }

        let Some(label) = first else { continue };
        if is_line {
            num_lines += 1;
            if lines == WatershedLines::Kept {
                continue;
            }
        }

        labels[index] = label;
        enqueue_neighbors(index, &labels, &mut queued, &mut heap);
    }

    log::debug!("watershed on {} met {} line pixels", size, num_lines);

    labels
}
