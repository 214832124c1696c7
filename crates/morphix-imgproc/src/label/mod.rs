//! Connected-component labeling under a chained value tolerance.

mod union_find;
pub use union_find::UnionFind;

use morphix_image::{Grid, GridDtype};

use crate::connectivity::{neighbor, Connectivity};
use crate::error::MorphologyError;

/// Label the connected regions of a grid.
///
/// Two adjacent pixels belong to the same region when every channel differs by
/// at most `tolerance`. The relation is chained: pixels far apart in value still
/// share a label when a path of small steps links them.
///
/// Labels start at 0 and are numbered in order of first appearance in a raster
/// scan, so the output is dense and deterministic.
///
/// # Arguments
///
/// * `src` - The grid to label.
/// * `connectivity` - The neighbourhood linking pixels.
/// * `tolerance` - Largest per-channel difference between linked neighbours.
///
/// # Errors
///
/// [`MorphologyError::InvalidTolerance`] if `tolerance` is negative or not finite.
///
/// # Example
///
/// ```
/// use morphix_image::Grid;
/// use morphix_imgproc::connectivity::Connectivity;
/// use morphix_imgproc::label::label;
///
/// let src = Grid::<u8, 1>::new([4, 1].into(), vec![1, 1, 0, 1]).unwrap();
/// let labels = label(&src, Connectivity::Low, 0.0).unwrap();
///
/// assert_eq!(labels.as_slice(), &[0, 0, 1, 2]);
/// ```
pub fn label<T: GridDtype, const C: usize>(
    src: &Grid<T, C>,
    connectivity: Connectivity,
    tolerance: f64,
) -> Result<Grid<u32, 1>, MorphologyError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(MorphologyError::InvalidTolerance(tolerance));
    }

    let size = src.size();
    let num_pixels = size.num_pixels();
    let extent = [size.width, size.height, size.depth];
    let causal = connectivity.causal_offsets(size.is_3d());

    let compatible = |a: usize, b: usize| {
        src.pixel(a)
            .iter()
            .zip(src.pixel(b))
            .all(|(&p, &q)| (p.to_f64() - q.to_f64()).abs() <= tolerance)
    };

    // forward pass: only neighbours already visited can be merged
    let mut sets = UnionFind::new(num_pixels);
    for idx in 0..num_pixels {
        let (x, y, z) = src.coords(idx);
        for &offset in causal.iter() {
            if let Some((nx, ny, nz)) = neighbor(x, y, z, offset, extent) {
                let nidx = src.offset(nx, ny, nz);
                if compatible(idx, nidx) {
                    sets.union(idx, nidx);
                }
            }
        }
    }

    // flatten and remap the roots to a dense range
    let mut root_label = vec![u32::MAX; num_pixels];
    let mut next_label = 0u32;
    let mut labels = Vec::with_capacity(num_pixels);
    for idx in 0..num_pixels {
        let root = sets.find(idx);
        if root_label[root] == u32::MAX {
            root_label[root] = next_label;
            next_label += 1;
        }
        labels.push(root_label[root]);
    }

    log::debug!("labeled {} regions on {}", next_label, size);

    Ok(Grid::new(size, labels)?)
}

/// Number of distinct regions in a grid produced by [`label`].
pub fn count_labels(labels: &Grid<u32, 1>) -> usize {
    labels
        .as_slice()
        .iter()
        .max()
        .map_or(0, |&max| max as usize + 1)
}
