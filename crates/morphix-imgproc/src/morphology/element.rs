use morphix_image::{Grid, GridSize};

use crate::error::MorphologyError;

/// A morphological structuring element.
///
/// The element defines the neighbourhood used by erosion and dilation. Its
/// centre along an axis of length `k` is the cell `(k - 1) / 2`, so the window
/// spans the offsets `-(k - 1) / 2 ..= k / 2` on that axis.
///
/// # Example
///
/// ```rust
/// use morphix_imgproc::morphology::StructuringElement;
///
/// let element = StructuringElement::cross(3);
/// assert_eq!(element.members(false).len(), 5);
/// assert!(element.is_flat());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum StructuringElement {
    /// A flat mask: every non-zero cell belongs to the neighbourhood.
    Mask(Grid<f64, 1>),

    /// A weighted mask: non-zero cells belong to the neighbourhood and their
    /// value is subtracted (erosion) or added (dilation) before the reduction.
    Weighted(Grid<f64, 1>),

    /// A flat axis-aligned box of `sx` x `sy` x `sz` cells.
    Rect {
        /// Width of the box.
        sx: usize,
        /// Height of the box.
        sy: usize,
        /// Depth of the box.
        sz: usize,
    },

    /// A flat square of side `size`, or a cube when applied to a 3D grid.
    Square {
        /// Side length of the square.
        size: usize,
    },
}

/// One cell of a structuring element relative to its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    /// Offset `[dx, dy, dz]` from the centre.
    pub offset: [isize; 3],
    /// Weight of the cell, zero for flat elements.
    pub weight: f64,
}

#[inline]
fn center(len: usize) -> isize {
    (len as isize - 1).max(0) / 2
}

impl StructuringElement {
    /// A flat `size` x `size` square mask.
    pub fn flat_square_mask(size: usize) -> Self {
        Self::flat_rect_mask(size, size, 1)
    }

    /// A flat `sx` x `sy` x `sz` box mask.
    pub fn flat_rect_mask(sx: usize, sy: usize, sz: usize) -> Self {
        StructuringElement::Mask(Grid::from_fn([sx, sy, sz].into(), |_, _, _| [1.0]))
    }

    /// A flat cross (plus) shaped mask of side `size`.
    pub fn cross(size: usize) -> Self {
        let mid = center(size) as usize;
        StructuringElement::Mask(Grid::from_fn([size, size].into(), |x, y, _| {
            [if x == mid || y == mid { 1.0 } else { 0.0 }]
        }))
    }

    /// A flat ellipse inscribed in a `width` x `height` box.
    pub fn ellipse(width: usize, height: usize) -> Self {
        let cx = center(width) as f64;
        let cy = center(height) as f64;
        let rx = (width as f64 / 2.0).max(f64::EPSILON);
        let ry = (height as f64 / 2.0).max(f64::EPSILON);
        StructuringElement::Mask(Grid::from_fn([width, height].into(), |x, y, _| {
            let dx = (x as f64 - cx) / rx;
            let dy = (y as f64 - cy) / ry;
            [if dx * dx + dy * dy <= 1.0 { 1.0 } else { 0.0 }]
        }))
    }

    /// Whether the element carries no weights.
    pub fn is_flat(&self) -> bool {
        !matches!(self, StructuringElement::Weighted(_))
    }

    /// The box extent `[sx, sy, sz]` of a parametric element.
    ///
    /// A square applied to a 3D grid becomes a cube.
    pub fn box_extent(&self, is_3d: bool) -> Option<[usize; 3]> {
        match self {
            StructuringElement::Rect { sx, sy, sz } => Some([*sx, *sy, *sz]),
            StructuringElement::Square { size } => {
                Some([*size, *size, if is_3d { *size } else { 1 }])
            }
            _ => None,
        }
    }

    /// The size of the element's bounding box.
    pub fn extent(&self, is_3d: bool) -> GridSize {
        match self {
            StructuringElement::Mask(mask) | StructuringElement::Weighted(mask) => mask.size(),
            _ => self.box_extent(is_3d).unwrap_or([0, 0, 0]).into(),
        }
    }

    /// Materialize the element as a mask grid.
    pub fn to_mask(&self, is_3d: bool) -> Grid<f64, 1> {
        match self {
            StructuringElement::Mask(mask) | StructuringElement::Weighted(mask) => mask.clone(),
            _ => Grid::from_fn(self.extent(is_3d), |_, _, _| [1.0]),
        }
    }

    /// The cells that belong to the neighbourhood, in raster order.
    pub fn members(&self, is_3d: bool) -> Vec<Member> {
        let mask = self.to_mask(is_3d);
        let size = mask.size();
        let (cx, cy, cz) = (center(size.width), center(size.height), center(size.depth));
        let weighted = !self.is_flat();

        mask.as_slice()
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(idx, &v)| {
                let (x, y, z) = mask.coords(idx);
                Member {
                    offset: [x as isize - cx, y as isize - cy, z as isize - cz],
                    weight: if weighted { v } else { 0.0 },
                }
            })
            .collect()
    }

    /// The point reflection of the element through its centre.
    ///
    /// Even extents grow by one cell so the reflected offsets stay centred. A box
    /// with odd extents is its own reflection and stays parametric; other boxes
    /// are materialized with `is_3d` deciding whether a square is a cube.
    pub fn reflected(&self, is_3d: bool) -> Self {
        let reflect = |mask: &Grid<f64, 1>| -> Grid<f64, 1> {
            let size = mask.size();
            let grow = |len: usize| if len % 2 == 0 && len > 0 { len + 1 } else { len };
            let out_size: GridSize = [grow(size.width), grow(size.height), grow(size.depth)].into();
            let (cx, cy, cz) = (center(size.width), center(size.height), center(size.depth));
            let (ox, oy, oz) = (
                center(out_size.width),
                center(out_size.height),
                center(out_size.depth),
            );
            Grid::from_fn(out_size, |x, y, z| {
                // output cell at offset d reads the input cell at offset -d
                let sx = cx - (x as isize - ox);
                let sy = cy - (y as isize - oy);
                let sz = cz - (z as isize - oz);
                let inside = sx >= 0
                    && sy >= 0
                    && sz >= 0
                    && (sx as usize) < size.width
                    && (sy as usize) < size.height
                    && (sz as usize) < size.depth;
                if inside {
                    [mask.pixel(mask.offset(sx as usize, sy as usize, sz as usize))[0]]
                } else {
                    [0.0]
                }
            })
        };

        match self {
            StructuringElement::Mask(mask) => StructuringElement::Mask(reflect(mask)),
            StructuringElement::Weighted(mask) => StructuringElement::Weighted(reflect(mask)),
            StructuringElement::Rect { .. } | StructuringElement::Square { .. } => {
                let symmetric = self
                    .box_extent(is_3d)
                    .is_some_and(|extent| extent.iter().all(|k| k % 2 == 1));
                if symmetric {
                    self.clone()
                } else {
                    StructuringElement::Mask(reflect(&self.to_mask(is_3d)))
                }
            }
        }
    }

    /// Check that every cell of the element is finite.
    pub fn validate(&self) -> Result<(), MorphologyError> {
        match self {
            StructuringElement::Mask(mask) | StructuringElement::Weighted(mask) => {
                if mask.as_slice().iter().all(|v| v.is_finite()) {
                    Ok(())
                } else {
                    Err(MorphologyError::NonFiniteElement)
                }
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(element: &StructuringElement) -> Vec<[isize; 3]> {
        element.members(false).iter().map(|m| m.offset).collect()
    }

    #[test]
    fn test_square_mask() {
        let element = StructuringElement::flat_square_mask(3);
        let members = element.members(false);
        assert_eq!(members.len(), 9);
        assert_eq!(members[0].offset, [-1, -1, 0]);
        assert_eq!(members[8].offset, [1, 1, 0]);
        assert!(members.iter().all(|m| m.weight == 0.0));
    }

    #[test]
    fn test_even_center_is_floor() {
        let element = StructuringElement::flat_rect_mask(4, 1, 1);
        assert_eq!(
            offsets(&element),
            vec![[-1, 0, 0], [0, 0, 0], [1, 0, 0], [2, 0, 0]]
        );
    }

    #[test]
    fn test_cross_and_ellipse() {
        let cross = StructuringElement::cross(3);
        assert_eq!(
            offsets(&cross),
            vec![[0, -1, 0], [-1, 0, 0], [0, 0, 0], [1, 0, 0], [0, 1, 0]]
        );

        let ellipse = StructuringElement::ellipse(5, 5);
        let members = offsets(&ellipse);
        assert!(members.contains(&[0, 0, 0]));
        assert!(members.contains(&[2, 0, 0]));
        assert!(!members.contains(&[2, 2, 0]));
    }

    #[test]
    fn test_square_becomes_cube_in_3d() {
        let element = StructuringElement::Square { size: 3 };
        assert_eq!(element.box_extent(false), Some([3, 3, 1]));
        assert_eq!(element.box_extent(true), Some([3, 3, 3]));
        assert_eq!(element.members(true).len(), 27);
    }

    #[test]
    fn test_weighted_members() -> Result<(), MorphologyError> {
        let mask = Grid::<f64, 1>::new([3, 1].into(), vec![1.0, 0.0, 2.5])?;
        let element = StructuringElement::Weighted(mask);
        assert!(!element.is_flat());
        let members = element.members(false);
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].offset, [1, 0, 0]);
        assert_eq!(members[1].weight, 2.5);

        Ok(())
    }

    #[test]
    fn test_reflected_odd() -> Result<(), MorphologyError> {
        let mask = Grid::<f64, 1>::new([3, 1].into(), vec![1.0, 1.0, 0.0])?;
        let reflected = StructuringElement::Mask(mask).reflected(false);
        assert_eq!(offsets(&reflected), vec![[0, 0, 0], [1, 0, 0]]);

        Ok(())
    }

    #[test]
    fn test_reflected_even_grows() {
        // offsets -1..=2 reflect to -2..=1
        let reflected = StructuringElement::flat_rect_mask(4, 1, 1).reflected(false);
        assert_eq!(reflected.extent(false), GridSize::from([5, 1]));
        assert_eq!(
            offsets(&reflected),
            vec![[-2, 0, 0], [-1, 0, 0], [0, 0, 0], [1, 0, 0]]
        );
    }

    #[test]
    fn test_reflected_boxes() {
        let square = StructuringElement::Square { size: 3 };
        assert_eq!(square.reflected(true), square);

        // an even cube reflects to a 3D mask, not a plane
        let reflected = StructuringElement::Square { size: 2 }.reflected(true);
        assert_eq!(reflected.extent(true), GridSize::from([3, 3, 3]));
        let members = reflected.members(true);
        assert_eq!(members.len(), 8);
        assert!(members.contains(&Member {
            offset: [-1, -1, -1],
            weight: 0.0
        }));
        assert!(members.iter().all(|m| m.offset.iter().all(|&o| o <= 0)));

        let rect = StructuringElement::Rect { sx: 3, sy: 1, sz: 2 };
        assert_eq!(rect.reflected(false).extent(false), GridSize::from([3, 1, 3]));
    }

    #[test]
    fn test_validate() -> Result<(), MorphologyError> {
        let mask = Grid::<f64, 1>::new([2, 1].into(), vec![1.0, f64::NAN])?;
        assert_eq!(
            StructuringElement::Weighted(mask).validate(),
            Err(MorphologyError::NonFiniteElement)
        );
        assert!(StructuringElement::Square { size: 0 }.validate().is_ok());

        Ok(())
    }
}
