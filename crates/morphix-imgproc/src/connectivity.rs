/// Neighbourhood used by the region-based operations.
///
/// Low connectivity links pixels sharing a face (4 neighbours in 2D, 6 in 3D);
/// high connectivity also links edge and corner neighbours (8 in 2D, 26 in 3D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    /// 4-connectivity in 2D, 6-connectivity in 3D.
    #[default]
    Low,
    /// 8-connectivity in 2D, 26-connectivity in 3D.
    High,
}

impl From<bool> for Connectivity {
    fn from(is_high_connectivity: bool) -> Self {
        if is_high_connectivity {
            Connectivity::High
        } else {
            Connectivity::Low
        }
    }
}

impl Connectivity {
    /// Neighbour offsets `[dx, dy, dz]`, sorted in raster order (z, then y, then x).
    ///
    /// The set is symmetric: for every offset its negation is also present.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphix_imgproc::connectivity::Connectivity;
    ///
    /// assert_eq!(Connectivity::Low.offsets(false).len(), 4);
    /// assert_eq!(Connectivity::High.offsets(false).len(), 8);
    /// assert_eq!(Connectivity::Low.offsets(true).len(), 6);
    /// assert_eq!(Connectivity::High.offsets(true).len(), 26);
    /// ```
    pub fn offsets(&self, is_3d: bool) -> Vec<[isize; 3]> {
        let z_range = if is_3d { -1isize..=1 } else { 0isize..=0 };
        let mut offsets = Vec::with_capacity(26);
        for dz in z_range {
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let manhattan = dx.abs() + dy.abs() + dz.abs();
                    let keep = match self {
                        Connectivity::Low => manhattan == 1,
                        Connectivity::High => manhattan > 0,
                    };
                    if keep {
                        offsets.push([dx, dy, dz]);
                    }
                }
            }
        }
        offsets
    }

    /// The offsets pointing at pixels visited before the current one in a raster scan.
    pub fn causal_offsets(&self, is_3d: bool) -> Vec<[isize; 3]> {
        self.offsets(is_3d)
            .into_iter()
            .filter(|[dx, dy, dz]| (*dz, *dy, *dx) < (0, 0, 0))
            .collect()
    }
}

/// Resolve the neighbour of `(x, y, z)` at `offset`, or `None` outside `[0, extent)`.
#[inline]
pub(crate) fn neighbor(
    x: usize,
    y: usize,
    z: usize,
    offset: [isize; 3],
    extent: [usize; 3],
) -> Option<(usize, usize, usize)> {
    let nx = x as isize + offset[0];
    let ny = y as isize + offset[1];
    let nz = z as isize + offset[2];
    if nx < 0
        || ny < 0
        || nz < 0
        || nx >= extent[0] as isize
        || ny >= extent[1] as isize
        || nz >= extent[2] as isize
    {
        return None;
    }
    Some((nx as usize, ny as usize, nz as usize))
}
