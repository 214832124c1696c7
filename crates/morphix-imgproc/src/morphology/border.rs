use morphix_image::GridDtype;
use num_traits::Zero;

/// Border handling for neighbourhood lookups that fall outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderPolicy {
    /// Replicate the value of the nearest border pixel.
    #[default]
    ClampToEdge,

    /// Read every out-of-bounds pixel as zero.
    ZeroFill,
}

impl From<bool> for BorderPolicy {
    /// `true` selects the replicated (Neumann) border, `false` the zero border.
    fn from(boundary_conditions: bool) -> Self {
        if boundary_conditions {
            BorderPolicy::ClampToEdge
        } else {
            BorderPolicy::ZeroFill
        }
    }
}

impl BorderPolicy {
    /// Map a possibly out-of-bounds coordinate to an in-bounds one.
    ///
    /// Returns `None` when the lookup must read the fill value instead.
    #[inline]
    pub(crate) fn resolve(&self, idx: isize, len: usize) -> Option<usize> {
        if idx >= 0 && (idx as usize) < len {
            return Some(idx as usize);
        }
        match self {
            BorderPolicy::ClampToEdge => Some(idx.clamp(0, len as isize - 1) as usize),
            BorderPolicy::ZeroFill => None,
        }
    }

    /// The value read for a lookup with no in-bounds source pixel.
    #[inline]
    pub(crate) fn fill_value<T: GridDtype + Zero>(&self) -> T {
        T::zero()
    }
}
