//! Grayscale morphology with arbitrary structuring elements.
//!
//! Generic masks go through a direct neighbourhood reduction; flat boxes and
//! squares use a separable running min/max whose cost does not depend on the
//! element size. Both paths agree exactly on flat box elements.

mod border;
pub use border::BorderPolicy;

mod element;
pub use element::{Member, StructuringElement};

mod masked;

mod separable;

mod ops;
pub use ops::{
    dilate, dilate_rect, dilate_square, erode, erode_rect, erode_square, MorphologyConfig,
};

mod compose;
pub use compose::{
    black_hat, gradient, mclosing, mclosing_square, mopening, mopening_square, top_hat,
};

/// The reduction applied over a neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extremum {
    /// Erosion.
    Min,
    /// Dilation.
    Max,
}

impl Extremum {
    /// Whether `candidate` strictly improves on `current`.
    ///
    /// Unordered values (NaN) win over every ordered value for both reductions,
    /// so a NaN anywhere in a window propagates to the output.
    #[inline]
    pub(crate) fn prefers<T: PartialOrd>(&self, candidate: &T, current: &T) -> bool {
        match (is_unordered(candidate), is_unordered(current)) {
            (true, false) => true,
            (_, true) => false,
            (false, false) => match self {
                Extremum::Min => candidate < current,
                Extremum::Max => candidate > current,
            },
        }
    }

    /// Cells covered before and after position `i` by a flat window of `len`.
    ///
    /// Dilation uses the reflected window, so the two spans swap on even lengths.
    #[inline]
    pub(crate) fn span(&self, len: usize) -> (usize, usize) {
        let (lo, hi) = (len.saturating_sub(1) / 2, len / 2);
        match self {
            Extremum::Min => (lo, hi),
            Extremum::Max => (hi, lo),
        }
    }

    /// Sign applied to a member weight before the reduction.
    #[inline]
    pub(crate) fn weight_sign(&self) -> f64 {
        match self {
            Extremum::Min => -1.0,
            Extremum::Max => 1.0,
        }
    }
}

/// A value that does not compare with itself, i.e. a floating point NaN.
#[inline]
fn is_unordered<T: PartialOrd>(value: &T) -> bool {
    value.partial_cmp(value).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_wins_both_reductions() {
        for op in [Extremum::Min, Extremum::Max] {
            assert!(op.prefers(&f64::NAN, &1.0));
            assert!(!op.prefers(&1.0, &f64::NAN));
            assert!(!op.prefers(&f64::NAN, &f64::NAN));
        }
        assert!(Extremum::Min.prefers(&1, &2));
        assert!(Extremum::Max.prefers(&2.0f32, &1.0));
        assert!(!Extremum::Min.prefers(&2, &2));
    }
}
