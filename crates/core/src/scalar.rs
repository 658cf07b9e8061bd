//! Tolerance-aware scalar predicates.
//!
//! Geometry routines downstream accumulate floating-point error, so ordering
//! and equality decisions must go through a single set of predicates that are
//! exact for integer coordinates and epsilon-based for floating ones. The
//! [`Scalar`] trait also carries the two element-type dispatch points the
//! merge engine needs: the point-index map implementation and the
//! degenerate-extent test used when candidate holes are reconstructed.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use crate::point_map::{HashPointMap, NearestPointMap, PointIndexMap};

/// Coordinate element type of the merge engine.
///
/// Implemented for `i32`, `i64`, `f32` and `f64`. Integer implementations
/// compare exactly; floating implementations compare within the type's
/// machine epsilon.
pub trait Scalar:
    Copy
    + PartialOrd
    + PartialEq
    + Debug
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Point-index map implementation for this element type.
    type PointMap: PointIndexMap<Self> + Default;

    const ZERO: Self;
    const ONE: Self;
    const MIN_VALUE: Self;
    const MAX_VALUE: Self;
    /// Comparison tolerance: zero for integers, machine epsilon for floats.
    const TOLERANCE: Self;

    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;

    /// `self == other` within tolerance.
    fn approx_eq(self, other: Self) -> bool;

    /// `self != other` within tolerance.
    fn approx_ne(self, other: Self) -> bool {
        !self.approx_eq(other)
    }

    /// `self < other` beyond tolerance.
    fn approx_lt(self, other: Self) -> bool;

    /// `self > other` beyond tolerance.
    fn approx_gt(self, other: Self) -> bool {
        other.approx_lt(self)
    }

    /// `self <= other` within tolerance.
    fn approx_le(self, other: Self) -> bool {
        self.approx_lt(other) || self.approx_eq(other)
    }

    /// `self >= other` within tolerance.
    fn approx_ge(self, other: Self) -> bool {
        other.approx_le(self)
    }

    fn is_positive(self) -> bool;

    /// Sign-bit test, so `-0.0` counts as negative.
    fn is_negative(self) -> bool;

    /// `1 / self`, saturating to `1 / ±epsilon` when `self` is within
    /// tolerance of zero, so callers never observe an infinity.
    fn safe_inv(self) -> f64;

    /// Whether a candidate hole ring with this bounding-box extent is too
    /// thin to be a real hole. Integer coordinates reject unit-thin slivers;
    /// floating coordinates reject zero area within tolerance.
    fn degenerate_extent(width: Self, height: Self) -> bool;
}

macro_rules! impl_integer_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type PointMap = HashPointMap<$t>;

            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_VALUE: Self = <$t>::MIN;
            const MAX_VALUE: Self = <$t>::MAX;
            const TOLERANCE: Self = 0;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value.round() as $t
            }

            #[inline]
            fn approx_eq(self, other: Self) -> bool {
                self == other
            }

            #[inline]
            fn approx_lt(self, other: Self) -> bool {
                self < other
            }

            #[inline]
            fn is_positive(self) -> bool {
                self > 0
            }

            #[inline]
            fn is_negative(self) -> bool {
                self < 0
            }

            #[inline]
            fn safe_inv(self) -> f64 {
                if self == 0 {
                    1.0 / f64::EPSILON
                } else {
                    1.0 / self as f64
                }
            }

            #[inline]
            fn degenerate_extent(width: Self, height: Self) -> bool {
                width <= 1 || height <= 1
            }
        }
    };
}

macro_rules! impl_float_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type PointMap = NearestPointMap<$t>;

            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const MIN_VALUE: Self = <$t>::MIN;
            const MAX_VALUE: Self = <$t>::MAX;
            const TOLERANCE: Self = <$t>::EPSILON;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn approx_eq(self, other: Self) -> bool {
                (self - other).abs() <= Self::TOLERANCE
            }

            #[inline]
            fn approx_lt(self, other: Self) -> bool {
                other - self > Self::TOLERANCE
            }

            #[inline]
            fn is_positive(self) -> bool {
                self > 0.0
            }

            #[inline]
            fn is_negative(self) -> bool {
                self.is_sign_negative()
            }

            #[inline]
            fn safe_inv(self) -> f64 {
                if self.approx_eq(0.0) {
                    1.0 / f64::EPSILON.copysign(self as f64)
                } else {
                    1.0 / self as f64
                }
            }

            #[inline]
            fn degenerate_extent(width: Self, height: Self) -> bool {
                !(width * height).approx_gt(0.0)
            }
        }
    };
}

impl_integer_scalar!(i32);
impl_integer_scalar!(i64);
impl_float_scalar!(f32);
impl_float_scalar!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_comparisons_are_exact() {
        assert!(3i64.approx_eq(3));
        assert!(3i64.approx_ne(4));
        assert!(3i64.approx_lt(4));
        assert!(4i64.approx_gt(3));
        assert!(3i64.approx_le(3));
        assert!(3i64.approx_ge(3));
    }

    #[test]
    fn test_float_comparisons_use_tolerance() {
        let a = 0.1 + 0.2;
        assert!(a.approx_eq(0.3));
        assert!(!a.approx_lt(0.3));
        assert!(!a.approx_gt(0.3));
        assert!(1.0f64.approx_lt(1.0 + 1e-9));
    }

    #[test]
    fn test_sign_tests() {
        assert!(Scalar::is_positive(1.0f64));
        assert!(!Scalar::is_positive(0.0f64));
        assert!(Scalar::is_negative(-1.0f64));
        assert!(Scalar::is_negative(-0.0f64));
        assert!(!Scalar::is_negative(0.0f64));
        assert!(Scalar::is_negative(-3i64));
        assert!(!Scalar::is_negative(0i64));
    }

    #[test]
    fn test_safe_inv_never_infinite() {
        assert!(0.0f64.safe_inv().is_finite());
        assert!(0i64.safe_inv().is_finite());
        assert!((2.0f64.safe_inv() - 0.5).abs() < 1e-12);
        assert!((4i64.safe_inv() - 0.25).abs() < 1e-12);
        // Negative near-zero inverts to a huge negative value.
        assert!((-0.0f64).safe_inv() < 0.0);
    }

    #[test]
    fn test_degenerate_extent_integer() {
        assert!(i64::degenerate_extent(1, 100));
        assert!(i64::degenerate_extent(100, 1));
        assert!(!i64::degenerate_extent(2, 2));
    }

    #[test]
    fn test_degenerate_extent_float() {
        assert!(f64::degenerate_extent(0.0, 10.0));
        assert!(f64::degenerate_extent(10.0, 0.0));
        assert!(!f64::degenerate_extent(0.5, 0.5));
    }

    #[test]
    fn test_f64_round_trip() {
        assert_eq!(i64::from_f64(3.4), 3);
        assert_eq!(i64::from_f64(3.6), 4);
        assert_eq!(f64::from_f64(3.5), 3.5);
    }
}
