//! 2D point and axis-aligned bounding box primitives.

use crate::scalar::Scalar;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point with coordinates of element type `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2D<S> {
    pub x: S,
    pub y: S,
}

impl<S: Scalar> Point2D<S> {
    /// Creates a new point.
    #[inline]
    pub fn new(x: S, y: S) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to `other`, in `f64`.
    #[inline]
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dx = self.x.to_f64() - other.x.to_f64();
        let dy = self.y.to_f64() - other.y.to_f64();
        dx * dx + dy * dy
    }
}

/// An axis-aligned bounding box.
///
/// A freshly constructed box via [`BBox2D::invalid`] is empty: the minimum
/// corner sits at the type maximum and the maximum corner at the type
/// minimum, so the first [`expand_point`](BBox2D::expand_point) makes it
/// valid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BBox2D<S> {
    pub min_x: S,
    pub min_y: S,
    pub max_x: S,
    pub max_y: S,
}

impl<S: Scalar> BBox2D<S> {
    /// Creates a box from its corner coordinates.
    #[inline]
    pub fn new(min_x: S, min_y: S, max_x: S, max_y: S) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates an empty (invalid) box.
    #[inline]
    pub fn invalid() -> Self {
        Self {
            min_x: S::MAX_VALUE,
            min_y: S::MAX_VALUE,
            max_x: S::MIN_VALUE,
            max_y: S::MIN_VALUE,
        }
    }

    /// Returns true if the box has non-negative extent on both axes.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    #[inline]
    pub fn width(&self) -> S {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> S {
        self.max_y - self.min_y
    }

    /// Box area in `f64`. Zero for invalid boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.width().to_f64() * self.height().to_f64()
    }

    /// Center of the box as `f64` coordinates.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x.to_f64() + self.max_x.to_f64()) * 0.5,
            (self.min_y.to_f64() + self.max_y.to_f64()) * 0.5,
        )
    }

    /// Grows the box to cover `point`.
    #[inline]
    pub fn expand_point(&mut self, point: Point2D<S>) {
        if point.x < self.min_x {
            self.min_x = point.x;
        }
        if point.y < self.min_y {
            self.min_y = point.y;
        }
        if point.x > self.max_x {
            self.max_x = point.x;
        }
        if point.y > self.max_y {
            self.max_y = point.y;
        }
    }

    /// Grows the box to cover `other`.
    #[inline]
    pub fn union(&mut self, other: &Self) {
        if !other.is_valid() {
            return;
        }
        if other.min_x < self.min_x {
            self.min_x = other.min_x;
        }
        if other.min_y < self.min_y {
            self.min_y = other.min_y;
        }
        if other.max_x > self.max_x {
            self.max_x = other.max_x;
        }
        if other.max_y > self.max_y {
            self.max_y = other.max_y;
        }
    }

    /// Returns true if the boxes overlap or touch.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Returns true if `other` lies entirely inside this box.
    #[inline]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && other.max_x <= self.max_x
            && self.min_y <= other.min_y
            && other.max_y <= self.max_y
    }
}

impl<S: Scalar> Default for BBox2D<S> {
    fn default() -> Self {
        Self::invalid()
    }
}
