//! Property-tagged polygon records.

use geo::{Area, Coord, LineString, Polygon as GeoPolygon};
use polymerge_core::{BBox2D, Error, Point2D, Result, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One merge participant: a property tag, an outer ring and zero or more
/// hole rings.
///
/// After [`normalize`](TaggedPolygon::normalize) the outer ring is oriented
/// counter-clockwise and every hole clockwise. Records are owned by exactly
/// one holder at a time - the input list, a task-tree node, or the boolean
/// accumulator that consumes them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaggedPolygon<P, S> {
    /// User-supplied property tag.
    pub property: P,

    /// Outer ring, stored without a closing duplicate point.
    pub solid: Vec<Point2D<S>>,

    /// Inner hole rings.
    pub holes: Vec<Vec<Point2D<S>>>,
}

impl<P, S: Scalar> TaggedPolygon<P, S> {
    /// Creates a record with no holes.
    pub fn new(property: P, solid: Vec<Point2D<S>>) -> Self {
        Self {
            property,
            solid,
            holes: Vec::new(),
        }
    }

    /// Adds hole rings.
    pub fn with_holes(mut self, holes: Vec<Vec<Point2D<S>>>) -> Self {
        self.holes = holes;
        self
    }

    /// Returns true if the record carries at least one hole.
    pub fn has_hole(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Bounding box over the outer ring and all holes.
    pub fn bbox(&self) -> BBox2D<S> {
        let mut bbox = BBox2D::invalid();
        for point in &self.solid {
            bbox.expand_point(*point);
        }
        for hole in &self.holes {
            for point in hole {
                bbox.expand_point(*point);
            }
        }
        bbox
    }

    /// Area of the outer ring only; interpreting holes is left to callers.
    pub fn area(&self) -> f64 {
        self.covered_area()
    }

    /// Area of the outer ring only.
    pub fn covered_area(&self) -> f64 {
        ring_signed_area(&self.solid).abs()
    }

    /// Orients the outer ring counter-clockwise and every hole clockwise.
    pub fn normalize(&mut self) {
        if ring_signed_area(&self.solid) < 0.0 {
            self.solid.reverse();
        }
        for hole in &mut self.holes {
            if ring_signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
    }

    /// Drops holes whose absolute area is below `threshold`.
    pub fn remove_tiny_holes(&mut self, threshold: f64) {
        self.holes
            .retain(|hole| !ring_signed_area(hole).abs().approx_lt(threshold));
    }

    /// Checks that the outer ring can form a polygon.
    pub fn validate(&self) -> Result<()> {
        if self.solid.len() < 3 {
            return Err(Error::InvalidGeometry(format!(
                "solid ring must have at least 3 points, got {}",
                self.solid.len()
            )));
        }
        Ok(())
    }
}

/// Converts a ring to a `geo` line string in `f64` coordinates.
pub(crate) fn ring_to_linestring<S: Scalar>(ring: &[Point2D<S>]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|p| Coord {
                x: p.x.to_f64(),
                y: p.y.to_f64(),
            })
            .collect::<Vec<_>>(),
    )
}

/// Signed area of a ring: positive for counter-clockwise winding.
pub(crate) fn ring_signed_area<S: Scalar>(ring: &[Point2D<S>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    GeoPolygon::new(ring_to_linestring(ring), Vec::new()).signed_area()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(min: i64, max: i64) -> Vec<Point2D<i64>> {
        vec![
            Point2D::new(min, min),
            Point2D::new(max, min),
            Point2D::new(max, max),
            Point2D::new(min, max),
        ]
    }

    #[test]
    fn test_covered_area_ignores_holes() {
        let polygon = TaggedPolygon::new(1u32, square(0, 10)).with_holes(vec![square(2, 4)]);
        assert_relative_eq!(polygon.covered_area(), 100.0);
    }

    #[test]
    fn test_bbox_covers_holes() {
        // A hole outside the outer ring still widens the bounding box.
        let polygon = TaggedPolygon::new(1u32, square(0, 4)).with_holes(vec![square(6, 8)]);
        let bbox = polygon.bbox();
        assert_eq!(bbox, BBox2D::new(0, 0, 8, 8));
    }

    #[test]
    fn test_normalize_orients_rings() {
        let mut reversed = square(0, 10);
        reversed.reverse();
        let mut polygon = TaggedPolygon::new(1u32, reversed).with_holes(vec![square(2, 4)]);
        polygon.normalize();

        assert!(ring_signed_area(&polygon.solid) > 0.0);
        assert!(ring_signed_area(&polygon.holes[0]) < 0.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut polygon = TaggedPolygon::new(1u32, square(0, 10)).with_holes(vec![square(2, 4)]);
        polygon.normalize();
        let once = polygon.clone();
        polygon.normalize();
        assert_eq!(polygon, once);
    }

    #[test]
    fn test_remove_tiny_holes() {
        let thin = vec![
            Point2D::new(1i64, 1),
            Point2D::new(3, 1),
            Point2D::new(3, 2),
            Point2D::new(1, 2),
        ];
        let mut polygon =
            TaggedPolygon::new(1u32, square(0, 10)).with_holes(vec![thin, square(4, 8)]);
        polygon.remove_tiny_holes(3.0);
        assert_eq!(polygon.holes.len(), 1);
        assert_relative_eq!(ring_signed_area(&polygon.holes[0]).abs(), 16.0);
    }

    #[test]
    fn test_validate_rejects_degenerate_solid() {
        let degenerate = TaggedPolygon::new(1u32, vec![Point2D::new(0i64, 0), Point2D::new(1, 0)]);
        assert!(degenerate.validate().is_err());
        assert!(TaggedPolygon::new(1u32, square(0, 1)).validate().is_ok());
    }
}
