//! Polygon point cleanup.
//!
//! Douglas-Peucker simplification with a distance tolerance, iterated until
//! the point count stops shrinking. Rings are closed before simplification
//! so both endpoints of the traversal are pinned to the same vertex; the
//! closing duplicate is stripped again on the way out.

use geo::{Coord, Simplify};
use polymerge_core::{Point2D, Scalar};

use crate::geometry::{ring_to_linestring, TaggedPolygon};

/// Cleans every polygon in `polygons` with tolerance `dist`.
pub fn clean_polygons<P, S: Scalar>(polygons: &mut [TaggedPolygon<P, S>], dist: f64) {
    for polygon in polygons {
        clean_polygon(polygon, dist);
    }
}

/// Cleans the outer ring and every hole of `polygon` with tolerance `dist`.
pub fn clean_polygon<P, S: Scalar>(polygon: &mut TaggedPolygon<P, S>, dist: f64) {
    clean_ring(&mut polygon.solid, dist);
    for hole in &mut polygon.holes {
        clean_ring(hole, dist);
    }
}

/// Cleans a single ring in place. Rings with fewer than three points are
/// left unchanged, as is any ring that would drop below three points.
pub fn clean_ring<S: Scalar>(ring: &mut Vec<Point2D<S>>, dist: f64) {
    if ring.len() < 3 {
        return;
    }

    let mut line = ring_to_linestring(ring);
    let first = line.0[0];
    line.0.push(first);

    loop {
        let before = line.0.len();
        line = line.simplify(&dist);
        if line.0.len() == before {
            break;
        }
    }

    let mut points: Vec<Coord<f64>> = line.0;
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        let dx = last.x - first.x;
        let dy = last.y - first.y;
        if dx * dx + dy * dy > dist * dist {
            points.pop();
        }
    }
    // Strip the closing duplicate back off.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() >= 3 {
        *ring = points
            .into_iter()
            .map(|c| Point2D::new(S::from_f64(c.x), S::from_f64(c.y)))
            .collect();
    }
}
