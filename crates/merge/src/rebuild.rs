//! Hole reconstruction from self-touching polylines.
//!
//! The boolean accumulator emits each merged region as one closed polyline
//! that may self-touch at vertices; every self-touch marks a hole pinch.
//! This pass splits such a polyline back into one outer ring plus hole
//! rings by walking the vertices with a circular doubly-linked index list:
//! whenever the current vertex was already seen, the sub-ring between the
//! two occurrences is spliced out as a hole candidate and the main ring is
//! re-stitched around it. Candidates thinner than the element type allows
//! (unit-thin for integers, zero area for floats) are the keyhole-bridge
//! remnants and are discarded.

use polymerge_core::{BBox2D, Point2D, PointIndexMap, Scalar};

use crate::geometry::TaggedPolygon;

#[derive(Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
}

/// Rebuilds an outer-plus-holes polygon record from one closed polyline.
///
/// The polyline may carry a closing duplicate point; it is dropped. The
/// returned record is normalized: outer ring counter-clockwise, holes
/// clockwise.
pub fn rebuild_polygon<P, S: Scalar>(
    mut polyline: Vec<Point2D<S>>,
    property: P,
) -> TaggedPolygon<P, S> {
    if polyline.len() > 1 && polyline.first() == polyline.last() {
        polyline.pop();
    }
    let count = polyline.len();
    if count < 3 {
        return TaggedPolygon::new(property, polyline);
    }

    let mut links: Vec<Link> = (0..count)
        .map(|i| Link {
            prev: (i + count - 1) % count,
            next: (i + 1) % count,
        })
        .collect();

    let mut holes: Vec<Vec<Point2D<S>>> = Vec::new();
    let mut seen = S::PointMap::default();

    for current in 0..count {
        if let Some(start) = seen.lookup(polyline[current]) {
            let resume = links[current].next;
            links[current].next = start;

            // The ring between the two occurrences is a hole candidate.
            let mut candidate = Vec::new();
            let mut index = start;
            while index != current {
                candidate.push(polyline[index]);
                index = links[index].next;
            }

            let mut bbox = BBox2D::invalid();
            for point in &candidate {
                bbox.expand_point(*point);
            }
            if !S::degenerate_extent(bbox.width(), bbox.height()) {
                holes.push(candidate);
            }

            // Close the main ring around the spliced-out section, keeping
            // the later occurrence of the pinch vertex.
            let before = links[start].prev;
            links[before].next = current;
            links[current].prev = before;
            links[current].next = resume;
        }
        seen.insert(polyline[current], current);
    }

    // The last vertex is never spliced out, so it still sits on the main
    // ring; walk from there to recover the outer ring.
    let start = count - 1;
    let mut solid = Vec::new();
    let mut index = start;
    loop {
        solid.push(polyline[index]);
        if links[index].next == start {
            break;
        }
        index = links[index].next;
    }

    let mut polygon = TaggedPolygon::new(property, solid).with_holes(holes);
    polygon.normalize();
    polygon
}
