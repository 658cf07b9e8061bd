//! Property-aware boolean union accumulator.
//!
//! Collects `(ring, property, is_hole)` contributions and, on
//! [`merge`](PropertyMerge::merge), produces one entry per distinct
//! *property subset*: the region covered by exactly those properties. Each
//! region is returned as closed polylines in which holes are keyholed into
//! the outer ring through doubled bridge edges, so every merged region is a
//! single polyline that self-touches at its pinch vertices. The hole
//! reconstruction pass downstream splits those polylines back into
//! outer-plus-holes records and rejects the zero-width bridge remnants.

use std::collections::{BTreeMap, BTreeSet};

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use polymerge_core::{Point2D, Scalar};

/// A single ring in `f64` coordinates, stored without a closing duplicate.
pub type Contour = Vec<[f64; 2]>;
/// One region: outer contour first, holes after.
pub type Shape = Vec<Contour>;
/// A set of disjoint regions.
pub type Shapes = Vec<Shape>;

/// Accumulator for property-keyed boolean union.
#[derive(Debug, Default)]
pub struct PropertyMerge<P> {
    inputs: BTreeMap<P, Vec<Contour>>,
}

impl<P: Clone + Ord> PropertyMerge<P> {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            inputs: BTreeMap::new(),
        }
    }

    /// Returns true if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Inserts one ring under `property`. Solid rings contribute positively,
    /// hole rings negatively; winding is fixed up here so callers may pass
    /// rings in either orientation.
    pub fn insert<S: Scalar>(&mut self, ring: &[Point2D<S>], property: P, is_hole: bool) {
        if ring.len() < 3 {
            return;
        }
        let mut contour: Contour = ring.iter().map(|p| [p.x.to_f64(), p.y.to_f64()]).collect();
        let area = contour_area(&contour);
        if (is_hole && area > 0.0) || (!is_hole && area < 0.0) {
            contour.reverse();
        }
        self.inputs.entry(property).or_default().push(contour);
    }

    /// Resolves the accumulated contributions into regions keyed by the
    /// exact subset of properties covering them, each region rendered as
    /// keyholed closed polylines.
    pub fn merge(&self) -> BTreeMap<BTreeSet<P>, Vec<Contour>> {
        // Pairwise-disjoint regions discovered so far, refined property by
        // property: intersecting parts split off under the joined key, the
        // leftovers keep their original keys.
        let mut regions: Vec<(BTreeSet<P>, Shapes)> = Vec::new();

        for (property, contours) in &self.inputs {
            let mut remaining = self_union(contours);
            let mut carved: Vec<(BTreeSet<P>, Shapes)> = Vec::new();

            for (set, region) in regions.iter_mut() {
                if remaining.is_empty() {
                    break;
                }
                let common = overlay_shapes(region, &remaining, OverlayRule::Intersect);
                if common.is_empty() {
                    continue;
                }
                let reduced = overlay_shapes(region, &remaining, OverlayRule::Difference);
                remaining = overlay_shapes(&remaining, region, OverlayRule::Difference);

                let mut joint = set.clone();
                joint.insert(property.clone());
                carved.push((joint, common));
                *region = reduced;
            }

            regions.retain(|(_, region)| !region.is_empty());
            regions.append(&mut carved);
            if !remaining.is_empty() {
                regions.push((BTreeSet::from([property.clone()]), remaining));
            }
        }

        let mut results: BTreeMap<BTreeSet<P>, Vec<Contour>> = BTreeMap::new();
        for (set, shapes) in regions {
            let polylines = results.entry(set).or_default();
            for shape in &shapes {
                if shape.is_empty() || shape[0].len() < 3 {
                    continue;
                }
                polylines.push(keyhole_shape(shape));
            }
        }
        results
    }
}

/// Normalizes one property's contributions into disjoint shapes under the
/// non-zero fill rule, so overlapping solids fuse and holes carve.
fn self_union(contours: &[Contour]) -> Shapes {
    if contours.is_empty() {
        return Vec::new();
    }
    let clip: Shape = Vec::new();
    contours.overlay(&clip, OverlayRule::Subject, FillRule::NonZero)
}

fn overlay_shapes(subject: &Shapes, clip: &Shapes, rule: OverlayRule) -> Shapes {
    subject.overlay(clip, rule, FillRule::NonZero)
}

/// Collapses an outer-plus-holes shape into a single self-touching polyline
/// by stitching each hole to the enclosing outline through a horizontal
/// bridge, traversed out and back along the same segment.
fn keyhole_shape(shape: &Shape) -> Contour {
    let mut outline = shape[0].clone();
    if contour_area(&outline) < 0.0 {
        outline.reverse();
    }

    let mut holes: Vec<Contour> = shape[1..]
        .iter()
        .filter(|hole| hole.len() >= 3)
        .cloned()
        .collect();
    for hole in &mut holes {
        if contour_area(hole) > 0.0 {
            hole.reverse();
        }
    }
    // Rightmost holes stitch first, so later bridges can land on earlier
    // hole contours without crossing them.
    holes.sort_by(|a, b| contour_max_x(b).total_cmp(&contour_max_x(a)));

    for hole in &holes {
        stitch_hole(&mut outline, hole);
    }
    outline
}

fn stitch_hole(outline: &mut Contour, hole: &[[f64; 2]]) {
    let mut anchor = 0;
    for (index, point) in hole.iter().enumerate() {
        if point[0] > hole[anchor][0] {
            anchor = index;
        }
    }
    let pivot = hole[anchor];

    // Cast a ray towards +x from the hole's rightmost vertex and find the
    // nearest crossing of the current outline.
    let count = outline.len();
    let mut best: Option<(usize, f64)> = None;
    for index in 0..count {
        let a = outline[index];
        let b = outline[(index + 1) % count];
        if (a[1] > pivot[1]) == (b[1] > pivot[1]) {
            continue;
        }
        let t = (pivot[1] - a[1]) / (b[1] - a[1]);
        let cross_x = a[0] + t * (b[0] - a[0]);
        if cross_x < pivot[0] {
            continue;
        }
        match best {
            Some((_, x)) if x <= cross_x => {}
            _ => best = Some((index, cross_x)),
        }
    }

    let (edge, bridge) = match best {
        Some((index, cross_x)) => (index, [cross_x, pivot[1]]),
        None => {
            // The ray found nothing to the right; fall back to the nearest
            // outline vertex so the hole is still preserved.
            log::warn!("keyhole bridge ray missed the outline, using nearest vertex");
            let mut nearest = 0;
            let mut nearest_dist = f64::MAX;
            for (index, point) in outline.iter().enumerate() {
                let dx = point[0] - pivot[0];
                let dy = point[1] - pivot[1];
                let dist = dx * dx + dy * dy;
                if dist < nearest_dist {
                    nearest_dist = dist;
                    nearest = index;
                }
            }
            (nearest, outline[nearest])
        }
    };

    let mut block: Contour = Vec::with_capacity(hole.len() + 3);
    block.push(bridge);
    block.extend_from_slice(&hole[anchor..]);
    block.extend_from_slice(&hole[..anchor]);
    block.push(pivot);
    block.push(bridge);
    let at = edge + 1;
    outline.splice(at..at, block);
}

/// Shoelace area: positive for counter-clockwise winding.
pub(crate) fn contour_area(contour: &[[f64; 2]]) -> f64 {
    let count = contour.len();
    if count < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for index in 0..count {
        let a = contour[index];
        let b = contour[(index + 1) % count];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    0.5 * sum
}

fn contour_max_x(contour: &[[f64; 2]]) -> f64 {
    contour
        .iter()
        .map(|point| point[0])
        .fold(f64::NEG_INFINITY, f64::max)
}
