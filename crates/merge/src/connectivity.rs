//! Bounding-box connectivity extraction.
//!
//! Builds the "bounding boxes overlap or touch" adjacency relation over a
//! sequence of items with an R*-tree probe per item, then reduces it to
//! connected components. O(n log n) instead of the pairwise O(n^2) scan.

use polymerge_core::{BBox2D, Scalar, SparseIndexGraph};
use rstar::primitives::Rectangle;
use rstar::{RTree, RTreeObject, AABB};

/// A rectangle tagged with its item index, suitable for R*-tree insertion.
#[derive(Debug, Clone)]
struct IndexedRectangle {
    rectangle: Rectangle<[f64; 2]>,
    index: usize,
}

impl IndexedRectangle {
    fn new(min: [f64; 2], max: [f64; 2], index: usize) -> Self {
        Self {
            rectangle: Rectangle::from_corners(min, max),
            index,
        }
    }
}

impl RTreeObject for IndexedRectangle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.rectangle.envelope()
    }
}

/// Connected components of the bbox-overlap relation over `items`.
///
/// Components are ordered by their minimum item index; indices within each
/// component are ascending. Isolated items appear as singleton components.
pub fn connectivity_extraction<T, S, F>(items: &[T], bbox_of: F) -> Vec<Vec<usize>>
where
    S: Scalar,
    F: Fn(&T) -> BBox2D<S>,
{
    let mut graph = SparseIndexGraph::with_vertices(items.len());

    if items.len() > 1 {
        let entries: Vec<IndexedRectangle> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let bbox = bbox_of(item);
                IndexedRectangle::new(
                    [bbox.min_x.to_f64(), bbox.min_y.to_f64()],
                    [bbox.max_x.to_f64(), bbox.max_y.to_f64()],
                    index,
                )
            })
            .collect();
        let tree = RTree::bulk_load(entries);

        for entry in tree.iter() {
            for other in tree.locate_in_envelope_intersecting(&entry.envelope()) {
                if other.index != entry.index {
                    graph.add_edge(entry.index, other.index);
                }
            }
        }
    }

    graph.connected_components()
}
