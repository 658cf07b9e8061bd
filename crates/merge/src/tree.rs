//! Hierarchical spatial partition of the merge work.
//!
//! Each node covers an axis-aligned region and owns the polygon records
//! that "live at its level": records whose bounding box does not fit
//! entirely inside one child quadrant stay with the node. Every record is
//! referenced by exactly one node at any time; the merge pass drains a
//! subtree, merges, and re-seats the results through [`TaskNode::rebuild`].

use polymerge_core::{BBox2D, Scalar};

use crate::geometry::TaggedPolygon;

/// Recursion guard for pathological inputs such as thousands of coincident
/// boxes, which fit the same quadrant at every level.
const MAX_DEPTH: usize = 16;

/// One node of the merge task tree. The tree root is itself a node.
#[derive(Debug)]
pub struct TaskNode<P, S: Scalar> {
    bbox: BBox2D<S>,
    threshold: usize,
    objs: Vec<TaggedPolygon<P, S>>,
    children: Vec<TaskNode<P, S>>,
}

impl<P, S: Scalar> Default for TaskNode<P, S> {
    fn default() -> Self {
        Self {
            bbox: BBox2D::invalid(),
            threshold: 0,
            objs: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl<P, S: Scalar> TaskNode<P, S> {
    /// Creates an empty node covering `bbox`.
    pub fn with_bbox(bbox: BBox2D<S>) -> Self {
        Self {
            bbox,
            ..Self::default()
        }
    }

    /// Sets the region this node covers.
    pub fn set_bbox(&mut self, bbox: BBox2D<S>) {
        self.bbox = bbox;
    }

    /// Region covered by this node.
    pub fn bbox(&self) -> &BBox2D<S> {
        &self.bbox
    }

    /// (Re)builds the subtree from a flat list. Leaves hold at most
    /// `threshold` records; `threshold == 0` keeps everything in one bucket.
    pub fn build(&mut self, items: Vec<TaggedPolygon<P, S>>, threshold: usize) {
        self.threshold = threshold;
        self.objs.clear();
        self.children.clear();
        self.split(items, 0);
    }

    /// Re-seats a flat list with the threshold recorded by the last
    /// [`build`](TaskNode::build).
    pub fn rebuild(&mut self, items: Vec<TaggedPolygon<P, S>>) {
        let threshold = self.threshold;
        self.build(items, threshold);
    }

    fn split(&mut self, items: Vec<TaggedPolygon<P, S>>, depth: usize) {
        if self.threshold == 0 || items.len() <= self.threshold || depth >= MAX_DEPTH {
            self.objs = items;
        } else {
            let (mid_x, mid_y) = self.bbox.center();
            let mid_x = S::from_f64(mid_x);
            let mid_y = S::from_f64(mid_y);
            let quadrants = [
                BBox2D::new(self.bbox.min_x, self.bbox.min_y, mid_x, mid_y),
                BBox2D::new(mid_x, self.bbox.min_y, self.bbox.max_x, mid_y),
                BBox2D::new(self.bbox.min_x, mid_y, mid_x, self.bbox.max_y),
                BBox2D::new(mid_x, mid_y, self.bbox.max_x, self.bbox.max_y),
            ];

            let mut buckets: [Vec<TaggedPolygon<P, S>>; 4] = Default::default();
            let mut stay = Vec::new();
            for item in items {
                let bbox = item.bbox();
                match quadrants.iter().position(|q| q.contains_box(&bbox)) {
                    Some(which) => buckets[which].push(item),
                    None => stay.push(item),
                }
            }
            self.objs = stay;

            for (which, bucket) in buckets.into_iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }
                let mut child = TaskNode::with_bbox(quadrants[which]);
                child.threshold = self.threshold;
                child.split(bucket, depth + 1);
                self.children.push(child);
            }
        }

        // Shrink to contents: sibling subtrees must report disjoint regions
        // when their contents are disjoint, regardless of how the split
        // planes carved the parent.
        let mut tight = BBox2D::invalid();
        for obj in &self.objs {
            tight.union(&obj.bbox());
        }
        for child in &self.children {
            tight.union(child.bbox());
        }
        self.bbox = tight;
    }

    /// Child nodes.
    pub fn children(&self) -> &[TaskNode<P, S>] {
        &self.children
    }

    /// Child nodes, mutable.
    pub fn children_mut(&mut self) -> &mut [TaskNode<P, S>] {
        &mut self.children
    }

    /// Returns true if this node has child nodes.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Records held directly at this node.
    pub fn objs(&self) -> &[TaggedPolygon<P, S>] {
        &self.objs
    }

    /// Returns true if this node holds records directly.
    pub fn has_objs(&self) -> bool {
        !self.objs.is_empty()
    }

    /// Total records in this subtree.
    pub fn object_count(&self) -> usize {
        self.objs.len()
            + self
                .children
                .iter()
                .map(TaskNode::object_count)
                .sum::<usize>()
    }

    /// Returns true if the subtree holds no records.
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty() && self.children.iter().all(TaskNode::is_empty)
    }

    /// Collects references to every record in this subtree, node before
    /// children, children in build order.
    pub fn collect_objects<'a>(&'a self, out: &mut Vec<&'a TaggedPolygon<P, S>>) {
        out.extend(self.objs.iter());
        for child in &self.children {
            child.collect_objects(out);
        }
    }

    /// Removes and returns every record in this subtree, in the same order
    /// as [`collect_objects`](TaskNode::collect_objects). Child nodes are
    /// discarded.
    pub fn drain_objects(&mut self) -> Vec<TaggedPolygon<P, S>> {
        let mut out = std::mem::take(&mut self.objs);
        for child in &mut self.children {
            out.extend(child.drain_objects());
        }
        self.children.clear();
        out
    }

    /// Applies `f` to every record in this subtree.
    pub fn for_each_mut<F: FnMut(&mut TaggedPolygon<P, S>)>(&mut self, f: &mut F) {
        for obj in &mut self.objs {
            f(obj);
        }
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }

    /// Drops every record and child node.
    pub fn clear(&mut self) {
        self.objs.clear();
        self.children.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymerge_core::Point2D;

    fn boxed(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> TaggedPolygon<u32, i64> {
        TaggedPolygon::new(
            1,
            vec![
                Point2D::new(min_x, min_y),
                Point2D::new(max_x, min_y),
                Point2D::new(max_x, max_y),
                Point2D::new(min_x, max_y),
            ],
        )
    }

    fn corner_items() -> Vec<TaggedPolygon<u32, i64>> {
        vec![
            boxed(1, 1, 2, 2),
            boxed(90, 1, 95, 5),
            boxed(1, 90, 5, 95),
            boxed(90, 90, 95, 95),
        ]
    }

    #[test]
    fn test_zero_threshold_keeps_one_bucket() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 0);
        assert!(!node.has_children());
        assert_eq!(node.objs().len(), 4);
    }

    #[test]
    fn test_split_sends_items_to_quadrants() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 1);
        assert_eq!(node.children().len(), 4);
        assert!(!node.has_objs());
        assert_eq!(node.object_count(), 4);
    }

    #[test]
    fn test_straddling_item_stays_at_node() {
        let mut items = corner_items();
        items.push(boxed(40, 40, 60, 60));
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(items, 1);
        assert_eq!(node.objs().len(), 1);
        assert_eq!(node.object_count(), 5);
    }

    #[test]
    fn test_child_bboxes_are_tight() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 1);
        let bboxes: Vec<_> = node.children().iter().map(|c| *c.bbox()).collect();
        assert!(bboxes.contains(&BBox2D::new(1, 1, 2, 2)));
        assert!(bboxes.contains(&BBox2D::new(90, 90, 95, 95)));
        // Tight sibling regions are pairwise disjoint here.
        for (i, a) in bboxes.iter().enumerate() {
            for b in bboxes.iter().skip(i + 1) {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_drain_empties_subtree() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 1);
        let drained = node.drain_objects();
        assert_eq!(drained.len(), 4);
        assert!(node.is_empty());
        assert!(!node.has_children());
    }

    #[test]
    fn test_rebuild_reuses_threshold() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 1);
        let drained = node.drain_objects();
        node.rebuild(drained);
        assert_eq!(node.children().len(), 4);
        assert_eq!(node.object_count(), 4);
    }

    #[test]
    fn test_coincident_items_terminate() {
        let items: Vec<_> = (0..64).map(|_| boxed(10, 10, 11, 11)).collect();
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(items, 2);
        assert_eq!(node.object_count(), 64);
    }

    #[test]
    fn test_collect_matches_drain_order() {
        let mut node = TaskNode::with_bbox(BBox2D::new(0i64, 0, 100, 100));
        node.build(corner_items(), 1);
        let mut collected = Vec::new();
        node.collect_objects(&mut collected);
        let snapshot: Vec<_> = collected.into_iter().cloned().collect();
        let drained = node.drain_objects();
        assert_eq!(snapshot, drained);
    }
}
