//! The property-aware polygon merger.
//!
//! Lifecycle: [`add_box`](PolygonMerger::add_box) /
//! [`add_polygon`](PolygonMerger::add_polygon) /
//! [`add_polygon_with_holes`](PolygonMerger::add_polygon_with_holes)
//! accumulate normalized records, then [`merge`](PolygonMerger::merge) (or
//! [`run_parallel`](PolygonMerger::run_parallel)) partitions them into the
//! task tree and merges region by region, children before parents. Results
//! are read back with [`all_polygons`](PolygonMerger::all_polygons) or
//! [`take_all_polygons`](PolygonMerger::take_all_polygons).

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use polymerge_core::{BBox2D, Point2D, Result, Scalar};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::boolean::{Contour, PropertyMerge};
use crate::connectivity::connectivity_extraction;
use crate::geometry::TaggedPolygon;
use crate::rebuild::rebuild_polygon;
use crate::runner::MergeRunner;
use crate::simplify;
use crate::tree::TaskNode;

/// Property tag requirements: hashable, equality-comparable, orderable, and
/// shareable across merge workers.
pub trait MergeProperty: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static> MergeProperty for T {}

/// Merge behavior switches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeSettings {
    /// Run the point cleanup pass before and after merging.
    pub clean_polygon_points: bool,

    /// Report regions covered by distinct properties instead of collapsing
    /// them to a canonical property.
    pub check_property_diff: bool,

    /// Drop output polygons below `tiny_solid_area` after merging.
    pub ignore_tiny_solid: bool,

    /// Drop holes below `tiny_holes_area` whenever a region was merged.
    pub ignore_tiny_holes: bool,

    /// Minimum surviving solid area.
    pub tiny_solid_area: f64,

    /// Minimum surviving hole area.
    pub tiny_holes_area: f64,

    /// Point cleanup distance tolerance.
    pub clean_point_dist: f64,

    /// Task-tree leaf capacity; `0` keeps all records in one bucket.
    pub merge_threshold: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            clean_polygon_points: false,
            check_property_diff: false,
            ignore_tiny_solid: false,
            ignore_tiny_holes: false,
            tiny_solid_area: 0.0,
            tiny_holes_area: 0.0,
            clean_point_dist: 0.0,
            merge_threshold: 1024,
        }
    }
}

impl MergeSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the point cleanup pass with the given distance tolerance.
    pub fn with_clean_points(mut self, dist: f64) -> Self {
        self.clean_polygon_points = true;
        self.clean_point_dist = dist;
        self
    }

    /// Sets property-conflict reporting.
    pub fn with_check_property_diff(mut self, check: bool) -> Self {
        self.check_property_diff = check;
        self
    }

    /// Enables the tiny-solid filter with the given area threshold.
    pub fn with_ignore_tiny_solid(mut self, area: f64) -> Self {
        self.ignore_tiny_solid = true;
        self.tiny_solid_area = area;
        self
    }

    /// Enables the tiny-holes filter with the given area threshold.
    pub fn with_ignore_tiny_holes(mut self, area: f64) -> Self {
        self.ignore_tiny_holes = true;
        self.tiny_holes_area = area;
        self
    }

    /// Sets the task-tree leaf capacity.
    pub fn with_merge_threshold(mut self, threshold: usize) -> Self {
        self.merge_threshold = threshold;
        self
    }
}

/// One recorded property conflict: the set of properties involved and the
/// polylines outlining the region they jointly cover.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropDiff<P: Ord, S> {
    pub properties: BTreeSet<P>,
    pub outlines: Vec<Vec<Point2D<S>>>,
}

/// Handle to an ingested record, valid until the next merge or clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub(crate) usize);

impl ObjectHandle {
    /// Position of the record in the pre-merge input list.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Property-aware 2D polygon merger.
///
/// `P` is the user-chosen property tag, `S` the coordinate element type
/// (`i32`, `i64`, `f32` or `f64`).
pub struct PolygonMerger<P: Ord, S: Scalar> {
    bbox: BBox2D<S>,
    datas: Vec<TaggedPolygon<P, S>>,
    tree: TaskNode<P, S>,
    settings: MergeSettings,
    property_map: Mutex<HashMap<P, P>>,
    prop_diffs: Mutex<Vec<PropDiff<P, S>>>,
}

impl<P: MergeProperty, S: Scalar> Default for PolygonMerger<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MergeProperty, S: Scalar> PolygonMerger<P, S> {
    /// Creates an empty merger with default settings.
    pub fn new() -> Self {
        Self {
            bbox: BBox2D::invalid(),
            datas: Vec::new(),
            tree: TaskNode::default(),
            settings: MergeSettings::default(),
            property_map: Mutex::new(HashMap::new()),
            prop_diffs: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the merge settings.
    pub fn set_settings(&mut self, settings: MergeSettings) {
        self.settings = settings;
    }

    /// Current merge settings.
    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Ingests an axis-aligned box.
    pub fn add_box(&mut self, property: P, bbox: BBox2D<S>) -> Result<ObjectHandle> {
        let solid = vec![
            Point2D::new(bbox.min_x, bbox.min_y),
            Point2D::new(bbox.max_x, bbox.min_y),
            Point2D::new(bbox.max_x, bbox.max_y),
            Point2D::new(bbox.min_x, bbox.max_y),
        ];
        self.add_polygon_data(TaggedPolygon::new(property, solid))
    }

    /// Ingests a simple polygon.
    pub fn add_polygon(&mut self, property: P, solid: Vec<Point2D<S>>) -> Result<ObjectHandle> {
        self.add_polygon_data(TaggedPolygon::new(property, solid))
    }

    /// Ingests a polygon with holes.
    pub fn add_polygon_with_holes(
        &mut self,
        property: P,
        solid: Vec<Point2D<S>>,
        holes: Vec<Vec<Point2D<S>>>,
    ) -> Result<ObjectHandle> {
        self.add_polygon_data(TaggedPolygon::new(property, solid).with_holes(holes))
    }

    fn add_polygon_data(&mut self, mut data: TaggedPolygon<P, S>) -> Result<ObjectHandle> {
        data.validate()?;
        data.normalize();
        self.bbox.union(&data.bbox());
        self.datas.push(data);
        Ok(ObjectHandle(self.datas.len() - 1))
    }

    /// Merges all ingested records on the calling thread.
    pub fn merge(&mut self) {
        self.pre_process();
        let mut root = mem::take(&mut self.tree);
        self.merge_region(&mut root);
        self.tree = root;
        self.post_process();
    }

    /// Merges all ingested records on a worker pool of `threads` workers.
    /// A thread count of zero falls back to the sequential merge.
    pub fn run_parallel(&mut self, threads: usize) {
        MergeRunner::new(self, threads).run();
    }

    /// References to every current polygon: the merged tree contents, or
    /// the not-yet-partitioned input list if no merge has run.
    pub fn all_polygons(&self) -> Vec<&TaggedPolygon<P, S>> {
        let mut out = Vec::new();
        self.tree.collect_objects(&mut out);
        if out.is_empty() {
            out.extend(self.datas.iter());
        }
        out
    }

    /// Takes ownership of every current polygon, leaving the merger empty
    /// of geometry (settings and the property map are kept).
    pub fn take_all_polygons(&mut self) -> Vec<TaggedPolygon<P, S>> {
        let mut out = self.tree.drain_objects();
        if out.is_empty() {
            out.append(&mut self.datas);
        }
        out
    }

    /// Aggregate bounding box over all ingested records.
    pub fn bbox(&self) -> &BBox2D<S> {
        &self.bbox
    }

    /// Property conflicts recorded by the last merge. Only populated when
    /// [`MergeSettings::check_property_diff`] is set.
    pub fn prop_diff_areas(&mut self) -> &[PropDiff<P, S>] {
        self.prop_diffs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .as_slice()
    }

    /// The current property resolution map: every key has been collapsed
    /// into its value during merging.
    pub fn property_map(&mut self) -> &HashMap<P, P> {
        self.property_map
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops all records, conflicts and resolutions.
    pub fn clear(&mut self) {
        self.datas.clear();
        self.tree = TaskNode::default();
        self.property_map
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.prop_diffs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.bbox = BBox2D::invalid();
    }

    pub(crate) fn pre_process(&mut self) {
        if self.settings.clean_polygon_points && self.settings.clean_point_dist > 0.0 {
            self.clean_polygons();
        }
        self.build_task_tree();
    }

    pub(crate) fn post_process(&mut self) {
        if self.settings.clean_polygon_points && self.settings.clean_point_dist > 0.0 {
            self.clean_polygons();
        }
        if self.settings.ignore_tiny_solid && self.settings.tiny_solid_area > 0.0 {
            self.filter_out_tiny_solids();
        }
    }

    pub(crate) fn take_tree(&mut self) -> TaskNode<P, S> {
        mem::take(&mut self.tree)
    }

    pub(crate) fn install_tree(&mut self, tree: TaskNode<P, S>) {
        self.tree = tree;
    }

    fn build_task_tree(&mut self) {
        // Records may sit in the tree already when merge is re-entered
        // after further ingestion; fold them back into one flat list.
        let mut items = self.tree.drain_objects();
        items.append(&mut self.datas);
        self.tree.set_bbox(self.bbox);
        self.tree.build(items, self.settings.merge_threshold);
    }

    fn clean_polygons(&mut self) {
        let dist = self.settings.clean_point_dist;
        simplify::clean_polygons(&mut self.datas, dist);
        self.tree
            .for_each_mut(&mut |polygon| simplify::clean_polygon(polygon, dist));
    }

    /// Merges one region: children first, then overlapping sibling groups
    /// jointly, then everything held in this subtree.
    pub(crate) fn merge_region(&self, node: &mut TaskNode<P, S>) {
        for child in node.children_mut() {
            self.merge_region(child);
        }
        self.merge_node(node);
    }

    /// The region-local part of [`merge_region`](Self::merge_region),
    /// entered once every child of `node` has completed.
    pub(crate) fn merge_node(&self, node: &mut TaskNode<P, S>) {
        let mut merged = false;
        let mut merged_objs: Vec<TaggedPolygon<P, S>> = Vec::new();

        // Sibling-overlap pass: children whose regions touch must merge
        // jointly, or unions spanning child boundaries are missed.
        let groups = overlapped_child_groups(node);
        for group in groups.iter().filter(|group| group.len() > 1) {
            let mut objs = Vec::new();
            for &which in group {
                objs.extend(node.children_mut()[which].drain_objects());
            }
            self.merge_polygons(&mut objs);
            merged_objs.append(&mut objs);
            merged = true;
        }

        let has_local = node.has_objs();
        let mut all_objs = node.drain_objects();
        all_objs.append(&mut merged_objs);

        if has_local {
            self.merge_polygons(&mut all_objs);
            merged = true;
        }

        if merged {
            self.filter_out_tiny_holes(&mut all_objs);
        }
        node.rebuild(all_objs);
    }

    /// Boolean-merges a flat list in place, resolving properties through
    /// the property map and reconstructing holes on every output region.
    pub(crate) fn merge_polygons(&self, polygons: &mut Vec<TaggedPolygon<P, S>>) {
        loop {
            if polygons.len() <= 1 {
                return;
            }

            let before = polygons.len();
            let mut accumulator = PropertyMerge::new();
            {
                let map = lock(&self.property_map);
                for data in polygons.drain(..) {
                    let property = map
                        .get(&data.property)
                        .cloned()
                        .unwrap_or_else(|| data.property.clone());
                    accumulator.insert(&data.solid, property.clone(), false);
                    for hole in &data.holes {
                        accumulator.insert(hole, property.clone(), true);
                    }
                }
            }

            let results = accumulator.merge();
            let mut collapsed = false;
            for (properties, outlines) in results {
                if properties.len() > 1 {
                    if self.settings.check_property_diff {
                        lock(&self.prop_diffs).push(PropDiff {
                            properties,
                            outlines: outlines.iter().map(|o| to_ring::<S>(o)).collect(),
                        });
                        continue;
                    }
                    // Collapse every non-canonical property onto the first.
                    let mut iter = properties.iter();
                    if let Some(canonical) = iter.next().cloned() {
                        let mut map = lock(&self.property_map);
                        for property in iter {
                            map.insert(property.clone(), canonical.clone());
                        }
                    }
                    collapsed = true;
                }

                let Some(property) = properties.first() else {
                    continue;
                };
                for outline in &outlines {
                    polygons.push(rebuild_polygon(to_ring::<S>(outline), property.clone()));
                }
            }

            if !collapsed {
                log::debug!("merged {} polygons into {}", before, polygons.len());
                return;
            }
            // Freshly collapsed properties must fold into their canonical
            // representative before this region's result is final.
            log::debug!(
                "collapsed conflicting properties, remerging {} polygons",
                polygons.len()
            );
        }
    }

    fn filter_out_tiny_holes(&self, polygons: &mut [TaggedPolygon<P, S>]) {
        if self.settings.ignore_tiny_holes && self.settings.tiny_holes_area > 0.0 {
            for polygon in polygons {
                polygon.remove_tiny_holes(self.settings.tiny_holes_area);
            }
        }
    }

    fn filter_out_tiny_solids(&mut self) {
        let threshold = self.settings.tiny_solid_area;
        let mut polygons = self.take_all_polygons();
        let before = polygons.len();
        polygons.retain(|polygon| !polygon.covered_area().approx_lt(threshold));
        if polygons.len() != before {
            log::debug!("dropped {} tiny polygons", before - polygons.len());
        }
        self.tree.build(polygons, 0);
    }
}

/// Groups of child indices whose bounding boxes mutually overlap.
fn overlapped_child_groups<P, S: Scalar>(node: &TaskNode<P, S>) -> Vec<Vec<usize>> {
    if node.children().len() < 2 {
        return Vec::new();
    }
    connectivity_extraction(node.children(), |child| *child.bbox())
}

fn to_ring<S: Scalar>(contour: &Contour) -> Vec<Point2D<S>> {
    contour
        .iter()
        .map(|&[x, y]| Point2D::new(S::from_f64(x), S::from_f64(y)))
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
