//! # Polymerge
//!
//! Property-aware parallel 2D polygon merge engine for layout-style
//! workloads (electronic design, GIS) where millions of small rectangles
//! and polygons must be merged deterministically.
//!
//! Overlapping or touching polygons that carry the *same* property are
//! unioned into a single polygon. Regions where polygons with *different*
//! properties overlap are either reported as conflict records or collapsed
//! onto one canonical property, selected by
//! [`MergeSettings::check_property_diff`].
//!
//! ## Quick Start
//!
//! ```rust
//! use polymerge::{BBox2D, MergeSettings, PolygonMerger};
//!
//! let mut merger: PolygonMerger<u32, i64> = PolygonMerger::new();
//! merger.set_settings(MergeSettings::new().with_merge_threshold(256));
//!
//! merger.add_box(1, BBox2D::new(0, 0, 10, 10)).unwrap();
//! merger.add_box(1, BBox2D::new(10, 0, 20, 10)).unwrap();
//! merger.merge();
//!
//! let polygons = merger.all_polygons();
//! assert_eq!(polygons.len(), 1);
//! assert_eq!(polygons[0].covered_area(), 200.0);
//! ```
//!
//! ## How It Works
//!
//! Ingested records are normalized (outer ring counter-clockwise, holes
//! clockwise) and partitioned into a spatial task tree. Each region merges
//! depth-first, children before parents; sibling subtrees whose regions
//! touch are merged jointly so unions spanning partition boundaries are
//! never missed. Region contents go through a property-keyed boolean union
//! whose output polylines are split back into outer-plus-holes records by
//! the hole reconstruction pass.
//!
//! [`PolygonMerger::run_parallel`] executes the same recursion on a worker
//! pool: independent subtrees merge concurrently, and every child region
//! still completes before its parent starts.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod boolean;
pub mod connectivity;
pub mod geometry;
pub mod merger;
pub mod rebuild;
pub mod runner;
pub mod simplify;
pub mod tree;

// Re-exports
pub use boolean::PropertyMerge;
pub use connectivity::connectivity_extraction;
pub use geometry::TaggedPolygon;
pub use merger::{MergeProperty, MergeSettings, ObjectHandle, PolygonMerger, PropDiff};
pub use rebuild::rebuild_polygon;
pub use runner::MergeRunner;
pub use simplify::{clean_polygon, clean_polygons, clean_ring};
pub use tree::TaskNode;

pub use polymerge_core::{BBox2D, Error, Point2D, Result, Scalar};
