//! # Polymerge Core
//!
//! Foundation types for the polymerge property-aware polygon merge engine.
//!
//! This crate provides the numeric and topological building blocks that are
//! shared by the merge engine:
//!
//! - **Scalar predicates**: [`Scalar`] - tolerance-aware comparisons that are
//!   exact for integer coordinates and epsilon-based for floating ones
//! - **Geometry primitives**: [`Point2D`], [`BBox2D`]
//! - **Point-index maps**: [`PointIndexMap`] with a hash-backed implementation
//!   for integer coordinates and a nearest-neighbor implementation for
//!   floating coordinates
//! - **Index graph**: [`SparseIndexGraph`] - undirected graph over dense
//!   indices with connected-component extraction
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geom;
pub mod graph;
pub mod point_map;
pub mod scalar;

// Re-exports
pub use error::{Error, Result};
pub use geom::{BBox2D, Point2D};
pub use graph::SparseIndexGraph;
pub use point_map::{HashPointMap, NearestPointMap, PointIndexMap};
pub use scalar::Scalar;
