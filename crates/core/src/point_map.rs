//! Point-index maps: "have I seen this point, and at which index?"
//!
//! The hole reconstruction pass walks a polyline and needs to know whether
//! the current vertex appeared earlier in the walk. Integer coordinates can
//! be hashed exactly; floating coordinates go through an R*-tree and match
//! the nearest stored point within tolerance. Both implementations expose
//! the same contract and are selected statically through
//! [`Scalar::PointMap`](crate::scalar::Scalar::PointMap).

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::geom::Point2D;
use crate::scalar::Scalar;

/// Map from 2D points to sequence indices.
///
/// Inserting a point that is already present (under the element type's
/// equality) replaces the stored index, so the map always answers with the
/// most recent occurrence.
pub trait PointIndexMap<S: Scalar> {
    /// Removes all entries.
    fn clear(&mut self);

    /// Returns true if `point` is present.
    fn contains(&self, point: Point2D<S>) -> bool;

    /// Inserts `point -> index`, replacing any previous entry for `point`.
    fn insert(&mut self, point: Point2D<S>, index: usize);

    /// Returns the index stored for `point`, or `None` if absent.
    fn lookup(&self, point: Point2D<S>) -> Option<usize>;
}

/// Exact hash-backed map for integer coordinates.
#[derive(Debug, Default)]
pub struct HashPointMap<S> {
    map: HashMap<Point2D<S>, usize>,
}

impl<S: Scalar + Hash + Eq> PointIndexMap<S> for HashPointMap<S> {
    fn clear(&mut self) {
        self.map.clear();
    }

    fn contains(&self, point: Point2D<S>) -> bool {
        self.map.contains_key(&point)
    }

    fn insert(&mut self, point: Point2D<S>, index: usize) {
        self.map.insert(point, index);
    }

    fn lookup(&self, point: Point2D<S>) -> Option<usize> {
        self.map.get(&point).copied()
    }
}

/// Nearest-neighbor map for floating coordinates.
///
/// A query point is considered present when the nearest stored point matches
/// it within the element type's tolerance on both axes.
#[derive(Debug, Default)]
pub struct NearestPointMap<S> {
    tree: RTree<GeomWithData<[f64; 2], usize>>,
    _element: PhantomData<S>,
}

impl<S: Scalar> NearestPointMap<S> {
    fn coincident(stored: &[f64; 2], query: &[f64; 2]) -> bool {
        let tol = S::TOLERANCE.to_f64();
        (stored[0] - query[0]).abs() <= tol && (stored[1] - query[1]).abs() <= tol
    }
}

impl<S: Scalar> PointIndexMap<S> for NearestPointMap<S> {
    fn clear(&mut self) {
        self.tree = RTree::new();
    }

    fn contains(&self, point: Point2D<S>) -> bool {
        self.lookup(point).is_some()
    }

    fn insert(&mut self, point: Point2D<S>, index: usize) {
        let query = [point.x.to_f64(), point.y.to_f64()];
        let stale = self
            .tree
            .nearest_neighbor(&query)
            .filter(|entry| Self::coincident(entry.geom(), &query))
            .cloned();
        if let Some(stale) = stale {
            self.tree.remove(&stale);
        }
        self.tree.insert(GeomWithData::new(query, index));
    }

    fn lookup(&self, point: Point2D<S>) -> Option<usize> {
        let query = [point.x.to_f64(), point.y.to_f64()];
        self.tree
            .nearest_neighbor(&query)
            .filter(|entry| Self::coincident(entry.geom(), &query))
            .map(|entry| entry.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_contract() {
        let mut map: HashPointMap<i64> = HashPointMap::default();
        let p = Point2D::new(3, 4);
        assert!(!map.contains(p));
        assert_eq!(map.lookup(p), None);

        map.insert(p, 7);
        assert!(map.contains(p));
        assert_eq!(map.lookup(p), Some(7));

        // Re-insertion replaces the stored index.
        map.insert(p, 9);
        assert_eq!(map.lookup(p), Some(9));

        map.clear();
        assert!(!map.contains(p));
    }

    #[test]
    fn test_nearest_map_contract() {
        let mut map: NearestPointMap<f64> = NearestPointMap::default();
        let p = Point2D::new(1.0, 2.0);
        let q = Point2D::new(1.5, 2.0);
        assert!(!map.contains(p));

        map.insert(p, 0);
        map.insert(q, 1);
        assert_eq!(map.lookup(p), Some(0));
        assert_eq!(map.lookup(q), Some(1));

        // A nearby but distinct point is not present.
        assert!(!map.contains(Point2D::new(1.2, 2.0)));

        map.insert(p, 5);
        assert_eq!(map.lookup(p), Some(5));

        map.clear();
        assert!(!map.contains(p));
    }
}
