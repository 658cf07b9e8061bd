//! Parallel merge driver.
//!
//! The sequential merge is a depth-first recursion over the task tree; its
//! only ordering constraint is that every child region completes before its
//! parent starts. That dependency graph maps directly onto structured
//! parallelism: recurse into the children of a node in parallel, join, then
//! run the node's own merge. Independent subtrees execute concurrently on a
//! worker pool sized to the requested thread count.

use polymerge_core::Scalar;
use rayon::prelude::*;

use crate::merger::{MergeProperty, PolygonMerger};
use crate::tree::TaskNode;

/// Drives one merge over a worker pool.
pub struct MergeRunner<'a, P: Ord, S: Scalar> {
    merger: &'a mut PolygonMerger<P, S>,
    threads: usize,
}

impl<'a, P: MergeProperty, S: Scalar> MergeRunner<'a, P, S> {
    /// Creates a runner for `merger` with a pool of `threads` workers.
    pub fn new(merger: &'a mut PolygonMerger<P, S>, threads: usize) -> Self {
        Self { merger, threads }
    }

    /// Runs the merge. A thread count of zero falls back to the sequential
    /// driver; the post-process pass always runs on the calling thread.
    pub fn run(&mut self) {
        if self.threads == 0 {
            log::debug!("thread count 0, merging sequentially");
            self.merger.merge();
            return;
        }

        self.merger.pre_process();
        let mut root = self.merger.take_tree();

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
        {
            Ok(pool) => {
                let merger: &PolygonMerger<P, S> = self.merger;
                pool.install(|| merge_region_parallel(merger, &mut root));
            }
            Err(error) => {
                log::warn!("worker pool unavailable ({error}), merging sequentially");
                self.merger.merge_region(&mut root);
            }
        }

        self.merger.install_tree(root);
        self.merger.post_process();
    }
}

fn merge_region_parallel<P: MergeProperty, S: Scalar>(
    merger: &PolygonMerger<P, S>,
    node: &mut TaskNode<P, S>,
) {
    node.children_mut()
        .par_iter_mut()
        .for_each(|child| merge_region_parallel(merger, child));
    merger.merge_node(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymerge_core::BBox2D;

    fn strip_merger(threshold: usize) -> PolygonMerger<u32, i64> {
        let mut merger = PolygonMerger::new();
        merger.set_settings(
            crate::merger::MergeSettings::new().with_merge_threshold(threshold),
        );
        // A strip of overlapping boxes crossing the tree's center lines,
        // plus a disjoint block of another property.
        for i in 0..12 {
            merger
                .add_box(1, BBox2D::new(i * 8, 40, i * 8 + 10, 50))
                .unwrap();
        }
        for i in 0..6 {
            merger
                .add_box(2, BBox2D::new(i * 8, 80, i * 8 + 10, 90))
                .unwrap();
        }
        merger
    }

    fn signature(merger: &PolygonMerger<u32, i64>) -> Vec<(u32, i64)> {
        let mut out: Vec<(u32, i64)> = merger
            .all_polygons()
            .iter()
            .map(|p| (p.property, p.covered_area().round() as i64))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut sequential = strip_merger(2);
        sequential.merge();

        let mut parallel = strip_merger(2);
        parallel.run_parallel(4);

        assert_eq!(signature(&sequential), signature(&parallel));
        assert_eq!(sequential.all_polygons().len(), 2);
    }

    #[test]
    fn test_zero_threads_runs_sequentially() {
        let mut merger = strip_merger(2);
        merger.run_parallel(0);
        assert_eq!(merger.all_polygons().len(), 2);
    }

    #[test]
    fn test_single_thread_pool() {
        let mut merger = strip_merger(0);
        merger.run_parallel(1);
        assert_eq!(merger.all_polygons().len(), 2);
    }
}
