use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{Bvh, BvhNode};

thread_local! {
    /// Thread local heaps for doing a best first traversal of the bvh. A pool rather than a
    /// single heap, so that a traversal started from within a callback gets its own heap.
    static HEAP: RefCell<Vec<BinaryHeap<BvhTraversalRes>>> = RefCell::new(Default::default());
}

/// A node waiting to be visited, keyed by a lower bound of what its subtree can yield
#[derive(Debug, Clone, Copy)]
pub struct BvhTraversalRes {
    /// Lower bound of the subtree, smallest first
    pub key: f64,
    /// bvh node to test next
    pub node_index: usize,
}

impl BvhTraversalRes {
    /// Create new instance of BvhTraversalRes
    pub fn new<T: BHValue>(node_index: usize, key: T) -> Self {
        Self {
            node_index,
            key: key.to_f64().unwrap_or(f64::NAN),
        }
    }
}

impl Ord for BvhTraversalRes {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .partial_cmp(&other.key)
            .unwrap_or(Ordering::Equal)
            .reverse()
    }
}
impl PartialOrd for BvhTraversalRes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BvhTraversalRes {
    fn eq(&self, other: &Self) -> bool {
        self.node_index == other.node_index
    }
}

impl Eq for BvhTraversalRes {}

impl<T: BHValue, const D: usize> Bvh<T, D> {
    /// Walk the [`Bvh`] with the closest nodes first.
    ///
    /// `test_aabb` returns a lower bound of the value any shape inside the box can have, or
    /// `None` if the box can be skipped. `test_shape` returns the value of a shape together
    /// with a payload. Only values strictly below `bound` and below every earlier accepted
    /// value are accepted; the last accepted one is returned.
    ///
    /// [`Bvh`]: struct.Bvh.html
    pub fn traverse_best_first_with_heap<Res>(
        &self,
        bound: T,
        mut test_aabb: impl FnMut(&Aabb<T, D>) -> Option<T>,
        mut test_shape: impl FnMut(usize) -> Option<(T, Res)>,
        heap: &mut BinaryHeap<BvhTraversalRes>,
    ) -> Option<(T, Res)> {
        heap.clear();
        if self.nodes.is_empty() {
            return None;
        }
        heap.push(BvhTraversalRes::new(0, T::neg_infinity()));

        let mut result = None;
        let mut curr_min = bound;

        while let Some(next) = heap.pop() {
            // Subtrees tied with the current best may still hold a shape whose rounded value
            // is strictly smaller, only strictly worse ones are cut.
            if curr_min.to_f64().is_some_and(|best| best < next.key) {
                break;
            }

            match self.nodes[next.node_index] {
                BvhNode::Leaf { shape_index, .. } => {
                    if let Some((value, res)) = test_shape(shape_index) {
                        if value < curr_min {
                            curr_min = value;
                            result = Some((value, res));
                        }
                    }
                }
                BvhNode::Node {
                    child_l_index,
                    child_l_aabb,
                    child_r_index,
                    child_r_aabb,
                    ..
                } => {
                    if let Some(l_min) = test_aabb(&child_l_aabb).filter(|l| *l <= curr_min) {
                        heap.push(BvhTraversalRes::new(child_l_index, l_min))
                    }
                    if let Some(r_min) = test_aabb(&child_r_aabb).filter(|r| *r <= curr_min) {
                        heap.push(BvhTraversalRes::new(child_r_index, r_min))
                    }
                }
            }
        }
        result
    }

    /// Traverses best first using a thread local heap
    pub fn traverse_best_first<Res>(
        &self,
        bound: T,
        test_aabb: impl FnMut(&Aabb<T, D>) -> Option<T>,
        test_shape: impl FnMut(usize) -> Option<(T, Res)>,
    ) -> Option<(T, Res)> {
        let mut heap = HEAP.with(|h| h.borrow_mut().pop().unwrap_or_default());
        let res = self.traverse_best_first_with_heap(bound, test_aabb, test_shape, &mut heap);

        HEAP.with(|h| h.borrow_mut().push(heap));
        res
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::testbase::{generate_aligned_boxes, TBvh3, TPoint3};

    #[test]
    fn test_best_first_finds_nearest_box() {
        let boxes = generate_aligned_boxes();
        let bvh = TBvh3::build(&boxes);
        let query = TPoint3::new(3.2, 4.0, 0.0);
        let mut visited = 0;
        let found = bvh.traverse_best_first(
            f64::INFINITY,
            |aabb| Some(aabb.min_distance_squared(&query)),
            |index| {
                visited += 1;
                Some((boxes[index].aabb().min_distance_squared(&query), boxes[index].id))
            },
        );
        assert_eq!(found, Some((3.5 * 3.5, 3)));
        assert!(visited < boxes.len());
    }

    #[test]
    fn test_best_first_respects_bound() {
        let boxes = generate_aligned_boxes();
        let bvh = TBvh3::build(&boxes);
        let query = TPoint3::new(0.0, 10.0, 0.0);
        let found = bvh.traverse_best_first(
            1.0,
            |aabb| Some(aabb.min_distance_squared(&query)),
            |index| Some((boxes[index].aabb().min_distance_squared(&query), index)),
        );
        assert_eq!(found, None);
    }

    #[test]
    fn test_best_first_nested_traversals() {
        let boxes = generate_aligned_boxes();
        let bvh = TBvh3::build(&boxes);
        let query = TPoint3::new(-7.0, 0.0, 2.0);
        let found = bvh.traverse_best_first(
            f64::INFINITY,
            |aabb| Some(aabb.min_distance_squared(&query)),
            |index| {
                // A traversal started from a callback takes its own heap.
                let inner = bvh.traverse_best_first(
                    f64::INFINITY,
                    |aabb| Some(aabb.min_distance_squared(&query)),
                    |inner_index| Some((boxes[inner_index].aabb().min_distance_squared(&query), ())),
                );
                inner.map(|(value, ())| (value, boxes[index].id))
            },
        );
        assert_eq!(found.map(|(value, _)| value), Some(1.5 * 1.5));
    }
}
