//! This module defines [`Bvh`] and functions for building and traversing it.
//!
//! [`Bvh`]: struct.Bvh.html
//!

use log::debug;

use crate::aabb::{Aabb, Bounded, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::iter::BvhTraverseIterator;
use crate::bvh::bvh_node::{BvhNode, BvhNodeBuildArgs};
use crate::utils::joint_aabb_of_shapes;

/// The [`Bvh`] data structure. Contains the list of [`BvhNode`]s, laid out depth first:
/// the left child of an inner node directly follows it.
///
/// A [`Bvh`] does not own its shapes; it refers to them by their index in the slice it
/// was built from, which must be passed again to every traversal.
///
/// [`Bvh`]: struct.Bvh.html
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bvh<T: BHValue, const D: usize> {
    /// The list of nodes of the [`Bvh`].
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub nodes: Vec<BvhNode<T, D>>,
}

impl<T: BHValue, const D: usize> Default for Bvh<T, D> {
    fn default() -> Self {
        Bvh { nodes: Vec::new() }
    }
}

impl<T: BHValue, const D: usize> Bvh<T, D> {
    /// Prepares the node storage and the root build arguments, then hands them to `build`.
    fn build_with<S: Bounded<T, D>>(
        shapes: &[S],
        build: impl FnOnce(BvhNodeBuildArgs<S, T, D>),
    ) -> Bvh<T, D> {
        if shapes.is_empty() {
            return Bvh::default();
        }
        let mut indices = (0..shapes.len()).collect::<Vec<usize>>();
        let expected_node_count = shapes.len() * 2 - 1;
        let mut nodes = vec![BvhNode::create_dummy(); expected_node_count];

        let (aabb_bounds, centroid_bounds) = joint_aabb_of_shapes(&indices, shapes);
        build(BvhNodeBuildArgs {
            shapes,
            indices: &mut indices,
            nodes: &mut nodes,
            parent_index: 0,
            node_index: 0,
            aabb_bounds,
            centroid_bounds,
        });
        debug!(
            "built a hierarchy of {} nodes over {} shapes, bounds {}",
            nodes.len(),
            shapes.len(),
            aabb_bounds
        );
        Bvh { nodes }
    }

    /// Creates a new [`Bvh`] from the `shapes` slice.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use aabb_tree::bvh::Bvh;
    /// use nalgebra::Point3;
    ///
    /// let boxes = (0..10)
    ///     .map(|i| {
    ///         let p = Point3::new(i as f64, 0.0, 0.0);
    ///         Aabb::with_bounds(p, p + nalgebra::Vector3::new(0.5, 0.5, 0.5))
    ///     })
    ///     .collect::<Vec<_>>();
    /// let bvh = Bvh::build(&boxes);
    ///
    /// assert_eq!(bvh.nodes.len(), 19);
    /// assert!(bvh.is_consistent(&boxes));
    /// ```
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn build<S: Bounded<T, D>>(shapes: &[S]) -> Bvh<T, D> {
        Self::build_with(shapes, BvhNode::build)
    }

    /// Creates a new [`Bvh`] from the `shapes` slice, building large subtrees in parallel.
    /// The resulting [`Bvh`] is identical to the one built by [`Bvh::build`].
    ///
    /// [`Bvh`]: struct.Bvh.html
    /// [`Bvh::build`]: struct.Bvh.html#method.build
    ///
    #[cfg(feature = "rayon")]
    pub fn build_par<S: Bounded<T, D> + Sync>(shapes: &[S]) -> Bvh<T, D> {
        Self::build_with(shapes, BvhNode::build_par)
    }

    /// Returns `true` if the [`Bvh`] has no nodes.
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the [`Aabb`] of the root node, or an empty [`Aabb`] for an empty [`Bvh`].
    ///
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn root_aabb<S: Bounded<T, D>>(&self, shapes: &[S]) -> Aabb<T, D> {
        self.nodes
            .first()
            .map_or_else(Aabb::empty, |root| root.get_node_aabb(shapes))
    }

    /// Creates a [`BvhTraverseIterator`] to traverse the [`Bvh`].
    /// Yields the indices of the `shapes` whose [`Aabb`] and all of whose ancestors' [`Aabb`]s
    /// are intersected by `query`.
    ///
    /// [`Bvh`]: struct.Bvh.html
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    ///
    pub fn traverse_iterator<'bvh, 'shape, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>>(
        &'bvh self,
        query: &'bvh Query,
        shapes: &'shape [Shape],
    ) -> BvhTraverseIterator<'bvh, 'shape, T, D, Query, Shape> {
        BvhTraverseIterator::new(self, query, shapes)
    }

    /// Returns the depth of the node at `node_index`. The root node has depth `0`.
    pub fn depth(&self, node_index: usize) -> usize {
        let mut depth = 0;
        let mut index = node_index;
        while index != 0 {
            index = self.nodes[index].parent();
            depth += 1;
        }
        depth
    }

    /// Logs the [`Bvh`] in a tree-like visualization at debug level.
    ///
    /// [`Bvh`]: struct.Bvh.html
    ///
    pub fn pretty_print(&self) {
        if self.nodes.is_empty() {
            debug!("empty hierarchy");
            return;
        }
        let mut stack = vec![0];
        while let Some(node_index) = stack.pop() {
            let padding = " ".repeat(self.depth(node_index));
            match self.nodes[node_index] {
                BvhNode::Node {
                    parent_index,
                    child_l_index,
                    child_l_aabb,
                    child_r_index,
                    child_r_aabb,
                } => {
                    debug!("{}node={} parent={}", padding, node_index, parent_index);
                    debug!("{}{} child_l {}", padding, child_l_index, child_l_aabb);
                    debug!("{}{} child_r {}", padding, child_r_index, child_r_aabb);
                    stack.push(child_r_index);
                    stack.push(child_l_index);
                }
                BvhNode::Leaf {
                    parent_index,
                    shape_index,
                } => {
                    debug!("{}node={} parent={}", padding, node_index, parent_index);
                    debug!("{}shape\t{:?}", padding, shape_index);
                }
            }
        }
    }

    /// Verifies that the node at index `node_index` lies inside `expected_outer_aabb` and
    /// that its parent index is equal to `expected_parent_index`. Increases `node_count` by
    /// the number of visited nodes and marks the visited shapes in `shape_seen`.
    fn is_consistent_subtree<Shape: Bounded<T, D>>(
        &self,
        node_index: usize,
        expected_parent_index: usize,
        expected_outer_aabb: &Aabb<T, D>,
        node_count: &mut usize,
        shape_seen: &mut [bool],
        shapes: &[Shape],
    ) -> bool {
        *node_count += 1;
        match self.nodes[node_index] {
            BvhNode::Node {
                parent_index,
                child_l_index,
                child_l_aabb,
                child_r_index,
                child_r_aabb,
            } => {
                let correct_parent_index = expected_parent_index == parent_index;
                let correct_layout = child_l_index == node_index + 1
                    && child_r_index > child_l_index
                    && child_r_index < self.nodes.len();
                let left_aabb_in_parent =
                    expected_outer_aabb.approx_contains_aabb_eps(&child_l_aabb, T::epsilon());
                let right_aabb_in_parent =
                    expected_outer_aabb.approx_contains_aabb_eps(&child_r_aabb, T::epsilon());
                correct_parent_index
                    && correct_layout
                    && left_aabb_in_parent
                    && right_aabb_in_parent
                    && self.is_consistent_subtree(
                        child_l_index,
                        node_index,
                        &child_l_aabb,
                        node_count,
                        shape_seen,
                        shapes,
                    )
                    && self.is_consistent_subtree(
                        child_r_index,
                        node_index,
                        &child_r_aabb,
                        node_count,
                        shape_seen,
                        shapes,
                    )
            }
            BvhNode::Leaf {
                parent_index,
                shape_index,
            } => {
                let correct_parent_index = expected_parent_index == parent_index;
                let Some(seen) = shape_seen.get_mut(shape_index) else {
                    return false;
                };
                let first_visit = !*seen;
                *seen = true;
                let shape_aabb = shapes[shape_index].aabb();
                let shape_aabb_in_parent =
                    expected_outer_aabb.approx_contains_aabb_eps(&shape_aabb, T::epsilon());

                correct_parent_index && first_visit && shape_aabb_in_parent
            }
        }
    }

    /// Checks if all children of a node have the correct parent index, that there is no
    /// detached subtree and that every shape is referenced by exactly one leaf.
    /// Also checks if the [`Aabb`] hierarchy is consistent.
    ///
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    ///
    pub fn is_consistent<Shape: Bounded<T, D>>(&self, shapes: &[Shape]) -> bool {
        if self.nodes.is_empty() {
            return shapes.is_empty();
        }

        // The root node of the bvh is not bounded by anything.
        let space = Aabb::infinite();

        // The counter for all nodes.
        let mut node_count = 0;
        let mut shape_seen = vec![false; shapes.len()];
        let subtree_consistent =
            self.is_consistent_subtree(0, 0, &space, &mut node_count, &mut shape_seen, shapes);

        // Check if all nodes have been counted from the root node.
        // If this is false, it means we have a detached subtree.
        let is_connected = node_count == self.nodes.len();
        let all_shapes_seen = shape_seen.iter().all(|seen| *seen);
        subtree_consistent && is_connected && all_shapes_seen
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::bvh::{Bvh, BvhNode};
    use crate::testbase::{
        generate_aligned_boxes, random_triangle_soup, TAabb3, TBvh3, TPoint3, UnitBox,
    };

    #[test]
    /// Tests whether the building procedure succeeds in not failing.
    fn test_build_bvh() {
        let boxes = generate_aligned_boxes();
        let bvh = TBvh3::build(&boxes);
        assert_eq!(bvh.nodes.len(), 2 * boxes.len() - 1);
        assert!(bvh.is_consistent(&boxes));
    }

    #[test]
    fn test_build_empty_and_single() {
        let empty: [UnitBox; 0] = [];
        let bvh = TBvh3::build(&empty);
        assert!(bvh.is_empty());
        assert!(bvh.is_consistent(&empty));
        assert!(bvh.root_aabb(&empty).is_empty());
        bvh.pretty_print();

        let single = [UnitBox::new(7, TPoint3::new(1.0, 2.0, 3.0))];
        let bvh = TBvh3::build(&single);
        assert_eq!(
            bvh.nodes,
            vec![BvhNode::Leaf {
                parent_index: 0,
                shape_index: 0
            }]
        );
        assert!(bvh.is_consistent(&single));
    }

    #[test]
    /// Coincident shapes cannot be split by SAH and are halved instead.
    fn test_build_coincident_shapes() {
        let boxes = vec![
            TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0));
            100
        ];
        let bvh = TBvh3::build(&boxes);
        assert!(bvh.is_consistent(&boxes));
        assert!(bvh.nodes.iter().all(|node| node.parent() < bvh.nodes.len()));
        assert!((0..bvh.nodes.len()).all(|i| bvh.depth(i) <= 7));
    }

    #[test]
    /// Every inner node links to children that point back at it and whose boxes it stores.
    fn test_children_link_back_to_parent() {
        let triangles = random_triangle_soup(300, 11);
        let bvh = Bvh::build(&triangles);
        for (index, node) in bvh.nodes.iter().enumerate() {
            if let BvhNode::Node { .. } = node {
                let (left, right) = (node.child_l(), node.child_r());
                assert_ne!(left, right);
                assert_eq!(bvh.nodes[left].parent(), index);
                assert_eq!(bvh.nodes[right].parent(), index);
                assert_eq!(node.child_l_aabb(), bvh.nodes[left].get_node_aabb(&triangles));
                assert_eq!(node.child_r_aabb(), bvh.nodes[right].get_node_aabb(&triangles));
            }
        }
    }

    #[test]
    #[should_panic(expected = "Tried to get the left child of a leaf node.")]
    fn test_leaf_has_no_children() {
        let single = [UnitBox::new(0, TPoint3::origin())];
        TBvh3::build(&single).nodes[0].child_l();
    }

    #[test]
    fn test_root_aabb_covers_all_shapes() {
        let triangles = random_triangle_soup(500, 3);
        let bvh = Bvh::build(&triangles);
        let root = bvh.root_aabb(&triangles);
        assert!(triangles
            .iter()
            .all(|t| root.contains(&t.aabb().min) && root.contains(&t.aabb().max)));
        assert!(bvh.is_consistent(&triangles));
        bvh.pretty_print();
    }

    #[test]
    /// A broken parent index or a duplicated shape is detected.
    fn test_detects_inconsistency() {
        let boxes = generate_aligned_boxes();
        let bvh = TBvh3::build(&boxes);

        let mut broken = bvh.clone();
        let last = broken.nodes.len() - 1;
        if let BvhNode::Leaf { parent_index, .. } = &mut broken.nodes[last] {
            *parent_index += 1;
        }
        assert!(!broken.is_consistent(&boxes));

        let mut duplicated = bvh.clone();
        let leaves = duplicated
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.shape_index().map(|_| i))
            .collect::<Vec<_>>();
        let first_shape = duplicated.nodes[leaves[0]].shape_index();
        if let BvhNode::Leaf { shape_index, .. } = &mut duplicated.nodes[leaves[1]] {
            *shape_index = first_shape.unwrap_or_default();
        }
        assert!(!duplicated.is_consistent(&boxes));
    }

    #[cfg(feature = "rayon")]
    #[test]
    /// The parallel build produces exactly the sequential tree.
    fn test_build_par_matches_build() {
        let triangles = random_triangle_soup(5000, 11);
        let sequential = Bvh::build(&triangles);
        let parallel = Bvh::build_par(&triangles);
        assert_eq!(sequential, parallel);
        assert!(parallel.is_consistent(&triangles));
    }
}
