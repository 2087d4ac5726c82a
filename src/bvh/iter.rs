use crate::aabb::{Bounded, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{Bvh, BvhNode};

/// Iterator to traverse a [`Bvh`] depth first, yielding the indices of the shapes whose
/// [`Aabb`] is intersected by the query.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
pub struct BvhTraverseIterator<
    'bvh,
    'shape,
    T: BHValue,
    const D: usize,
    Query: IntersectsAabb<T, D>,
    Shape: Bounded<T, D>,
> {
    /// Reference to the [`Bvh`] to traverse
    bvh: &'bvh Bvh<T, D>,
    /// Reference to the input query
    query: &'bvh Query,
    /// Reference to the input shapes array
    shapes: &'shape [Shape],
    /// Traversal stack. Grows with the depth of the tree, which is unbounded for
    /// degenerate inputs.
    stack: Vec<usize>,
    /// Position of the iterator in bvh.nodes
    node_index: usize,
    /// Whether or not we have a valid node (or leaf)
    has_node: bool,
}

impl<'bvh, 'shape, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>>
    BvhTraverseIterator<'bvh, 'shape, T, D, Query, Shape>
{
    /// Creates a new [`BvhTraverseIterator`]
    pub fn new(bvh: &'bvh Bvh<T, D>, query: &'bvh Query, shapes: &'shape [Shape]) -> Self {
        let mut iterator = BvhTraverseIterator {
            bvh,
            query,
            shapes,
            stack: Vec::new(),
            node_index: 0,
            has_node: false,
        };
        iterator.has_node = iterator.starts_at_root();
        iterator
    }

    /// Decides whether traversal starts at the root.
    ///
    /// An empty [`Bvh`] yields nothing. A root leaf is only visited if the query intersects
    /// its shape's [`Aabb`], since no parent node has tested it. Any other root is always
    /// visited, its children are tested when descending.
    ///
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    fn starts_at_root(&self) -> bool {
        match self.bvh.nodes.first() {
            Some(BvhNode::Leaf { shape_index, .. }) => self
                .query
                .intersects_aabb(&self.shapes[*shape_index].aabb()),
            Some(_) => true,
            None => false,
        }
    }

    /// Attempt to move to the left node child of the current node.
    /// If it is a leaf, or the query does not intersect the node [`Aabb`], `has_node` will become false.
    fn move_left(&mut self) {
        match self.bvh.nodes[self.node_index] {
            BvhNode::Node {
                child_l_index,
                ref child_l_aabb,
                ..
            } => {
                if self.query.intersects_aabb(child_l_aabb) {
                    self.node_index = child_l_index;
                    self.has_node = true;
                } else {
                    self.has_node = false;
                }
            }
            BvhNode::Leaf { .. } => {
                self.has_node = false;
            }
        }
    }

    /// Attempt to move to the right node child of the current node.
    /// If it is a leaf, or the query does not intersect the node [`Aabb`], `has_node` will become false.
    fn move_right(&mut self) {
        match self.bvh.nodes[self.node_index] {
            BvhNode::Node {
                child_r_index,
                ref child_r_aabb,
                ..
            } => {
                if self.query.intersects_aabb(child_r_aabb) {
                    self.node_index = child_r_index;
                    self.has_node = true;
                } else {
                    self.has_node = false;
                }
            }
            BvhNode::Leaf { .. } => {
                self.has_node = false;
            }
        }
    }
}

impl<T: BHValue, const D: usize, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>> Iterator
    for BvhTraverseIterator<'_, '_, T, D, Query, Shape>
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.has_node {
                // If we have any node, save it and attempt to move to its left child.
                self.stack.push(self.node_index);
                self.move_left();
            } else {
                // Go back up the stack and see if a node or leaf was pushed.
                self.node_index = self.stack.pop()?;
                match self.bvh.nodes[self.node_index] {
                    BvhNode::Node { .. } => {
                        // If a node was pushed, now attempt to move to its right child.
                        self.move_right();
                    }
                    BvhNode::Leaf { shape_index, .. } => {
                        // We previously pushed a leaf node. This is the "visit" of the in-order traverse.
                        // Next time we call `next()` we try to pop the stack again.
                        self.has_node = false;
                        return Some(shape_index);
                    }
                }
            }
        }
    }
}
