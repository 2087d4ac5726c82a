use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::bucket::{with_buckets, NUM_BUCKETS};
use crate::utils::{joint_aabb_of_shapes, real, Bucket};

/// Subtrees with more shapes than this are built in parallel by [`Bvh::build_par`].
///
/// [`Bvh::build_par`]: struct.Bvh.html#method.build_par
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 64;

/// The [`BvhNode`] enum that describes a node in a [`Bvh`].
/// It's either a leaf node and references a shape (by holding its index)
/// or a regular node that has two child nodes.
/// The non-leaf node stores the [`Aabb`]s of its children.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
/// [`Bvh`]: struct.Bvh.html
///
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BvhNode<T: BHValue, const D: usize> {
    /// Leaf node.
    Leaf {
        /// The node's parent.
        parent_index: usize,

        /// The shape contained in this leaf.
        shape_index: usize,
    },
    /// Inner node.
    Node {
        /// The node's parent.
        parent_index: usize,

        /// Index of the left subtree's root node.
        child_l_index: usize,

        /// The convex hull of the shapes' [`Aabb`]'s in child_l.
        child_l_aabb: Aabb<T, D>,

        /// Index of the right subtree's root node.
        child_r_index: usize,

        /// The convex hull of the shapes' [`Aabb`]'s in child_r.
        child_r_aabb: Aabb<T, D>,
    },
}

impl<T: BHValue, const D: usize> PartialEq for BvhNode<T, D> {
    fn eq(&self, other: &BvhNode<T, D>) -> bool {
        match (self, other) {
            (
                &BvhNode::Node {
                    parent_index: self_parent_index,
                    child_l_index: self_child_l_index,
                    child_l_aabb: self_child_l_aabb,
                    child_r_index: self_child_r_index,
                    child_r_aabb: self_child_r_aabb,
                },
                &BvhNode::Node {
                    parent_index: other_parent_index,
                    child_l_index: other_child_l_index,
                    child_l_aabb: other_child_l_aabb,
                    child_r_index: other_child_r_index,
                    child_r_aabb: other_child_r_aabb,
                },
            ) => {
                self_parent_index == other_parent_index
                    && self_child_l_index == other_child_l_index
                    && self_child_r_index == other_child_r_index
                    && self_child_l_aabb == other_child_l_aabb
                    && self_child_r_aabb == other_child_r_aabb
            }
            (
                &BvhNode::Leaf {
                    parent_index: self_parent_index,
                    shape_index: self_shape_index,
                },
                &BvhNode::Leaf {
                    parent_index: other_parent_index,
                    shape_index: other_shape_index,
                },
            ) => self_parent_index == other_parent_index && self_shape_index == other_shape_index,
            _ => false,
        }
    }
}

impl<T: BHValue, const D: usize> BvhNode<T, D> {
    /// The build function needs slots for nodes whose data is not available yet.
    /// A dummy created by this function is overwritten later on.
    pub(crate) fn create_dummy() -> BvhNode<T, D> {
        BvhNode::Leaf {
            parent_index: 0,
            shape_index: 0,
        }
    }

    /// Returns the index of the parent node.
    pub fn parent(&self) -> usize {
        match *self {
            BvhNode::Node { parent_index, .. } | BvhNode::Leaf { parent_index, .. } => parent_index,
        }
    }

    /// Returns the index of the left child node.
    pub fn child_l(&self) -> usize {
        match *self {
            BvhNode::Node { child_l_index, .. } => child_l_index,
            _ => panic!("Tried to get the left child of a leaf node."),
        }
    }

    /// Returns the [`Aabb`] of the left child node.
    pub fn child_l_aabb(&self) -> Aabb<T, D> {
        match *self {
            BvhNode::Node { child_l_aabb, .. } => child_l_aabb,
            _ => panic!("Tried to get the left child's `Aabb` of a leaf node."),
        }
    }

    /// Returns the index of the right child node.
    pub fn child_r(&self) -> usize {
        match *self {
            BvhNode::Node { child_r_index, .. } => child_r_index,
            _ => panic!("Tried to get the right child of a leaf node."),
        }
    }

    /// Returns the [`Aabb`] of the right child node.
    pub fn child_r_aabb(&self) -> Aabb<T, D> {
        match *self {
            BvhNode::Node { child_r_aabb, .. } => child_r_aabb,
            _ => panic!("Tried to get the right child's `Aabb` of a leaf node."),
        }
    }

    /// Gets the [`Aabb`] for a [`BvhNode`].
    /// Returns the shape's [`Aabb`] for leaves, and the joined [`Aabb`] of
    /// the two children's [`Aabb`]'s for non-leaves.
    pub fn get_node_aabb<Shape: Bounded<T, D>>(&self, shapes: &[Shape]) -> Aabb<T, D> {
        match *self {
            BvhNode::Node {
                child_l_aabb,
                child_r_aabb,
                ..
            } => child_l_aabb.join(&child_r_aabb),
            BvhNode::Leaf { shape_index, .. } => shapes[shape_index].aabb(),
        }
    }

    /// Returns the index of the shape contained within the node if is a leaf,
    /// or [`None`] if it is an interior node.
    pub fn shape_index(&self) -> Option<usize> {
        match *self {
            BvhNode::Leaf { shape_index, .. } => Some(shape_index),
            _ => None,
        }
    }

    /// Builds a [`BvhNode`] recursively using SAH partitioning.
    ///
    /// [`BvhNode`]: enum.BvhNode.html
    ///
    pub(crate) fn build<S: Bounded<T, D>>(args: BvhNodeBuildArgs<S, T, D>) {
        if let Some((left, right)) = Self::prep_build(args) {
            Self::build(left);
            Self::build(right);
        }
    }

    /// Builds a [`BvhNode`] recursively using SAH partitioning, handing large subtrees to
    /// the rayon thread pool. Produces the same nodes as [`BvhNode::build`].
    ///
    /// [`BvhNode`]: enum.BvhNode.html
    ///
    #[cfg(feature = "rayon")]
    pub(crate) fn build_par<S: Bounded<T, D> + Sync>(args: BvhNodeBuildArgs<S, T, D>) {
        if let Some((left, right)) = Self::prep_build(args) {
            if left.node_count() + right.node_count() > PARALLEL_THRESHOLD {
                rayon::join(|| Self::build_par(left), || Self::build_par(right));
            } else {
                Self::build(left);
                Self::build(right);
            }
        }
    }

    /// Writes the node for `args` and returns the arguments for building its two subtrees,
    /// or `None` for a leaf.
    fn prep_build<'a, S: Bounded<T, D>>(
        args: BvhNodeBuildArgs<'a, S, T, D>,
    ) -> Option<(BvhNodeBuildArgs<'a, S, T, D>, BvhNodeBuildArgs<'a, S, T, D>)> {
        let BvhNodeBuildArgs {
            shapes,
            indices,
            nodes,
            parent_index,
            node_index,
            aabb_bounds,
            centroid_bounds,
        } = args;
        // If there is only one element left, don't split anymore
        if indices.len() == 1 {
            nodes[0] = BvhNode::Leaf {
                parent_index,
                shape_index: indices[0],
            };
            return None;
        }

        // Find the axis along which the shapes are spread the most.
        let split_axis = centroid_bounds.largest_axis();
        let split_axis_size = centroid_bounds.max[split_axis] - centroid_bounds.min[split_axis];

        // The following `if` partitions `indices` for recursively calling `Bvh::build`.
        let (
            (child_l_aabb, child_l_centroid, child_l_indices),
            (child_r_aabb, child_r_centroid, child_r_indices),
        ) = if !(split_axis_size >= T::epsilon() && split_axis_size.is_finite()) {
            // In this branch the shapes lie too close together so that splitting them in a
            // sensible way is not possible. Instead we just split the list of shapes in half.
            let (child_l_indices, child_r_indices) = indices.split_at_mut(indices.len() / 2);
            let (child_l_aabb, child_l_centroid) = joint_aabb_of_shapes(child_l_indices, shapes);
            let (child_r_aabb, child_r_centroid) = joint_aabb_of_shapes(child_r_indices, shapes);

            (
                (child_l_aabb, child_l_centroid, child_l_indices),
                (child_r_aabb, child_r_centroid, child_r_indices),
            )
        } else {
            BvhNode::build_buckets(
                shapes,
                indices,
                split_axis,
                split_axis_size,
                &centroid_bounds,
                &aabb_bounds,
            )
        };

        let left_len = child_l_indices.len() * 2 - 1;
        let child_l_index = node_index + 1;
        let child_r_index = child_l_index + left_len;

        // Construct the actual data structure and replace the dummy node.
        nodes[0] = BvhNode::Node {
            parent_index,
            child_l_aabb,
            child_l_index,
            child_r_aabb,
            child_r_index,
        };

        let next_nodes = &mut nodes[1..];
        let (l_nodes, r_nodes) = next_nodes.split_at_mut(left_len);

        Some((
            BvhNodeBuildArgs {
                shapes,
                indices: child_l_indices,
                nodes: l_nodes,
                parent_index: node_index,
                node_index: child_l_index,
                aabb_bounds: child_l_aabb,
                centroid_bounds: child_l_centroid,
            },
            BvhNodeBuildArgs {
                shapes,
                indices: child_r_indices,
                nodes: r_nodes,
                parent_index: node_index,
                node_index: child_r_index,
                aabb_bounds: child_r_aabb,
                centroid_bounds: child_r_centroid,
            },
        ))
    }

    #[allow(clippy::type_complexity)]
    fn build_buckets<'a, S: Bounded<T, D>>(
        shapes: &[S],
        indices: &'a mut [usize],
        split_axis: usize,
        split_axis_size: T,
        centroid_bounds: &Aabb<T, D>,
        aabb_bounds: &Aabb<T, D>,
    ) -> (
        (Aabb<T, D>, Aabb<T, D>, &'a mut [usize]),
        (Aabb<T, D>, Aabb<T, D>, &'a mut [usize]),
    ) {
        with_buckets(move |bucket_assignments| {
            let mut buckets = [Bucket::empty(); NUM_BUCKETS];

            // In this branch the `split_axis_size` is large enough to perform meaningful splits.
            // We start by assigning the shapes to `Bucket`s.
            let scale = real::<T>(NUM_BUCKETS as f64 - 0.01);
            for idx in indices.iter() {
                let shape_aabb = shapes[*idx].aabb();
                let shape_center = shape_aabb.center();

                // Get the relative position of the shape centroid `[0.0..1.0]`.
                let bucket_num_relative =
                    (shape_center[split_axis] - centroid_bounds.min[split_axis]) / split_axis_size;

                // Convert that to the actual `Bucket` number.
                let bucket_num = (bucket_num_relative * scale)
                    .to_usize()
                    .unwrap_or(0)
                    .min(NUM_BUCKETS - 1);

                // Extend the selected `Bucket` and add the index to the actual bucket.
                buckets[bucket_num].add_aabb(&shape_aabb);
                bucket_assignments[bucket_num].push(*idx);
            }

            // Compute the costs for each configuration and select the best configuration.
            // The first and the last bucket are never empty, so neither side of a split is.
            // Boxes flat in all but one dimension have no area, measure their length instead.
            let use_area = aabb_bounds.surface_area() > T::zero();
            let measure = |aabb: &Aabb<T, D>| {
                if use_area {
                    aabb.surface_area()
                } else {
                    aabb.size().iter().fold(T::zero(), |acc, x| acc + *x)
                }
            };
            let mut min_bucket = 0;
            let mut min_cost = T::infinity();
            for i in 0..(NUM_BUCKETS - 1) {
                let (l_buckets, r_buckets) = buckets.split_at(i + 1);
                let child_l = l_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);
                let child_r = r_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);

                let cost = real::<T>(child_l.size as f64) * measure(&child_l.aabb)
                    + real::<T>(child_r.size as f64) * measure(&child_r.aabb);
                if cost < min_cost {
                    min_bucket = i;
                    min_cost = cost;
                }
            }
            let (l_buckets, r_buckets) = buckets.split_at(min_bucket + 1);
            let child_l = l_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);
            let child_r = r_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);

            // Join together all index buckets.
            let (l_assignments, r_assignments) = bucket_assignments.split_at(min_bucket + 1);
            let (child_l_indices, child_r_indices) = indices.split_at_mut(child_l.size);
            for (slot, index) in child_l_indices
                .iter_mut()
                .zip(l_assignments.iter().flatten())
            {
                *slot = *index;
            }
            for (slot, index) in child_r_indices
                .iter_mut()
                .zip(r_assignments.iter().flatten())
            {
                *slot = *index;
            }

            (
                (child_l.aabb, child_l.centroid, child_l_indices),
                (child_r.aabb, child_r.centroid, child_r_indices),
            )
        })
    }
}

/// Holds the arguments for building one subtree: the shapes it covers and the slice of
/// nodes it is laid out in, depth first.
pub(crate) struct BvhNodeBuildArgs<'a, S, T: BHValue, const D: usize> {
    pub(crate) shapes: &'a [S],
    pub(crate) indices: &'a mut [usize],
    pub(crate) nodes: &'a mut [BvhNode<T, D>],
    pub(crate) parent_index: usize,
    pub(crate) node_index: usize,
    pub(crate) aabb_bounds: Aabb<T, D>,
    pub(crate) centroid_bounds: Aabb<T, D>,
}

impl<S, T: BHValue, const D: usize> BvhNodeBuildArgs<'_, S, T, D> {
    /// Returns the number of shapes that are part of this build.
    #[cfg(feature = "rayon")]
    pub(crate) fn node_count(&self) -> usize {
        self.indices.len()
    }
}
