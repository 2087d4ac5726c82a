//! This module defines a [`Bvh`], the bounding volume hierarchy the [`AabbTree`] is built on.
//!
//! [`Bvh`]: struct.Bvh.html
//! [`AabbTree`]: ../tree/struct.AabbTree.html
//!

mod best_first;
mod bucket;
mod bvh_impl;
mod bvh_node;
mod iter;

pub use self::best_first::*;
pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::iter::*;
