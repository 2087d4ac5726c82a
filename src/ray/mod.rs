//! This module holds the linear query shapes: the [`Ray`], the [`Line`] and the
//! [`LinearQuery`] trait they share with [`Segment`].
//!
//! [`Segment`]: ../shapes/struct.Segment.html
mod line;
mod linear;
mod ray_impl;

pub use self::line::*;
pub use self::linear::*;
pub use self::ray_impl::*;
