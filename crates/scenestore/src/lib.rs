//! # scenestore
//!
//! Read-only scene point sets for the cache simulator.
//!
//! ## Contents
//! - **PointSet**: immutable, flat coordinate storage loaded once from a
//!   comma separated file (csv reader, quoted and padded fields)
//! - **KdTree**: static nearest-neighbour index built once per point set

#![warn(missing_docs)]

mod error;
mod kdtree;
mod points;

pub use error::{Error, Result};
pub use kdtree::KdTree;
pub use points::PointSet;
