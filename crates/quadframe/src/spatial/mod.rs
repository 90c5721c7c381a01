//! Spatial partitioning data structures
//!
//! Provides efficient spatial indexing for broad-phase collision detection
//! and point/box queries in 2D space.

mod quadtree;

pub use quadtree::{Quadtree, QuadtreeConfig, QuadtreeEntry, QuadtreeNode};
