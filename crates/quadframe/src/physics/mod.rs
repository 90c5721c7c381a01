//! Physics module for collision detection
//!
//! Provides broad-phase detection through a region quadtree and exact
//! box/circle overlap tests for the narrow phase.

pub mod collision;
pub mod collision_system;

pub use collision::{overlaps, CollisionHandler, CollisionMask, CollisionShape, Contact, Reaction, ShapeKind};
pub use collision_system::CollisionWorld;
