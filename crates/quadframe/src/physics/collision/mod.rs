//! Collision shapes, masks, and reactions
//!
//! # Architecture
//!
//! - **Local Space Storage**: Mask shapes are stored relative to their owner
//! - **On-Demand Transformation**: Shapes move to world space only during tests
//! - **Staged Lifetime**: Masks join and leave the live set at frame boundaries
//!
//! # Key Types
//!
//! - [`CollisionShape`] - Box or circle geometry
//! - [`CollisionMask`] - Shape plus optional owner and a reaction
//! - [`Contact`] - One directed collision event delivered to a reaction

pub mod mask;
pub mod shape;

pub use mask::{CollisionHandler, CollisionMask, Contact, Reaction};
pub use shape::{overlaps, CollisionShape, ShapeKind};
