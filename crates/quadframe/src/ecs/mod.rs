//! Entity registry and frame scheduling
//!
//! Entities are behaviors with a position, addressed by generational
//! handles. The registry stages every add/remove until the next frame
//! boundary; the scheduler drives those boundaries.

pub mod entity;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use entity::{EntityId, EntitySlot};
pub use registry::{EntityRegistry, PendingReport};
pub use scheduler::{Command, FrameScheduler, SchedulerState};
