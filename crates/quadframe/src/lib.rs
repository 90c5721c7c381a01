//! # Quadframe
//!
//! A frame-scheduled 2D simulation core: entities with per-frame behavior,
//! deferred add/remove queues, and quadtree-accelerated box/circle
//! collision detection.
//!
//! ## Features
//!
//! - **Frame Scheduler**: Dedicated loop thread with start/stop/step control
//! - **Deferred Mutation**: Adds and removes take effect at frame boundaries
//! - **Quadtree Collisions**: Broad phase by region quadtree, exact narrow phase
//! - **Pluggable Output**: Resolved drawables go to any [`RenderSink`](render::RenderSink)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quadframe::prelude::*;
//!
//! struct Drifter;
//!
//! impl Behavior for Drifter {
//!     fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError> {
//!         engine.add_owned_mask(me, CollisionShape::rect(0.0, 0.0, 16.0, 16.0));
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, me: EntityId, delta_time: f64) -> Result<(), BehaviorError> {
//!         engine.translate(me, Vec2::new(30.0 * delta_time, 0.0));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.add_entity(Drifter);
//!
//!     let mut scheduler = FrameScheduler::new(engine, LogSink::default());
//!     scheduler.start()?;
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//!     scheduler.stop()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::many_single_char_names)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod spatial;

mod behavior;
mod engine;

pub use behavior::{Behavior, BehaviorError};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig, SpaceConfig},
        ecs::{EntityId, FrameScheduler, SchedulerState},
        foundation::{
            collections::{AttachmentId, MaskId},
            math::{Rect, Vec2},
            time::{Clock, FrameStats, ManualClock, SystemClock},
        },
        input::{InputState, KeyCode, MouseButton, SharedInput},
        physics::{CollisionHandler, CollisionShape, Contact, Reaction},
        render::{Attachment, DrawItem, FrameInfo, LogSink, NullSink, RenderError, RenderSink},
        spatial::QuadtreeConfig,
        Behavior, BehaviorError, Engine, EngineError,
    };
}
