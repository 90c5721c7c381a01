//! Entity behavior trait and lifecycle errors

use crate::engine::{Engine, EngineError};
use crate::foundation::collections::EntityId;
use crate::physics::CollisionHandler;
use thiserror::Error;

/// Per-entity game logic
///
/// Implement this trait for anything that lives in the simulation. The
/// engine owns the behavior once it is added and drives it from the frame
/// loop.
pub trait Behavior: Send {
    /// Called exactly once, synchronously, when the entity is added
    ///
    /// The entity is not live yet: it will receive its first `update` on the
    /// frame after the one in which it was added. This is the place to set
    /// the initial position and register masks or attachments.
    fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError>;

    /// Called once per frame while the entity is live
    ///
    /// # Arguments
    /// * `engine` - Engine context; structural changes are staged
    /// * `me` - Handle of this entity
    /// * `delta_time` - Seconds since the previous frame
    fn update(&mut self, engine: &mut Engine, me: EntityId, delta_time: f64) -> Result<(), BehaviorError>;

    /// Receiver for collisions of masks using [`Reaction::Owner`](crate::physics::Reaction::Owner)
    fn collision_handler(&mut self) -> Option<&mut dyn CollisionHandler> {
        None
    }

    /// Name used in log output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Behavior-level errors
///
/// Returning one from `update` is logged with the entity's identity; the
/// frame carries on with the next entity.
#[derive(Error, Debug)]
pub enum BehaviorError {
    /// Engine error propagated to behavior level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom behavior error
    #[error("Behavior error: {0}")]
    Custom(String),

    /// The entity found itself in a state it cannot handle
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}
