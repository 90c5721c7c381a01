//! Entity storage slot

use crate::behavior::Behavior;
use crate::foundation::math::Vec2;

pub use crate::foundation::collections::EntityId;

/// Everything the registry keeps for one entity
pub struct EntitySlot {
    name: String,
    position: Vec2,
    /// Taken out while the behavior runs, so it can borrow the engine
    behavior: Option<Box<dyn Behavior>>,
}

impl EntitySlot {
    pub(crate) fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            position,
            behavior: None,
        }
    }

    /// Name used in log output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current world position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Whether the behavior is present (false while it is running)
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub(crate) fn take_behavior(&mut self) -> Option<Box<dyn Behavior>> {
        self.behavior.take()
    }

    pub(crate) fn put_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behavior = Some(behavior);
    }
}

impl std::fmt::Debug for EntitySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySlot")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}
