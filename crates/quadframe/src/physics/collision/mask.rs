//! Collision masks and the reactions they trigger

use super::shape::CollisionShape;
use crate::engine::Engine;
use crate::foundation::collections::{EntityId, MaskId};
use crate::foundation::math::Vec2;

/// One directed collision event
///
/// A pair of overlapping masks produces two contacts per frame, one for
/// each side, so `mask` is always the mask whose reaction is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Mask whose reaction is being invoked
    pub mask: MaskId,
    /// Entity that owns `mask`, if any
    pub owner: Option<EntityId>,
    /// Mask it overlapped
    pub other_mask: MaskId,
    /// Entity that owns `other_mask`, if any
    pub other: Option<EntityId>,
}

/// Receives collision events
///
/// Handlers get full engine access so they can move, spawn, or remove
/// entities; every such change is staged like any other request.
pub trait CollisionHandler: Send {
    /// Called once per overlapping pair per frame, for this side of the pair
    fn on_collision(&mut self, engine: &mut Engine, contact: &Contact);
}

impl<F> CollisionHandler for F
where
    F: FnMut(&mut Engine, &Contact) + Send,
{
    fn on_collision(&mut self, engine: &mut Engine, contact: &Contact) {
        self(engine, contact);
    }
}

/// What happens when a mask overlaps another
pub enum Reaction {
    /// Forward to the owning entity's behavior
    Owner,
    /// Call a dedicated handler
    Handler(Box<dyn CollisionHandler>),
    /// Participate in queries and as a collision partner, but never react
    Ignore,
}

impl Reaction {
    /// Wrap a handler
    pub fn handler(handler: impl CollisionHandler + 'static) -> Self {
        Self::Handler(Box::new(handler))
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => f.write_str("Owner"),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}

/// A shape that takes part in collision detection
#[derive(Debug)]
pub struct CollisionMask {
    owner: Option<EntityId>,
    shape: CollisionShape,
    reaction: Reaction,
}

impl CollisionMask {
    /// Create a mask
    ///
    /// With an owner, `shape` is an offset from the owner's position. Without
    /// one, it is in world space.
    pub fn new(owner: Option<EntityId>, shape: CollisionShape, reaction: Reaction) -> Self {
        Self { owner, shape, reaction }
    }

    /// Owning entity
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Local-space shape
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Replace the local-space shape
    pub fn set_shape(&mut self, shape: CollisionShape) {
        self.shape = shape;
    }

    /// Reaction attached to this mask
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    /// Swap the reaction out, leaving [`Reaction::Ignore`] behind
    pub(crate) fn take_reaction(&mut self) -> Reaction {
        std::mem::replace(&mut self.reaction, Reaction::Ignore)
    }

    pub(crate) fn restore_reaction(&mut self, reaction: Reaction) {
        self.reaction = reaction;
    }

    /// World-space shape given a lookup for owner positions
    ///
    /// An owner that no longer resolves is treated as no owner at all.
    pub fn world_shape<P>(&self, positions: P) -> CollisionShape
    where
        P: Fn(EntityId) -> Option<Vec2>,
    {
        match self.owner.and_then(positions) {
            Some(position) => self.shape.translated(position),
            None => self.shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;

    #[test]
    fn test_world_shape_follows_owner() {
        let mut owners: SlotMap<EntityId, Vec2> = SlotMap::with_key();
        let owner = owners.insert(Vec2::new(100.0, 40.0));
        let mask = CollisionMask::new(
            Some(owner),
            CollisionShape::rect(-5.0, -5.0, 10.0, 10.0),
            Reaction::Owner,
        );

        let world = mask.world_shape(|id| owners.get(id).copied());
        assert_eq!(world, CollisionShape::rect(95.0, 35.0, 10.0, 10.0));
    }

    #[test]
    fn test_stale_owner_uses_local_shape() {
        let mut owners: SlotMap<EntityId, Vec2> = SlotMap::with_key();
        let owner = owners.insert(Vec2::new(100.0, 40.0));
        owners.remove(owner);

        let shape = CollisionShape::circle(1.0, 2.0, 3.0);
        let mask = CollisionMask::new(Some(owner), shape, Reaction::Ignore);
        assert_eq!(mask.world_shape(|id| owners.get(id).copied()), shape);
    }

    #[test]
    fn test_take_reaction_leaves_ignore() {
        let mut mask = CollisionMask::new(
            None,
            CollisionShape::rect(0.0, 0.0, 1.0, 1.0),
            Reaction::handler(|_: &mut Engine, _: &Contact| {}),
        );
        let taken = mask.take_reaction();
        assert!(matches!(taken, Reaction::Handler(_)));
        assert!(matches!(mask.reaction(), Reaction::Ignore));

        mask.restore_reaction(taken);
        assert!(matches!(mask.reaction(), Reaction::Handler(_)));
    }
}
