//! Drawable attachments
//!
//! An attachment is an opaque visual (a sprite name plus a size) that either
//! follows an entity or sits at a fixed world position. The core never
//! interprets the sprite; it only resolves where the attachment is each
//! frame and hands that to the [`RenderSink`](super::RenderSink).

use crate::foundation::collections::{AttachmentId, EntityId};
use crate::foundation::math::Vec2;
use std::sync::Arc;

/// Visual attached to an entity or to the world
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Entity this follows; `None` means `offset` is a world position
    pub owner: Option<EntityId>,
    /// Offset from the owner's position
    pub offset: Vec2,
    /// Drawn size in world units
    pub size: Vec2,
    /// Opaque asset key understood by the render sink
    pub sprite: Arc<str>,
    /// Hidden attachments stay registered but are not drawn
    pub visible: bool,
}

impl Attachment {
    /// Create a visible attachment at the world origin
    pub fn new(sprite: impl Into<Arc<str>>, size: Vec2) -> Self {
        Self {
            owner: None,
            offset: Vec2::zeros(),
            size,
            sprite: sprite.into(),
            visible: true,
        }
    }

    /// Follow `owner`
    #[must_use]
    pub fn attached_to(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the offset (or world position when unowned)
    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Resolve the world position given the owner's position
    ///
    /// Returns `None` when the owner no longer exists.
    pub fn resolve(&self, owner_position: impl FnOnce(EntityId) -> Option<Vec2>) -> Option<Vec2> {
        match self.owner {
            Some(owner) => owner_position(owner).map(|position| position + self.offset),
            None => Some(self.offset),
        }
    }
}

/// One attachment resolved for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// Source attachment
    pub attachment: AttachmentId,
    /// Owning entity, if any
    pub owner: Option<EntityId>,
    /// World-space top-left position
    pub position: Vec2,
    /// Drawn size
    pub size: Vec2,
    /// Asset key
    pub sprite: Arc<str>,
}
