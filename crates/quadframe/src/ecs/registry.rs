//! Entity and attachment registry
//!
//! Slots are allocated immediately so handles are usable right away, but
//! membership in the live lists only changes in [`EntityRegistry::apply_pending`].

use super::entity::{EntityId, EntitySlot};
use crate::behavior::Behavior;
use crate::foundation::collections::{AttachmentId, SlotMap, StagedSet};
use crate::foundation::math::Vec2;
use crate::render::Attachment;

/// What changed during one [`EntityRegistry::apply_pending`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingReport {
    /// Entities whose slots were released
    pub entities_removed: usize,
    /// Attachments whose slots were released
    pub attachments_removed: usize,
    /// Live entities afterwards
    pub live_entities: usize,
    /// Live attachments afterwards
    pub live_attachments: usize,
}

/// Registry of entities and drawable attachments
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: SlotMap<EntityId, EntitySlot>,
    staged: StagedSet<EntityId>,
    attachments: SlotMap<AttachmentId, Attachment>,
    staged_attachments: StagedSet<AttachmentId>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot without staging it
    pub(crate) fn allocate(&mut self, name: impl Into<String>, position: Vec2) -> EntityId {
        self.entities.insert(EntitySlot::new(name, position))
    }

    /// Queue an allocated entity to become live at the next boundary
    pub(crate) fn stage_add(&mut self, id: EntityId) {
        if self.entities.contains_key(id) {
            self.staged.stage_add(id);
        }
    }

    /// Request removal of an entity
    ///
    /// Returns `false` for stale handles and repeated requests.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(id) {
            return false;
        }
        self.staged.stage_remove(id)
    }

    /// Commit queued additions then removals, for entities and attachments
    pub fn apply_pending(&mut self) -> PendingReport {
        let mut report = PendingReport::default();

        for id in self.staged.apply() {
            if self.entities.remove(id).is_some() {
                report.entities_removed += 1;
            }
        }
        for id in self.staged_attachments.apply() {
            if self.attachments.remove(id).is_some() {
                report.attachments_removed += 1;
            }
        }

        report.live_entities = self.staged.len();
        report.live_attachments = self.staged_attachments.len();
        report
    }

    /// Whether any request is waiting for the next boundary
    pub fn has_pending(&self) -> bool {
        self.staged.has_pending() || self.staged_attachments.has_pending()
    }

    /// Whether the handle still refers to an allocated slot
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Whether the entity is in the live list
    pub fn is_live(&self, id: EntityId) -> bool {
        self.staged.is_live(id)
    }

    /// Live entities in activation order
    pub fn live(&self) -> &[EntityId] {
        self.staged.live()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether no entity is live
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Slot for `id`
    pub fn get(&self, id: EntityId) -> Option<&EntitySlot> {
        self.entities.get(id)
    }

    /// Position of `id`; `None` for stale handles
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(id).map(EntitySlot::position)
    }

    /// Move `id`; returns `false` for stale handles
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.entities.get_mut(id) {
            Some(slot) => {
                slot.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Name of `id`
    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(id).map(EntitySlot::name)
    }

    pub(crate) fn take_behavior(&mut self, id: EntityId) -> Option<Box<dyn Behavior>> {
        self.entities.get_mut(id).and_then(EntitySlot::take_behavior)
    }

    /// Put a behavior back after it ran; `false` (and dropped) if the slot is gone
    pub(crate) fn restore_behavior(&mut self, id: EntityId, behavior: Box<dyn Behavior>) -> bool {
        match self.entities.get_mut(id) {
            Some(slot) => {
                slot.put_behavior(behavior);
                true
            }
            None => false,
        }
    }

    /// Register an attachment; it becomes live at the next boundary
    pub fn add_attachment(&mut self, attachment: Attachment) -> AttachmentId {
        let id = self.attachments.insert(attachment);
        self.staged_attachments.stage_add(id);
        id
    }

    /// Request removal of an attachment
    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        if !self.attachments.contains_key(id) {
            return false;
        }
        self.staged_attachments.stage_remove(id)
    }

    /// Attachment for `id`
    pub fn attachment(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.get(id)
    }

    /// Attachment for `id`, mutably
    pub fn attachment_mut(&mut self, id: AttachmentId) -> Option<&mut Attachment> {
        self.attachments.get_mut(id)
    }

    /// Live attachments in activation order
    pub fn live_attachments(&self) -> impl Iterator<Item = (AttachmentId, &Attachment)> + '_ {
        self.staged_attachments
            .live()
            .iter()
            .filter_map(|&id| self.attachments.get(id).map(|attachment| (id, attachment)))
    }

    /// Drop every entity and attachment, live and pending
    pub fn clear(&mut self) {
        self.entities.clear();
        self.staged.clear();
        self.attachments.clear();
        self.staged_attachments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocated_entity_is_not_live_until_apply() {
        let mut registry = EntityRegistry::new();
        let id = registry.allocate("probe", Vec2::new(1.0, 2.0));
        registry.stage_add(id);

        assert!(registry.contains(id));
        assert!(!registry.is_live(id));
        assert_eq!(registry.position(id), Some(Vec2::new(1.0, 2.0)));

        registry.apply_pending();
        assert!(registry.is_live(id));
    }

    #[test]
    fn test_removed_entity_handle_goes_stale() {
        let mut registry = EntityRegistry::new();
        let id = registry.allocate("probe", Vec2::zeros());
        registry.stage_add(id);
        registry.apply_pending();

        assert!(registry.remove_entity(id));
        assert!(registry.is_live(id), "removal waits for the boundary");
        let report = registry.apply_pending();

        assert_eq!(report.entities_removed, 1);
        assert!(!registry.contains(id));
        assert_eq!(registry.position(id), None);
        assert!(!registry.set_position(id, Vec2::new(3.0, 3.0)));
        assert!(!registry.remove_entity(id));
    }

    #[test]
    fn test_attachments_follow_staged_lifecycle() {
        let mut registry = EntityRegistry::new();
        let a = registry.add_attachment(Attachment::new("a", Vec2::new(1.0, 1.0)));
        let b = registry.add_attachment(Attachment::new("b", Vec2::new(1.0, 1.0)));
        assert_eq!(registry.live_attachments().count(), 0);

        registry.apply_pending();
        let live: Vec<_> = registry.live_attachments().map(|(id, _)| id).collect();
        assert_eq!(live, vec![a, b]);

        registry.remove_attachment(a);
        let report = registry.apply_pending();
        assert_eq!(report.attachments_removed, 1);
        assert_eq!(report.live_attachments, 1);
        assert!(registry.attachment(a).is_none());
    }
}
