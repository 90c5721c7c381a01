//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to an entity slot in the registry
    pub struct EntityId;

    /// Handle to a collision mask in the collision world
    pub struct MaskId;

    /// Handle to a drawable attachment in the registry
    pub struct AttachmentId;
}

/// Ordered live list with staged additions and removals
///
/// Requests only touch the pending queues; the live list changes solely in
/// [`StagedSet::apply`], which the owner calls at a frame boundary. This is
/// what makes it safe to request mutations while the live list is being
/// walked.
#[derive(Debug, Clone)]
pub struct StagedSet<K> {
    live: Vec<K>,
    pending_add: Vec<K>,
    pending_remove: Vec<K>,
}

impl<K: Copy + PartialEq> StagedSet<K> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
        }
    }

    /// Queue `key` to join the live list at the next boundary
    pub fn stage_add(&mut self, key: K) {
        self.pending_add.push(key);
    }

    /// Queue `key` to leave the live list at the next boundary
    ///
    /// Returns `false` when the removal was already queued.
    pub fn stage_remove(&mut self, key: K) -> bool {
        if self.pending_remove.contains(&key) {
            return false;
        }
        self.pending_remove.push(key);
        true
    }

    /// Commit queued additions (in request order), then queued removals
    ///
    /// Returns the keys that actually left the live list. Removal requests
    /// for keys that are not live are dropped silently.
    pub fn apply(&mut self) -> Vec<K> {
        self.live.append(&mut self.pending_add);

        let mut removed = Vec::with_capacity(self.pending_remove.len());
        for key in self.pending_remove.drain(..) {
            if let Some(index) = self.live.iter().position(|live| *live == key) {
                removed.push(self.live.remove(index));
            }
        }
        removed
    }

    /// Live keys in insertion order
    pub fn live(&self) -> &[K] {
        &self.live
    }

    /// Whether `key` is currently live
    pub fn is_live(&self, key: K) -> bool {
        self.live.contains(&key)
    }

    /// Whether `key` is waiting to join the live list
    pub fn is_pending_add(&self, key: K) -> bool {
        self.pending_add.contains(&key)
    }

    /// Whether nothing is queued
    pub fn has_pending(&self) -> bool {
        !self.pending_add.is_empty() || !self.pending_remove.is_empty()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether the live list is empty
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drop everything, live and pending
    pub fn clear(&mut self) {
        self.live.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
    }
}

impl<K: Copy + PartialEq> Default for StagedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
