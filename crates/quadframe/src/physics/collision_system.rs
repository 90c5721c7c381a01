//! Core collision detection system
//!
//! Collision detection is split into two phases: a broad phase that asks the
//! quadtree for candidates, and a narrow phase that runs the exact shape
//! overlap test on each candidate.
//!
//! This module only detects. Dispatching a [`Contact`] to its reaction needs
//! the whole engine and happens in [`Engine`](crate::Engine).

use crate::foundation::collections::{EntityId, MaskId, SlotMap, StagedSet};
use crate::foundation::math::{Rect, Vec2};
use crate::physics::collision::{CollisionMask, CollisionShape, Contact, Reaction};
use crate::spatial::{Quadtree, QuadtreeConfig};
use slotmap::SecondaryMap;

/// Masks, their staged lifetime, and the tree indexing them
pub struct CollisionWorld {
    /// Every allocated mask, live or pending
    masks: SlotMap<MaskId, CollisionMask>,

    /// Live list plus add/remove queues
    staged: StagedSet<MaskId>,

    /// Broad-phase tree; absent until a game space is configured
    tree: Option<Quadtree<MaskId>>,

    /// Split thresholds used when the tree is (re)created
    config: QuadtreeConfig,

    /// Set once the missing-space warning has been logged
    warned_missing_space: bool,
}

impl CollisionWorld {
    /// Create an empty collision world without a game space
    pub fn new(config: QuadtreeConfig) -> Self {
        Self {
            masks: SlotMap::with_key(),
            staged: StagedSet::new(),
            tree: None,
            config,
            warned_missing_space: false,
        }
    }

    /// Replace the game space, dropping every mask
    pub fn configure(&mut self, bounds: Rect) {
        let dropped = self.masks.len();
        self.masks.clear();
        self.staged.clear();
        self.tree = Some(Quadtree::new(bounds, self.config));
        self.warned_missing_space = false;
        log::debug!(
            "Collision space set to {}x{} ({} masks dropped)",
            bounds.w,
            bounds.h,
            dropped
        );
    }

    /// Game space covered by the tree
    pub fn bounds(&self) -> Option<Rect> {
        self.tree.as_ref().map(Quadtree::bounds)
    }

    /// Register a mask; it becomes live at the next boundary
    pub fn add_mask(&mut self, mask: CollisionMask) -> MaskId {
        let id = self.masks.insert(mask);
        self.staged.stage_add(id);
        id
    }

    /// Request removal of a mask
    ///
    /// Returns `false` for stale handles or repeated requests.
    pub fn remove_mask(&mut self, id: MaskId) -> bool {
        if !self.masks.contains_key(id) {
            return false;
        }
        self.staged.stage_remove(id)
    }

    /// Commit queued additions then removals
    pub fn apply_pending(&mut self) {
        if !self.staged.has_pending() {
            return;
        }
        // Removed handles become stale here, including ones that never went live
        for id in self.staged.apply() {
            self.masks.remove(id);
        }
    }

    /// Look up a mask
    pub fn mask(&self, id: MaskId) -> Option<&CollisionMask> {
        self.masks.get(id)
    }

    /// Look up a mask mutably (e.g. to resize its shape)
    pub fn mask_mut(&mut self, id: MaskId) -> Option<&mut CollisionMask> {
        self.masks.get_mut(id)
    }

    /// Whether `id` is in the live list
    pub fn is_live(&self, id: MaskId) -> bool {
        self.staged.is_live(id)
    }

    /// Live masks in activation order
    pub fn live_masks(&self) -> &[MaskId] {
        self.staged.live()
    }

    /// Number of live masks
    pub fn live_count(&self) -> usize {
        self.staged.len()
    }

    /// Quadtree from the most recent rebuild
    pub fn tree(&self) -> Option<&Quadtree<MaskId>> {
        self.tree.as_ref()
    }

    /// World-space shape of every live mask, for debug drawing
    pub fn live_shapes<P>(&self, positions: P) -> Vec<(MaskId, CollisionShape)>
    where
        P: Fn(EntityId) -> Option<Vec2> + Copy,
    {
        self.staged
            .live()
            .iter()
            .filter_map(|&id| self.masks.get(id).map(|mask| (id, mask.world_shape(positions))))
            .collect()
    }

    /// Rebuild the tree from the current world-space bounds of live masks
    pub fn remake<P>(&mut self, positions: P)
    where
        P: Fn(EntityId) -> Option<Vec2> + Copy,
    {
        let shapes = self.live_shapes(positions);
        self.rebuild(&shapes);
    }

    fn rebuild(&mut self, shapes: &[(MaskId, CollisionShape)]) {
        if let Some(tree) = self.tree.as_mut() {
            tree.clear();
            for (id, shape) in shapes {
                tree.insert(*id, shape.bounding_rect());
            }
        }
    }

    /// Find every overlapping pair among live masks
    ///
    /// Rebuilds the tree first, then reports each overlap once per side, in
    /// live-list order. Returns nothing (and warns once) without a game space.
    pub fn detect<P>(&mut self, positions: P) -> Vec<Contact>
    where
        P: Fn(EntityId) -> Option<Vec2> + Copy,
    {
        if self.tree.is_none() {
            if !self.warned_missing_space {
                log::warn!("Collision pass skipped: no game space configured");
                self.warned_missing_space = true;
            }
            return Vec::new();
        }

        let shapes = self.live_shapes(positions);
        self.rebuild(&shapes);

        let mut world: SecondaryMap<MaskId, CollisionShape> = SecondaryMap::with_capacity(shapes.len());
        for (id, shape) in &shapes {
            world.insert(*id, *shape);
        }

        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };

        let mut contacts = Vec::new();
        for (id, shape) in &shapes {
            // Broad phase
            for candidate in tree.retrieve(&shape.bounding_rect()) {
                if candidate == *id {
                    continue;
                }
                // Narrow phase
                let Some(other_shape) = world.get(candidate) else {
                    continue;
                };
                if shape.intersects(other_shape) {
                    contacts.push(Contact {
                        mask: *id,
                        owner: self.masks.get(*id).and_then(CollisionMask::owner),
                        other_mask: candidate,
                        other: self.masks.get(candidate).and_then(CollisionMask::owner),
                    });
                }
            }
        }

        log::trace!("Collision pass: {} masks, {} contacts", shapes.len(), contacts.len());
        contacts
    }

    /// Live masks overlapping a 1×1 box at `(x, y)`
    pub fn point_test<P>(&self, x: f64, y: f64, positions: P) -> Vec<MaskId>
    where
        P: Fn(EntityId) -> Option<Vec2> + Copy,
    {
        self.box_test(Rect::new(x, y, 1.0, 1.0), positions)
    }

    /// Live masks overlapping `query`
    ///
    /// Indexes the current world-space shapes of every live mask, so masks
    /// that moved or went live since the last collision pass are found.
    /// The cached tree is left untouched.
    pub fn box_test<P>(&self, query: Rect, positions: P) -> Vec<MaskId>
    where
        P: Fn(EntityId) -> Option<Vec2> + Copy,
    {
        let Some(bounds) = self.bounds() else {
            return Vec::new();
        };
        let shapes = self.live_shapes(positions);
        let mut index = Quadtree::new(bounds, self.config);
        let mut world: SecondaryMap<MaskId, CollisionShape> = SecondaryMap::with_capacity(shapes.len());
        for (id, shape) in &shapes {
            index.insert(*id, shape.bounding_rect());
            world.insert(*id, *shape);
        }

        let probe = CollisionShape::rect(query.x, query.y, query.w, query.h);
        let mut hits: Vec<MaskId> = index
            .retrieve(&query)
            .into_iter()
            .filter(|id| world.get(*id).is_some_and(|shape| probe.intersects(shape)))
            .collect();
        // Report in activation order regardless of tree layout
        hits.sort_by_key(|id| self.staged.live().iter().position(|live| live == id));
        hits
    }

    /// Swap a mask's reaction out for dispatch
    pub(crate) fn take_reaction(&mut self, id: MaskId) -> Option<Reaction> {
        self.masks.get_mut(id).map(CollisionMask::take_reaction)
    }

    /// Put a reaction back; dropped if the mask vanished meanwhile
    pub(crate) fn restore_reaction(&mut self, id: MaskId, reaction: Reaction) {
        if let Some(mask) = self.masks.get_mut(id) {
            mask.restore_reaction(reaction);
        }
    }

    /// Drop every mask, live and pending
    pub fn clear(&mut self) {
        self.masks.clear();
        self.staged.clear();
        if let Some(tree) = self.tree.as_mut() {
            tree.clear();
        }
    }
}
