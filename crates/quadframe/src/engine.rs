//! Core engine implementation
//!
//! [`Engine`] is the context every behavior and collision handler receives.
//! It owns the entity registry, the collision world, and the game space, and
//! knows how to run one frame. Driving frames on a thread is the job of the
//! [`FrameScheduler`](crate::ecs::FrameScheduler).

use crate::behavior::{Behavior, BehaviorError};
use crate::config::{EngineConfig, SpaceConfig};
use crate::ecs::registry::EntityRegistry;
use crate::foundation::collections::{AttachmentId, EntityId, MaskId};
use crate::foundation::math::{Rect, Vec2};
use crate::input::InputState;
use crate::physics::{CollisionMask, CollisionShape, CollisionWorld, Contact, Reaction};
use crate::render::{Attachment, DrawItem};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Main engine struct
///
/// Structural requests (adding or removing entities, masks, attachments,
/// replacing the game space) are staged and take effect at the next frame
/// boundary. Positions and mask shapes change immediately.
pub struct Engine {
    /// Engine configuration
    config: EngineConfig,

    /// Entities and attachments
    registry: EntityRegistry,

    /// Collision masks and the broad-phase tree
    collisions: CollisionWorld,

    /// Current game space
    space: Option<Rect>,

    /// Replacement space requested during a frame
    staged_space: Option<Rect>,

    /// Whether collisions or updates are being dispatched right now
    in_frame: bool,

    /// Nesting depth of `start` calls in progress
    starting: u32,

    /// Seconds since the previous frame
    delta_time: f64,

    /// Frames run so far
    frame_index: u64,

    /// Input snapshot for the current frame
    input: InputState,

    /// Owner-reaction masks already reported as unhandled
    unhandled_masks: HashSet<MaskId>,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::ConfigError)?;
        log::info!("Initializing engine...");

        let mut engine = Self {
            collisions: CollisionWorld::new(config.quadtree),
            registry: EntityRegistry::new(),
            space: None,
            staged_space: None,
            in_frame: false,
            starting: 0,
            delta_time: 0.0,
            frame_index: 0,
            input: InputState::new(),
            unhandled_masks: HashSet::new(),
            config,
        };

        if let Some(space) = engine.config.space {
            engine.configure_space(space.width, space.height)?;
        }
        Ok(engine)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create (or replace) the game space
    ///
    /// Replacing the space drops every entity, mask, and attachment. Called
    /// during a frame or from a behavior's `start`, the replacement happens
    /// at the next boundary.
    pub fn configure_space(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        SpaceConfig::new(width, height)
            .validate()
            .map_err(|_| EngineError::InvalidSpace { width, height })?;

        let bounds = Rect::from_size(width, height);
        if self.in_frame || self.starting > 0 {
            log::debug!("Game space change to {}x{} staged for next frame", width, height);
            self.staged_space = Some(bounds);
        } else {
            self.apply_space(bounds);
        }
        Ok(())
    }

    fn apply_space(&mut self, bounds: Rect) {
        self.registry.clear();
        self.collisions.configure(bounds);
        self.unhandled_masks.clear();
        self.space = Some(bounds);
        log::info!("Game space set to {}x{}", bounds.w, bounds.h);
    }

    /// Current game space
    pub fn space(&self) -> Option<Rect> {
        self.space
    }

    /// Whether a game space exists
    pub fn has_space(&self) -> bool {
        self.space.is_some()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Add an entity at the origin
    ///
    /// `start` runs before this returns; the entity goes live at the next
    /// boundary.
    pub fn add_entity<B: Behavior + 'static>(&mut self, behavior: B) -> EntityId {
        self.spawn(Box::new(behavior), Vec2::zeros())
    }

    /// Add an entity at `position`
    pub fn add_entity_at<B: Behavior + 'static>(&mut self, behavior: B, position: Vec2) -> EntityId {
        self.spawn(Box::new(behavior), position)
    }

    /// Add an already boxed behavior
    pub fn add_boxed_entity(&mut self, behavior: Box<dyn Behavior>, position: Vec2) -> EntityId {
        self.spawn(behavior, position)
    }

    fn spawn(&mut self, mut behavior: Box<dyn Behavior>, position: Vec2) -> EntityId {
        let id = self.registry.allocate(behavior.name(), position);

        self.starting += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| behavior.start(self, id)));
        self.starting -= 1;
        self.report_outcome("start", id, outcome);

        if !self.registry.restore_behavior(id, behavior) {
            log::warn!("Entity {:?} vanished during start; its behavior is dropped", id);
            return id;
        }
        self.registry.stage_add(id);
        log::trace!("Entity {:?} staged for addition", id);
        id
    }

    /// Request removal of an entity
    ///
    /// Idempotent; stale handles are ignored. Returns whether a new request
    /// was queued.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.registry.remove_entity(id)
    }

    /// Whether the handle still refers to an entity (live or pending)
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.registry.contains(id)
    }

    /// Whether the entity is in the live list
    pub fn is_live(&self, id: EntityId) -> bool {
        self.registry.is_live(id)
    }

    /// Live entities in activation order
    pub fn live_entities(&self) -> &[EntityId] {
        self.registry.live()
    }

    /// Position of an entity; `None` for stale handles
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.registry.position(id)
    }

    /// Move an entity; returns `false` for stale handles
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        self.registry.set_position(id, position)
    }

    /// Move an entity by `delta`
    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> bool {
        match self.registry.position(id) {
            Some(position) => self.registry.set_position(id, position + delta),
            None => false,
        }
    }

    /// Log name of an entity
    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.registry.name(id)
    }

    /// Entity and attachment registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Collision masks
    // ------------------------------------------------------------------

    /// Register a collision mask
    ///
    /// With an owner the shape is an offset from the owner's position. The
    /// mask joins detection at the next boundary.
    pub fn add_mask(&mut self, owner: Option<EntityId>, shape: CollisionShape, reaction: Reaction) -> MaskId {
        self.collisions.add_mask(CollisionMask::new(owner, shape, reaction))
    }

    /// Register a mask whose collisions go to the owner's behavior
    pub fn add_owned_mask(&mut self, owner: EntityId, shape: CollisionShape) -> MaskId {
        self.add_mask(Some(owner), shape, Reaction::Owner)
    }

    /// Request removal of a mask
    pub fn remove_mask(&mut self, id: MaskId) -> bool {
        self.collisions.remove_mask(id)
    }

    /// Look up a mask
    pub fn mask(&self, id: MaskId) -> Option<&CollisionMask> {
        self.collisions.mask(id)
    }

    /// Look up a mask mutably
    pub fn mask_mut(&mut self, id: MaskId) -> Option<&mut CollisionMask> {
        self.collisions.mask_mut(id)
    }

    /// Owner of a mask
    pub fn mask_owner(&self, id: MaskId) -> Option<EntityId> {
        self.collisions.mask(id).and_then(CollisionMask::owner)
    }

    /// Collision world
    pub fn collisions(&self) -> &CollisionWorld {
        &self.collisions
    }

    /// Live masks overlapping a 1×1 box at `(x, y)`
    pub fn collision_point_test(&self, x: f64, y: f64) -> Vec<MaskId> {
        let registry = &self.registry;
        self.collisions.point_test(x, y, |id| registry.position(id))
    }

    /// Live masks overlapping the box `(x, y, w, h)`
    pub fn collision_box_test(&self, x: f64, y: f64, w: f64, h: f64) -> Vec<MaskId> {
        let registry = &self.registry;
        self.collisions.box_test(Rect::new(x, y, w, h), |id| registry.position(id))
    }

    /// World-space shapes of all live masks, for debug drawing
    pub fn live_mask_bounds(&self) -> Vec<(MaskId, CollisionShape)> {
        let registry = &self.registry;
        self.collisions.live_shapes(|id| registry.position(id))
    }

    /// Rebuild the quadtree from current mask positions
    pub fn remake_collision_tree(&mut self) {
        let registry = &self.registry;
        self.collisions.remake(|id| registry.position(id));
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    /// Register a drawable attachment; it is drawn from the next boundary on
    pub fn add_attachment(&mut self, attachment: Attachment) -> AttachmentId {
        self.registry.add_attachment(attachment)
    }

    /// Request removal of an attachment
    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        self.registry.remove_attachment(id)
    }

    /// Attachment for `id`, mutably (e.g. to hide it)
    pub fn attachment_mut(&mut self, id: AttachmentId) -> Option<&mut Attachment> {
        self.registry.attachment_mut(id)
    }

    /// Resolve visible live attachments into draw items
    pub fn collect_drawables(&self, out: &mut Vec<DrawItem>) {
        for (id, attachment) in self.registry.live_attachments() {
            if !attachment.visible {
                continue;
            }
            if let Some(position) = attachment.resolve(|owner| self.registry.position(owner)) {
                out.push(DrawItem {
                    attachment: id,
                    owner: attachment.owner,
                    position,
                    size: attachment.size,
                    sprite: Arc::clone(&attachment.sprite),
                });
            }
        }
    }

    /// Draw items for the current state
    pub fn drawables(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.collect_drawables(&mut items);
        items
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Seconds since the previous frame
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Frames run so far (the current frame's number while one runs)
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Input snapshot for the current frame
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Whether collisions or updates are being dispatched
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Commit every staged request
    ///
    /// A staged game space goes first, then entity, attachment, and mask
    /// queues. Ignored while a frame is dispatching.
    pub fn apply_pending(&mut self) {
        if self.in_frame {
            log::warn!("apply_pending() ignored while a frame is running");
            return;
        }
        if let Some(bounds) = self.staged_space.take() {
            self.apply_space(bounds);
        }
        let report = self.registry.apply_pending();
        self.collisions.apply_pending();
        if report.entities_removed > 0 || report.attachments_removed > 0 {
            log::trace!(
                "Boundary: {} entities and {} attachments released",
                report.entities_removed,
                report.attachments_removed
            );
        }
    }

    /// Run one frame: commit staged requests, dispatch collisions, update
    /// every live entity
    pub fn run_frame(&mut self, delta_time: f64, input: InputState) -> Result<(), EngineError> {
        if self.in_frame {
            return Err(EngineError::ReentrantFrame);
        }

        self.delta_time = delta_time;
        self.frame_index += 1;
        self.input = input;

        self.apply_pending();

        self.in_frame = true;
        self.run_collisions();
        self.update_entities();
        self.in_frame = false;
        Ok(())
    }

    fn run_collisions(&mut self) {
        let registry = &self.registry;
        let contacts = self.collisions.detect(|id| registry.position(id));
        for contact in &contacts {
            self.dispatch_contact(contact);
        }
    }

    fn dispatch_contact(&mut self, contact: &Contact) {
        let Some(reaction) = self.collisions.take_reaction(contact.mask) else {
            return;
        };

        let reaction = match reaction {
            Reaction::Owner => {
                self.forward_to_owner(contact);
                Reaction::Owner
            }
            Reaction::Handler(mut handler) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_collision(self, contact)));
                if let Err(payload) = outcome {
                    log::error!(
                        "Collision handler panicked for mask {:?}: {}",
                        contact.mask,
                        panic_message(payload.as_ref())
                    );
                }
                Reaction::Handler(handler)
            }
            Reaction::Ignore => Reaction::Ignore,
        };

        self.collisions.restore_reaction(contact.mask, reaction);
    }

    fn forward_to_owner(&mut self, contact: &Contact) {
        let Some(owner) = contact.owner else {
            self.warn_unhandled(contact.mask, "it has no owner");
            return;
        };
        // Owner already released or currently running
        let Some(mut behavior) = self.registry.take_behavior(owner) else {
            return;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match behavior.collision_handler() {
            Some(handler) => {
                handler.on_collision(self, contact);
                true
            }
            None => false,
        }));
        self.registry.restore_behavior(owner, behavior);

        match outcome {
            Ok(true) => {}
            Ok(false) => self.warn_unhandled(contact.mask, "its owner has no collision handler"),
            Err(payload) => log::error!(
                "Collision handler panicked for entity {:?} ({}): {}",
                owner,
                self.registry.name(owner).unwrap_or("<released>"),
                panic_message(payload.as_ref())
            ),
        }
    }

    fn warn_unhandled(&mut self, mask: MaskId, reason: &str) {
        if self.unhandled_masks.insert(mask) {
            log::warn!("Mask {:?} collided but {}; its collisions are ignored", mask, reason);
        }
    }

    fn update_entities(&mut self) {
        let live = self.registry.live().to_vec();
        let delta_time = self.delta_time;

        for id in live {
            let Some(mut behavior) = self.registry.take_behavior(id) else {
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| behavior.update(self, id, delta_time)));
            self.registry.restore_behavior(id, behavior);
            self.report_outcome("update", id, outcome);
        }
    }

    fn report_outcome(&self, phase: &str, id: EntityId, outcome: std::thread::Result<Result<(), BehaviorError>>) {
        let name = self.registry.name(id).unwrap_or("<released>");
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Entity {:?} ({}) failed in {}: {}", id, name, phase, e),
            Err(payload) => log::error!(
                "Entity {:?} ({}) panicked in {}: {}",
                id,
                name,
                phase,
                panic_message(payload.as_ref())
            ),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("space", &self.space)
            .field("frame_index", &self.frame_index)
            .field("live_entities", &self.registry.len())
            .field("live_masks", &self.collisions.live_count())
            .finish_non_exhaustive()
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The frame loop needs a game space
    #[error("No game space configured; call configure_space() before starting the frame loop")]
    MissingSpace,

    /// Game space dimensions were rejected
    #[error("Invalid game space {width}x{height}: dimensions must be finite and non-negative")]
    InvalidSpace {
        /// Requested width
        width: f64,
        /// Requested height
        height: f64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The frame loop is already running
    #[error("Frame loop is already running")]
    AlreadyRunning,

    /// Operation requires the frame loop to be stopped
    #[error("Frame loop is running; stop it first")]
    NotStopped,

    /// A frame was started from inside another frame
    #[error("run_frame() called while a frame is running")]
    ReentrantFrame,

    /// The loop thread could not be created
    #[error("Failed to spawn frame loop thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The loop thread died; its engine state is lost
    #[error("Frame loop thread panicked")]
    LoopPanicked,
}
