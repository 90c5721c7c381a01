//! Collision dispatch through the engine

use super::EventLog;
use crate::behavior::{Behavior, BehaviorError};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::foundation::collections::{EntityId, MaskId};
use crate::foundation::math::Vec2;
use crate::input::InputState;
use crate::physics::{CollisionHandler, CollisionShape, Contact, Reaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

fn frame(engine: &mut Engine) {
    engine.run_frame(0.016, InputState::new()).unwrap();
}

type ContactLog = Arc<Mutex<Vec<(MaskId, MaskId)>>>;

fn recording_handler(contacts: &ContactLog) -> Reaction {
    let contacts = Arc::clone(contacts);
    Reaction::handler(move |_: &mut Engine, contact: &Contact| {
        contacts.lock().unwrap().push((contact.mask, contact.other_mask));
    })
}

/// Square body that reports collisions with its own handler and can drift
struct Body {
    tag: &'static str,
    log: EventLog,
    velocity: Vec2,
}

impl Body {
    fn new(tag: &'static str, log: &EventLog) -> Self {
        Self {
            tag,
            log: log.clone(),
            velocity: Vec2::zeros(),
        }
    }
}

impl Behavior for Body {
    fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError> {
        engine.add_owned_mask(me, CollisionShape::rect(-5.0, -5.0, 10.0, 10.0));
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, me: EntityId, delta_time: f64) -> Result<(), BehaviorError> {
        engine.translate(me, self.velocity * delta_time);
        Ok(())
    }

    fn collision_handler(&mut self) -> Option<&mut dyn CollisionHandler> {
        Some(self)
    }
}

impl CollisionHandler for Body {
    fn on_collision(&mut self, engine: &mut Engine, contact: &Contact) {
        let other = contact
            .other
            .and_then(|id| engine.entity_name(id).map(str::to_string))
            .unwrap_or_default();
        self.log.push(format!("{}<-{}", self.tag, other.rsplit("::").next().unwrap_or("")));
    }
}

/// Owns a mask with [`Reaction::Owner`] but never handles collisions
struct Deaf;

impl Behavior for Deaf {
    fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError> {
        engine.add_owned_mask(me, CollisionShape::rect(-5.0, -5.0, 10.0, 10.0));
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, _me: EntityId, _delta_time: f64) -> Result<(), BehaviorError> {
        Ok(())
    }
}

#[test]
fn test_three_clusters_split_root_once() {
    let mut engine = engine();
    let contacts: ContactLog = Arc::default();
    let mut cluster_of: HashMap<MaskId, usize> = HashMap::new();

    let bases = [Vec2::new(100.0, 100.0), Vec2::new(3000.0, 200.0), Vec2::new(1000.0, 2000.0)];
    let offsets = [(0.0, 0.0), (6.0, 0.0), (0.0, 6.0), (6.0, 6.0), (3.0, 3.0)];
    for (cluster, base) in bases.iter().enumerate() {
        for (dx, dy) in offsets {
            let shape = CollisionShape::circle(base.x + dx, base.y + dy, 5.0);
            let mask = engine.add_mask(None, shape, recording_handler(&contacts));
            cluster_of.insert(mask, cluster);
        }
    }

    frame(&mut engine);

    let tree = engine.collisions().tree().unwrap();
    let root = tree.root();
    assert_eq!(tree.len(), 15);
    assert!(!root.is_leaf(), "root must split past 10 masks");
    assert!(root.entries.is_empty());
    let children = root.children.as_ref().unwrap();
    assert!(children.iter().all(|child| child.is_leaf()), "no child exceeds the threshold");
    let per_child: Vec<usize> = children.iter().map(|child| child.entries.len()).collect();
    assert_eq!(per_child, vec![5, 5, 5, 0]);

    let contacts = contacts.lock().unwrap();
    // 10 pairs per cluster, 3 clusters, reported from both sides
    assert_eq!(contacts.len(), 60);
    for (mask, other) in contacts.iter() {
        assert_ne!(mask, other);
        assert_eq!(cluster_of[mask], cluster_of[other], "no inter-cluster contacts");
        assert!(contacts.contains(&(*other, *mask)), "both directions fire");
    }
}

#[test]
fn test_overlapping_bodies_hear_each_other() {
    let log = EventLog::default();
    let mut engine = engine();
    engine.add_entity_at(Body::new("a", &log), Vec2::new(100.0, 100.0));
    engine.add_entity_at(Body::new("b", &log), Vec2::new(104.0, 104.0));
    engine.add_entity_at(Body::new("far", &log), Vec2::new(900.0, 900.0));

    frame(&mut engine);

    let mut events = log.events();
    events.sort();
    assert_eq!(events, vec!["a<-Body", "b<-Body"]);
}

#[test]
fn test_masks_follow_their_owner() {
    let log = EventLog::default();
    let mut engine = engine();
    engine.add_entity_at(Body::new("still", &log), Vec2::new(100.0, 100.0));
    let mut runner = Body::new("runner", &log);
    runner.velocity = Vec2::new(1000.0, 0.0);
    engine.add_entity_at(runner, Vec2::new(104.0, 100.0));

    // Overlap is detected before the runner moves away
    engine.run_frame(1.0, InputState::new()).unwrap();
    assert_eq!(log.events().len(), 2);

    engine.run_frame(1.0, InputState::new()).unwrap();
    assert_eq!(log.events().len(), 2, "no contacts once apart");
}

#[test]
fn test_removed_mask_stops_colliding_next_frame() {
    let mut engine = engine();
    let contacts: ContactLog = Arc::default();
    let a = engine.add_mask(None, CollisionShape::rect(0.0, 0.0, 10.0, 10.0), recording_handler(&contacts));
    let b = engine.add_mask(None, CollisionShape::rect(5.0, 5.0, 10.0, 10.0), recording_handler(&contacts));

    frame(&mut engine);
    assert_eq!(contacts.lock().unwrap().len(), 2);

    assert!(engine.remove_mask(b));
    assert!(engine.mask(b).is_some(), "removal waits for the boundary");
    frame(&mut engine);
    assert_eq!(contacts.lock().unwrap().len(), 2);
    assert!(engine.mask(b).is_none());
    assert!(engine.mask(a).is_some());
}

#[test]
fn test_owner_reaction_without_handler_is_ignored() {
    let log = EventLog::default();
    let mut engine = engine();
    engine.add_entity_at(Deaf, Vec2::new(100.0, 100.0));
    engine.add_entity_at(Body::new("hearing", &log), Vec2::new(102.0, 100.0));

    frame(&mut engine);
    frame(&mut engine);

    assert_eq!(log.events(), vec!["hearing<-Deaf", "hearing<-Deaf"]);
}

#[test]
fn test_handler_can_remove_its_owner() {
    let mut engine = engine();
    let log = EventLog::default();
    let victim = engine.add_entity_at(Body::new("victim", &log), Vec2::new(100.0, 100.0));

    let kills = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&kills);
    engine.add_mask(
        None,
        CollisionShape::circle_centered(Vec2::new(100.0, 100.0), 20.0),
        Reaction::handler(move |engine: &mut Engine, contact: &Contact| {
            if let Some(other) = contact.other {
                if engine.remove_entity(other) {
                    *counter.lock().unwrap() += 1;
                }
            }
        }),
    );

    frame(&mut engine);
    assert!(engine.is_live(victim), "removal is staged");
    frame(&mut engine);
    assert!(!engine.contains_entity(victim));
    assert_eq!(*kills.lock().unwrap(), 1);
}

#[test]
fn test_point_and_box_queries_use_owner_positions() {
    let log = EventLog::default();
    let mut engine = engine();
    let body = engine.add_entity_at(Body::new("target", &log), Vec2::new(500.0, 500.0));
    frame(&mut engine);

    let hits = engine.collision_point_test(500.0, 500.0);
    assert_eq!(hits.len(), 1);
    assert_eq!(engine.mask_owner(hits[0]), Some(body));

    assert!(engine.collision_point_test(520.0, 520.0).is_empty());
    assert_eq!(engine.collision_box_test(490.0, 490.0, 6.0, 6.0).len(), 1);

    let shapes = engine.live_mask_bounds();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].1, CollisionShape::rect(495.0, 495.0, 10.0, 10.0));
}

/// Eleven static masks in the SE quadrant so the root splits once a body joins
fn crowd_south_east(engine: &mut Engine) {
    for i in 0..11 {
        let offset = f64::from(i) * 20.0;
        engine.add_mask(None, CollisionShape::rect(3000.0 + offset, 1500.0, 10.0, 10.0), Reaction::Ignore);
    }
}

fn owned_mask(engine: &Engine, owner: EntityId) -> MaskId {
    engine
        .collisions()
        .live_masks()
        .iter()
        .copied()
        .find(|id| engine.mask_owner(*id) == Some(owner))
        .unwrap()
}

#[test]
fn test_queries_find_body_moved_after_collision_pass() {
    let log = EventLog::default();
    let mut engine = engine();
    crowd_south_east(&mut engine);
    let body = engine.add_entity_at(Body::new("mover", &log), Vec2::new(100.0, 100.0));
    frame(&mut engine);
    assert!(!engine.collisions().tree().unwrap().root().is_leaf());
    let mask = owned_mask(&engine, body);

    engine.set_position(body, Vec2::new(3500.0, 100.0));

    assert_eq!(engine.collision_box_test(3495.0, 95.0, 10.0, 10.0), vec![mask]);
    assert_eq!(engine.collision_point_test(3500.0, 100.0), vec![mask]);
    assert!(engine.collision_point_test(100.0, 100.0).is_empty());
}

#[test]
fn test_queries_find_masks_added_since_last_pass() {
    let log = EventLog::default();
    let mut engine = engine();
    frame(&mut engine);

    let body = engine.add_entity_at(Body::new("late", &log), Vec2::new(700.0, 300.0));
    assert!(engine.collision_point_test(700.0, 300.0).is_empty(), "staged until the boundary");

    engine.apply_pending();
    let mask = owned_mask(&engine, body);
    assert_eq!(engine.collision_point_test(700.0, 300.0), vec![mask]);
}

#[test]
fn test_remake_collision_tree_reindexes_current_positions() {
    let log = EventLog::default();
    let mut engine = engine();
    crowd_south_east(&mut engine);
    let body = engine.add_entity_at(Body::new("mover", &log), Vec2::new(100.0, 100.0));
    frame(&mut engine);
    let mask = owned_mask(&engine, body);

    let before = engine.collisions().tree().unwrap().find(mask).unwrap().bounds;
    assert!(before.contains_point(Vec2::new(100.0, 100.0)));

    engine.set_position(body, Vec2::new(3500.0, 100.0));
    engine.remake_collision_tree();

    let tree = engine.collisions().tree().unwrap();
    assert_eq!(tree.len(), 12);
    let after = tree.find(mask).unwrap().bounds;
    assert!(after.contains_point(Vec2::new(3500.0, 100.0)));
    assert!(!after.contains_point(Vec2::new(100.0, 100.0)));
}

#[test]
fn test_removing_owner_and_mask_keeps_counts_in_step() {
    let mut engine = engine();
    let log = EventLog::default();
    for i in 0..4 {
        let x = 100.0 + f64::from(i) * 50.0;
        engine.add_entity_at(Body::new("ball", &log), Vec2::new(x, 100.0));
    }
    engine.add_mask(
        None,
        CollisionShape::rect(0.0, 0.0, 400.0, 200.0),
        Reaction::handler(|engine: &mut Engine, contact: &Contact| {
            if let Some(other) = contact.other {
                engine.remove_entity(other);
                engine.remove_mask(contact.other_mask);
            }
        }),
    );

    frame(&mut engine);
    frame(&mut engine);

    assert!(engine.live_entities().is_empty());
    assert_eq!(engine.collisions().live_count(), 1, "only the sweeping mask remains");
    let remaining = engine.live_mask_bounds();
    assert_eq!(remaining[0].1, CollisionShape::rect(0.0, 0.0, 400.0, 200.0));
}

#[test]
fn test_collisions_skipped_without_space() {
    let mut engine = Engine::new(EngineConfig::default().without_space()).unwrap();
    let contacts: ContactLog = Arc::default();
    engine.add_mask(None, CollisionShape::rect(0.0, 0.0, 10.0, 10.0), recording_handler(&contacts));
    engine.add_mask(None, CollisionShape::rect(0.0, 0.0, 10.0, 10.0), recording_handler(&contacts));

    frame(&mut engine);
    assert!(contacts.lock().unwrap().is_empty());
}
