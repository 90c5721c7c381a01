//! Cluster demo application
//!
//! Spawns clusters of bouncing balls in the default game space, lets a
//! sweeper box clear whatever it touches, and runs the frame loop on its
//! own thread for a few seconds before printing a summary.
//!
//! Usage: `cluster_demo [config.toml|config.ron] [seconds]`

use quadframe::foundation::logging;
use quadframe::foundation::math::utils;
use quadframe::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const BALLS_PER_CLUSTER: usize = 12;
const BALL_RADIUS: f64 = 6.0;
const DEFAULT_RUN_SECONDS: u64 = 3;

/// Demo-level errors
#[derive(Error, Debug)]
enum DemoError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Argument(String),
}

/// Counters shared between the demo's behaviors and `main`
#[derive(Debug, Default)]
struct Tally {
    contacts: AtomicU64,
    swept: AtomicU64,
    spawned: AtomicU64,
}

/// Ball that bounces inside the game space
struct Ball {
    velocity: Vec2,
    tally: Arc<Tally>,
}

impl Behavior for Ball {
    fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError> {
        engine.add_owned_mask(me, CollisionShape::circle(-BALL_RADIUS, -BALL_RADIUS, BALL_RADIUS));
        engine.add_attachment(
            Attachment::new("ball", Vec2::new(BALL_RADIUS * 2.0, BALL_RADIUS * 2.0))
                .attached_to(me)
                .with_offset(Vec2::new(-BALL_RADIUS, -BALL_RADIUS)),
        );
        self.tally.spawned.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, me: EntityId, delta_time: f64) -> Result<(), BehaviorError> {
        let space = engine
            .space()
            .ok_or_else(|| BehaviorError::InvalidState("ball outside any game space".to_string()))?;
        let mut position = engine
            .position(me)
            .ok_or_else(|| BehaviorError::InvalidState("ball has no position".to_string()))?;

        position += self.velocity * delta_time;
        if position.x < BALL_RADIUS || position.x > space.right() - BALL_RADIUS {
            self.velocity.x = -self.velocity.x;
        }
        if position.y < BALL_RADIUS || position.y > space.bottom() - BALL_RADIUS {
            self.velocity.y = -self.velocity.y;
        }
        position.x = utils::clamp(position.x, BALL_RADIUS, space.right() - BALL_RADIUS);
        position.y = utils::clamp(position.y, BALL_RADIUS, space.bottom() - BALL_RADIUS);
        engine.set_position(me, position);
        Ok(())
    }

    fn collision_handler(&mut self) -> Option<&mut dyn CollisionHandler> {
        Some(self)
    }
}

impl CollisionHandler for Ball {
    fn on_collision(&mut self, _engine: &mut Engine, _contact: &Contact) {
        self.tally.contacts.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drops a fresh cluster of balls every few seconds
struct Spawner {
    rng: StdRng,
    interval: f64,
    elapsed: f64,
    tally: Arc<Tally>,
}

impl Spawner {
    fn spawn_cluster(&mut self, engine: &mut Engine) {
        let Some(space) = engine.space() else {
            return;
        };
        let center = Vec2::new(
            self.rng.gen_range(space.w * 0.1..space.w * 0.9),
            self.rng.gen_range(space.h * 0.1..space.h * 0.9),
        );
        for _ in 0..BALLS_PER_CLUSTER {
            let offset = Vec2::new(self.rng.gen_range(-20.0..20.0), self.rng.gen_range(-20.0..20.0));
            let velocity = Vec2::new(self.rng.gen_range(-150.0..150.0), self.rng.gen_range(-150.0..150.0));
            engine.add_entity_at(
                Ball {
                    velocity,
                    tally: Arc::clone(&self.tally),
                },
                center + offset,
            );
        }
        log::debug!("Cluster spawned around ({:.0}, {:.0})", center.x, center.y);
    }
}

impl Behavior for Spawner {
    fn start(&mut self, engine: &mut Engine, _me: EntityId) -> Result<(), BehaviorError> {
        for _ in 0..3 {
            self.spawn_cluster(engine);
        }
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _me: EntityId, delta_time: f64) -> Result<(), BehaviorError> {
        self.elapsed += delta_time;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.spawn_cluster(engine);
        }
        Ok(())
    }
}

/// Box crossing the space left to right, removing every ball it touches
struct Sweeper {
    speed: f64,
    tally: Arc<Tally>,
}

impl Behavior for Sweeper {
    fn start(&mut self, engine: &mut Engine, me: EntityId) -> Result<(), BehaviorError> {
        let height = engine.space().map_or(0.0, |space| space.h);
        let tally = Arc::clone(&self.tally);
        engine.add_mask(
            Some(me),
            CollisionShape::rect(0.0, 0.0, 40.0, height),
            Reaction::handler(move |engine: &mut Engine, contact: &Contact| {
                if let Some(ball) = contact.other {
                    // Masks outlive their owner unless removed explicitly
                    engine.remove_mask(contact.other_mask);
                    if engine.remove_entity(ball) {
                        tally.swept.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }),
        );
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, me: EntityId, delta_time: f64) -> Result<(), BehaviorError> {
        let width = engine.space().map_or(0.0, |space| space.w);
        let mut position = engine.position(me).unwrap_or_else(Vec2::zeros);
        position.x += self.speed * delta_time;
        if position.x > width {
            position.x = -40.0;
        }
        engine.set_position(me, position);
        Ok(())
    }
}

fn load_config(path: Option<&String>) -> Result<EngineConfig, DemoError> {
    match path {
        Some(path) => Ok(EngineConfig::load_validated(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn run() -> Result<(), DemoError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.iter().find(|arg| arg.ends_with(".toml") || arg.ends_with(".ron"));
    let seconds = match args.iter().find(|arg| arg.parse::<u64>().is_ok()) {
        Some(arg) => arg
            .parse::<u64>()
            .map_err(|e| DemoError::Argument(format!("{arg}: {e}")))?,
        None => DEFAULT_RUN_SECONDS,
    };

    let config = load_config(config_path)?;
    logging::init_with_level(&config.log_level);
    if let Some(path) = config_path {
        log::info!("Loaded configuration from {}", path);
    }
    log::info!("Starting cluster demo for {}s", seconds);

    let tally = Arc::new(Tally::default());
    let mut engine = Engine::new(config)?;
    engine.add_entity(Spawner {
        rng: StdRng::seed_from_u64(0x5eed),
        interval: 1.0,
        elapsed: 0.0,
        tally: Arc::clone(&tally),
    });
    engine.add_entity(Sweeper {
        speed: 600.0,
        tally: Arc::clone(&tally),
    });

    let mut scheduler = FrameScheduler::new(engine, LogSink::new(120));
    if scheduler.frame_delay().is_zero() {
        scheduler.set_frame_delay(Duration::from_millis(4));
    }
    scheduler.start()?;
    std::thread::sleep(Duration::from_secs(seconds));
    scheduler.post(|engine: &mut Engine| {
        log::info!("Live entities before shutdown: {}", engine.live_entities().len());
    });
    let mut engine = scheduler.into_engine()?;
    engine.apply_pending();

    // Every live ball owns one mask; the sweeper owns the other
    let balls = engine.live_entities().len().saturating_sub(2);
    let masks = engine.collisions().live_count();
    if masks != balls + 1 {
        log::warn!("{} live masks for {} balls; masks are leaking", masks, balls);
    }

    log::info!(
        "Ran {} frames: {} balls spawned, {} swept, {} contacts, {} still live, {} masks",
        engine.frame_index(),
        tally.spawned.load(Ordering::Relaxed),
        tally.swept.load(Ordering::Relaxed),
        tally.contacts.load(Ordering::Relaxed),
        balls,
        masks
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Cluster demo failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
