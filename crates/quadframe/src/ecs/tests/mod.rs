//! Integration scenarios for the frame lifecycle, collisions, and the
//! scheduler thread

mod collision_scenarios;

use crate::behavior::{Behavior, BehaviorError};
use crate::engine::Engine;
use crate::foundation::collections::EntityId;
use std::sync::{Arc, Mutex};

/// Shared event log written by test behaviors
#[derive(Debug, Clone, Default)]
pub(super) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub(super) fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub(super) fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(super) fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| e.as_str() == event).count()
    }
}

/// Records `start:<tag>` and `update:<tag>` into a log
pub(super) struct Probe {
    pub tag: &'static str,
    pub log: EventLog,
}

impl Probe {
    pub(super) fn new(tag: &'static str, log: &EventLog) -> Self {
        Self { tag, log: log.clone() }
    }
}

impl Behavior for Probe {
    fn start(&mut self, _engine: &mut Engine, _me: EntityId) -> Result<(), BehaviorError> {
        self.log.push(format!("start:{}", self.tag));
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, _me: EntityId, _delta_time: f64) -> Result<(), BehaviorError> {
        self.log.push(format!("update:{}", self.tag));
        Ok(())
    }
}
