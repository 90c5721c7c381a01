//! Engine configuration
//!
//! Covers logging, frame pacing, the initial game space, and quadtree
//! split thresholds. Loadable from TOML or RON through [`Config`].

use super::{Config, ConfigError};
use crate::spatial::QuadtreeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dimensions of the game space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Width in world units
    pub width: f64,
    /// Height in world units
    pub height: f64,
}

impl SpaceConfig {
    /// Create a space configuration
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check that both dimensions are finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(format!("Space dimensions must be finite, got {}x{}", self.width, self.height));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(format!("Space dimensions cannot be negative, got {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self::new(4000.0, 2250.0)
    }
}

/// # Engine Configuration
///
/// Core engine behavior: log filter, frame pacing, and collision settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Sleep between frame quanta, in milliseconds
    pub frame_delay_ms: u64,
    /// Game space created at startup; `None` leaves it to the application
    pub space: Option<SpaceConfig>,
    /// Quadtree split thresholds
    pub quadtree: QuadtreeConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_delay_ms: 0,
            space: Some(SpaceConfig::default()),
            quadtree: QuadtreeConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the delay between frames
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the initial game space
    pub fn with_space(mut self, width: f64, height: f64) -> Self {
        self.space = Some(SpaceConfig::new(width, height));
        self
    }

    /// Start without a game space
    pub fn without_space(mut self) -> Self {
        self.space = None;
        self
    }

    /// Set the quadtree split thresholds
    pub fn with_quadtree(mut self, quadtree: QuadtreeConfig) -> Self {
        self.quadtree = quadtree;
        self
    }

    /// Delay between frames
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(space) = &self.space {
            space.validate()?;
        }
        if self.quadtree.max_objects == 0 {
            return Err("Quadtree max_objects must be at least 1".to_string());
        }
        if self.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        Ok(())
    }

    /// Load from `path` and validate
    pub fn load_validated(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}
