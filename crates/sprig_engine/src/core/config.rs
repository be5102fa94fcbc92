//! # Engine Configuration
//!
//! Tunables for the frame scheduler, the collision broad phase and the
//! platformer body. Loaded from TOML or RON through the [`Config`] trait.
//!
//! ## Defaults
//!
//! - **Broad phase**: 64 world units per hash grid cell
//! - **Body**: jump force 640, terminal fall velocity 65536
//! - **Scheduler**: time scale 1.0, scene gravity 0

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// Default side length of a spatial hash cell in world units
pub const DEFAULT_HASH_GRID_SIZE: f32 = 64.0;

/// Default terminal fall velocity of a body
pub const DEFAULT_MAX_FALL_VELOCITY: f32 = 65536.0;

/// Default jump impulse of a body
pub const DEFAULT_JUMP_FORCE: f32 = 640.0;

/// # Engine Configuration
///
/// Runtime settings consumed by [`crate::Engine`] and the world it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of one broad-phase grid cell
    pub hash_grid_size: f32,
    /// Upper bound on a body's downward velocity
    pub max_fall_velocity: f32,
    /// Jump impulse used when a body does not set its own
    pub default_jump_force: f32,
    /// Multiplier applied to every frame delta
    pub time_scale: f32,
    /// Log filter used by the demo host
    pub log_level: String,
    /// Polygon resolution used for circle and ellipse areas
    pub ellipse_segments: usize,
    /// Gravity a scene starts with
    pub gravity: f32,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            hash_grid_size: DEFAULT_HASH_GRID_SIZE,
            max_fall_velocity: DEFAULT_MAX_FALL_VELOCITY,
            default_jump_force: DEFAULT_JUMP_FORCE,
            time_scale: 1.0,
            log_level: "info".to_string(),
            ellipse_segments: 16,
            gravity: 0.0,
        }
    }

    /// Set the broad-phase cell size
    pub fn with_hash_grid_size(mut self, size: f32) -> Self {
        self.hash_grid_size = size;
        self
    }

    /// Set the terminal fall velocity
    pub fn with_max_fall_velocity(mut self, velocity: f32) -> Self {
        self.max_fall_velocity = velocity;
        self
    }

    /// Set the default jump force
    pub fn with_default_jump_force(mut self, force: f32) -> Self {
        self.default_jump_force = force;
        self
    }

    /// Set the time scale
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the polygon resolution of circle areas
    pub fn with_ellipse_segments(mut self, segments: usize) -> Self {
        self.ellipse_segments = segments;
        self
    }

    /// Set the gravity scenes start with
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Validate ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hash_grid_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "hash_grid_size",
                reason: format!("must be positive, got {}", self.hash_grid_size),
            });
        }
        if !(self.max_fall_velocity > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_fall_velocity",
                reason: format!("must be positive, got {}", self.max_fall_velocity),
            });
        }
        if !(self.time_scale >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "time_scale",
                reason: format!("must not be negative, got {}", self.time_scale),
            });
        }
        if self.ellipse_segments < 3 {
            return Err(ConfigError::Invalid {
                field: "ellipse_segments",
                reason: format!("need at least 3, got {}", self.ellipse_segments),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}
