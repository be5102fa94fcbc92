//! # Core Engine Module
//!
//! Shared configuration used by every subsystem.

pub mod config;

pub use config::{EngineConfig, Config, ConfigError, ConfigFormat};
