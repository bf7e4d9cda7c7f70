//! Configuration system using Figment.
//!
//! Strongly-typed configuration loaded from:
//! 1. `config/scope.toml` (base configuration)
//! 2. Environment variables (prefixed with `RUST_SCOPE_`)
//!
//! # Example
//! ```no_run
//! use rust_scope::config::ScopeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScopeConfig::load()?;
//! println!("Application: {}", config.application.name);
//! # Ok(())
//! # }
//! ```

use crate::error::{AppResult, ScopeError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Application settings.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Display-layer settings.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Demo acquisition settings.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name.
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Rust Scope".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Display-layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Per-subscriber event queue capacity for the display event bus.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Whether the countdown label is driven during acquisitions.
    #[serde(default = "default_countdown_enabled")]
    pub countdown_enabled: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            countdown_enabled: default_countdown_enabled(),
        }
    }
}

/// Settings for the demo acquisition driven by the CLI entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Camera name recorded into image metadata.
    pub camera: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Legacy pixel-type name of generated frames (GRAY8, GRAY16, RGB32).
    pub pixel_type: String,
    /// Number of frames to acquire.
    pub frames: usize,
    /// Delay between frames in milliseconds.
    pub interval_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            camera: "MockCamera".to_string(),
            width: 64,
            height: 64,
            pixel_type: "GRAY16".to_string(),
            frames: 10,
            interval_ms: 100,
        }
    }
}

fn default_event_capacity() -> usize {
    64
}

fn default_countdown_enabled() -> bool {
    true
}

impl ScopeConfig {
    /// Load configuration from `config/scope.toml` and environment variables.
    ///
    /// Environment variables can override configuration with prefix
    /// `RUST_SCOPE_`. Example: `RUST_SCOPE_APPLICATION_NAME="Bench Scope"`.
    pub fn load() -> AppResult<Self> {
        Self::load_from("config/scope.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and the environment still
    /// apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: Self = Figment::from(Serialized::defaults(ScopeConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("RUST_SCOPE_").split("_"))
            .extract()
            .map_err(ScopeError::Config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ScopeError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_pixel_types = ["GRAY8", "GRAY16", "RGB32"];
        if !valid_pixel_types.contains(&self.acquisition.pixel_type.as_str()) {
            return Err(ScopeError::Configuration(format!(
                "Invalid pixel_type '{}'. Must be one of: {}",
                self.acquisition.pixel_type,
                valid_pixel_types.join(", ")
            )));
        }

        if self.acquisition.width == 0 || self.acquisition.height == 0 {
            return Err(ScopeError::Configuration(format!(
                "Invalid frame geometry {}x{}. Width and height must be non-zero",
                self.acquisition.width, self.acquisition.height
            )));
        }

        if self.display.event_capacity == 0 {
            return Err(ScopeError::Configuration(
                "event_capacity must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
