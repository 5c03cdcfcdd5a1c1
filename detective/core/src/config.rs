//! TOML Configuration File Support
//!
//! Configuration for the capture pipeline and the inference service, read
//! from `~/.config/emotion-detective/detective.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [camera]
//! ideal_width = 640
//! ideal_height = 480
//! jpeg_quality = 0.8
//!
//! [service]
//! base_url = "https://generativelanguage.googleapis.com/v1beta"
//! model = "gemini-2.5-flash"
//! request_timeout_ms = 60000
//! ```
//!
//! The API key is normally supplied through `GEMINI_API_KEY` rather than
//! written to the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureConstraints;

/// Default Gemini API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Camera section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraToml {
    /// Preferred frame width in pixels
    pub ideal_width: Option<u32>,

    /// Preferred frame height in pixels
    pub ideal_height: Option<u32>,

    /// JPEG quality as a fraction in (0, 1]
    pub jpeg_quality: Option<f32>,
}

/// Service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// API root URL
    pub base_url: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// Root TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectiveToml {
    /// Camera settings
    pub camera: CameraToml,

    /// Inference service settings
    pub service: ServiceToml,
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Camera and still-encoding settings
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    /// Preferred frame width in pixels
    pub ideal_width: u32,
    /// Preferred frame height in pixels
    pub ideal_height: u32,
    /// JPEG quality as a fraction in (0, 1]
    pub jpeg_quality: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            ideal_height: 480,
            jpeg_quality: 0.8,
        }
    }
}

impl CameraSettings {
    /// Device constraints for these settings
    #[must_use]
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints::default().with_ideal_size(self.ideal_width, self.ideal_height)
    }
}

/// Inference service settings
#[derive(Clone, PartialEq)]
pub struct ServiceSettings {
    /// API root URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key, if configured
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout_ms: 60_000,
        }
    }
}

impl ServiceSettings {
    /// Request timeout as a duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// Keeps the key out of logs
impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Fully resolved configuration
#[derive(Clone, Debug)]
pub struct DetectiveConfig {
    /// Camera settings
    pub camera: CameraSettings,

    /// Inference service settings
    pub service: ServiceSettings,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for DetectiveConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            service: ServiceSettings::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl DetectiveConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.ideal_width == 0 || self.camera.ideal_height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "camera size must be non-zero, got {}x{}",
                self.camera.ideal_width, self.camera.ideal_height
            )));
        }
        if !(self.camera.jpeg_quality > 0.0 && self.camera.jpeg_quality <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.camera.jpeg_quality
            )));
        }
        if self.service.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.service.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/emotion-detective/detective.toml` or
/// `~/.config/emotion-detective/detective.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("emotion-detective").join("detective.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resolved values are out of range. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<DetectiveConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resolved values are out of range.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<DetectiveConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment values through `env`
fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<DetectiveConfig, ConfigError> {
    // Start with defaults
    let mut config = DetectiveConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: DetectiveToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut DetectiveConfig, toml: &DetectiveToml) {
    if let Some(width) = toml.camera.ideal_width {
        config.camera.ideal_width = width;
    }
    if let Some(height) = toml.camera.ideal_height {
        config.camera.ideal_height = height;
    }
    if let Some(quality) = toml.camera.jpeg_quality {
        config.camera.jpeg_quality = quality;
    }

    if let Some(ref url) = toml.service.base_url {
        config.service.base_url.clone_from(url);
    }
    if let Some(ref model) = toml.service.model {
        config.service.model.clone_from(model);
    }
    if toml.service.api_key.is_some() {
        config.service.api_key.clone_from(&toml.service.api_key);
    }
    if let Some(timeout) = toml.service.request_timeout_ms {
        config.service.request_timeout_ms = timeout;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut DetectiveConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(key) = env("GEMINI_API_KEY").or_else(|| env("API_KEY")) {
        if !key.trim().is_empty() {
            config.service.api_key = Some(key);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(model) = env("DETECTIVE_MODEL") {
        config.service.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env("DETECTIVE_SERVICE_URL") {
        config.service.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("DETECTIVE_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.service.request_timeout_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(quality) = env("DETECTIVE_JPEG_QUALITY") {
        if let Ok(q) = quality.parse::<f32>() {
            config.camera.jpeg_quality = q;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
