//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for Cursor Vision,
//! supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults matching the benchmark's reference geometry
//! - Cached global access via `config::get()`
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CURSOR_VISION_VLM_ENDPOINT` | VLM API endpoint URL | `http://127.0.0.1:8080/v1/chat/completions` |
//! | `CURSOR_VISION_VLM_MODEL` | Model name for VLM | `qwen3` |
//! | `CURSOR_VISION_VLM_MAX_TOKENS` | Maximum tokens in VLM response | `400` |
//! | `CURSOR_VISION_VLM_CONNECT_TIMEOUT` | VLM connection timeout in seconds | `10` |
//! | `CURSOR_VISION_VLM_TIMEOUT` | VLM request timeout in seconds | `120` |
//! | `CURSOR_VISION_SESSION_DIR` | Base directory for sessions | `/tmp/cursor-vision` |
//! | `CURSOR_VISION_STEP_PX` | Pixels per discrete pointer step | `10` |
//! | `CURSOR_VISION_GRID_PX` | Grid overlay spacing in pixels | `100` |

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default VLM API endpoint
pub const DEFAULT_VLM_ENDPOINT: &str = "http://127.0.0.1:8080/v1/chat/completions";

/// Default VLM model name
pub const DEFAULT_VLM_MODEL: &str = "qwen3";

/// Default max tokens for VLM responses
pub const DEFAULT_VLM_MAX_TOKENS: u32 = 400;

/// Default VLM connection timeout (seconds)
pub const DEFAULT_VLM_CONNECT_TIMEOUT: u64 = 10;

/// Default VLM request timeout (seconds)
pub const DEFAULT_VLM_REQUEST_TIMEOUT: u64 = 120;

/// Default session base directory
pub const DEFAULT_SESSION_DIR: &str = "/tmp/cursor-vision";

/// Default pixels per discrete pointer step (owned by the action codec)
pub const DEFAULT_STEP_PX: i32 = crate::action::DEFAULT_STEP_PX;

/// Default grid overlay spacing (pixels)
pub const DEFAULT_GRID_PX: u32 = 100;

/// Default synthetic canvas width (pixels)
pub const DEFAULT_CANVAS_WIDTH: u32 = 600;

/// Default synthetic canvas height (pixels)
pub const DEFAULT_CANVAS_HEIGHT: u32 = 350;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for VLM endpoint
pub const ENV_VLM_ENDPOINT: &str = "CURSOR_VISION_VLM_ENDPOINT";

/// Environment variable for VLM model
pub const ENV_VLM_MODEL: &str = "CURSOR_VISION_VLM_MODEL";

/// Environment variable for VLM max tokens
pub const ENV_VLM_MAX_TOKENS: &str = "CURSOR_VISION_VLM_MAX_TOKENS";

/// Environment variable for VLM connection timeout
pub const ENV_VLM_CONNECT_TIMEOUT: &str = "CURSOR_VISION_VLM_CONNECT_TIMEOUT";

/// Environment variable for VLM request timeout
pub const ENV_VLM_REQUEST_TIMEOUT: &str = "CURSOR_VISION_VLM_TIMEOUT";

/// Environment variable for session directory
pub const ENV_SESSION_DIR: &str = "CURSOR_VISION_SESSION_DIR";

/// Environment variable for step size
pub const ENV_STEP_PX: &str = "CURSOR_VISION_STEP_PX";

/// Environment variable for grid overlay spacing
pub const ENV_GRID_PX: &str = "CURSOR_VISION_GRID_PX";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for Cursor Vision
#[derive(Debug, Clone)]
pub struct Config {
    /// VLM configuration
    pub vlm: VlmSettings,
    /// Session configuration
    pub session: SessionSettings,
    /// Pointer and scene geometry
    pub pointer: PointerSettings,
}

/// VLM-related settings
#[derive(Debug, Clone)]
pub struct VlmSettings {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Connection timeout (seconds)
    pub connect_timeout: u64,
    /// Whole-request timeout (seconds)
    pub request_timeout: u64,
}

/// Session-related settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base directory for session storage
    pub base_dir: String,
}

/// Pointer movement and scene geometry settings
#[derive(Debug, Clone)]
pub struct PointerSettings {
    /// Pixels per discrete pointer step
    pub step_px: i32,
    /// Grid overlay spacing for VLM prompting (pixels)
    pub grid_px: u32,
    /// Synthetic canvas width
    pub canvas_width: u32,
    /// Synthetic canvas height
    pub canvas_height: u32,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            vlm: VlmSettings::from_env(),
            session: SessionSettings::from_env(),
            pointer: PointerSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            vlm: VlmSettings::defaults(),
            session: SessionSettings::defaults(),
            pointer: PointerSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl VlmSettings {
    /// Create VLM settings from environment variables
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var(ENV_VLM_ENDPOINT)
                .unwrap_or_else(|_| DEFAULT_VLM_ENDPOINT.to_string()),
            model: env::var(ENV_VLM_MODEL).unwrap_or_else(|_| DEFAULT_VLM_MODEL.to_string()),
            max_tokens: env::var(ENV_VLM_MAX_TOKENS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_VLM_MAX_TOKENS),
            connect_timeout: env::var(ENV_VLM_CONNECT_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_VLM_CONNECT_TIMEOUT),
            request_timeout: env::var(ENV_VLM_REQUEST_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_VLM_REQUEST_TIMEOUT),
        }
    }

    /// Create VLM settings with defaults
    pub fn defaults() -> Self {
        Self {
            endpoint: DEFAULT_VLM_ENDPOINT.to_string(),
            model: DEFAULT_VLM_MODEL.to_string(),
            max_tokens: DEFAULT_VLM_MAX_TOKENS,
            connect_timeout: DEFAULT_VLM_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_VLM_REQUEST_TIMEOUT,
        }
    }
}

impl SessionSettings {
    /// Create session settings from environment variables
    pub fn from_env() -> Self {
        Self {
            base_dir: env::var(ENV_SESSION_DIR).unwrap_or_else(|_| DEFAULT_SESSION_DIR.to_string()),
        }
    }

    /// Create session settings with defaults
    pub fn defaults() -> Self {
        Self {
            base_dir: DEFAULT_SESSION_DIR.to_string(),
        }
    }
}

impl PointerSettings {
    /// Create pointer settings from environment variables
    pub fn from_env() -> Self {
        Self {
            step_px: env::var(ENV_STEP_PX)
                .ok()
                .and_then(|s| s.parse::<i32>().ok())
                .filter(|&s| s > 0)
                .unwrap_or(DEFAULT_STEP_PX),
            grid_px: env::var(ENV_GRID_PX)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .filter(|&g| g > 0)
                .unwrap_or(DEFAULT_GRID_PX),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }

    /// Create pointer settings with hardcoded defaults
    pub fn defaults() -> Self {
        Self {
            step_px: DEFAULT_STEP_PX,
            grid_px: DEFAULT_GRID_PX,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

/// Get session base directory (convenience function)
pub fn session_base_dir() -> String {
    get().session.base_dir.clone()
}

/// Get the configured step size (convenience function)
pub fn step_px() -> i32 {
    get().pointer.step_px
}
