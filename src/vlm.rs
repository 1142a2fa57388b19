//! Vision Language Model (VLM) client.
//!
//! Sends a gridded screenshot plus a pointer-control instruction to an
//! OpenAI-compatible chat endpoint and returns the raw text response. The
//! response is free text; turning it into actions is the codec's job
//! ([`crate::action::parse_token_list`]).
//!
//! # Configuration
//!
//! VLM settings can be configured via environment variables:
//! - `CURSOR_VISION_VLM_ENDPOINT`: API endpoint URL
//! - `CURSOR_VISION_VLM_MODEL`: Model name
//! - `CURSOR_VISION_VLM_MAX_TOKENS`: Max tokens in response
//! - `CURSOR_VISION_VLM_TIMEOUT`: Whole-request timeout (seconds)
//! - `CURSOR_VISION_VLM_CONNECT_TIMEOUT`: Connection timeout (seconds)

use base64::Engine;
use std::process::Command;

use crate::config;

/// Result type for VLM operations
pub type VlmResult<T> = Result<T, VlmError>;

/// Errors that can occur during VLM operations
#[derive(Debug)]
pub enum VlmError {
    /// Failed to connect to the VLM endpoint
    ConnectionFailed(String),
    /// Invalid response from the VLM
    InvalidResponse(String),
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for VlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VlmError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            VlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            VlmError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for VlmError {}

impl From<std::io::Error> for VlmError {
    fn from(e: std::io::Error) -> Self {
        VlmError::Io(e)
    }
}

/// Configuration for VLM client
#[derive(Debug, Clone)]
pub struct VlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name to use
    pub model: String,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Timeout for initial connection (seconds)
    pub connection_timeout: u64,
    /// Timeout for the whole request (seconds)
    pub request_timeout: u64,
}

impl Default for VlmConfig {
    fn default() -> Self {
        let cfg = config::get();
        Self {
            endpoint: cfg.vlm.endpoint.clone(),
            model: cfg.vlm.model.clone(),
            max_tokens: cfg.vlm.max_tokens,
            connection_timeout: cfg.vlm.connect_timeout,
            request_timeout: cfg.vlm.request_timeout,
        }
    }
}

impl VlmConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }
}

/// Check if a VLM endpoint is reachable (connection-only check).
///
/// This only verifies the server accepts connections - it doesn't wait for a
/// full response since VLM requests can take 30+ seconds for large images.
pub fn check_health(endpoint: &str, timeout_secs: u64) -> VlmResult<bool> {
    let url = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    let host_port = url.split('/').next().unwrap_or("127.0.0.1:8080");

    let output = Command::new("curl")
        .args([
            "-s",
            "-o", "/dev/null",
            "-w", "%{http_code}",
            "--connect-timeout", &timeout_secs.to_string(),
            "--max-time", &timeout_secs.to_string(),
            "-I",
            &format!("http://{}", host_port),
        ])
        .output()?;

    let status = String::from_utf8_lossy(&output.stdout);
    // Any HTTP status (even 4xx/5xx) means the server is reachable; 000 means
    // the connection failed entirely.
    let code: u16 = status.trim().parse().unwrap_or(0);
    Ok(code > 0)
}

/// Send an image and prompt to the VLM, returning its raw text response.
pub fn request_plan(config: &VlmConfig, image_data: &[u8], prompt: &str) -> VlmResult<String> {
    let img_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

    let request = serde_json::json!({
        "model": config.model,
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:image/png;base64,{}", img_base64)
                    }
                },
                {
                    "type": "text",
                    "text": prompt
                }
            ]
        }],
        "max_tokens": config.max_tokens
    });

    let request_json = serde_json::to_string(&request)
        .map_err(|e| VlmError::InvalidResponse(e.to_string()))?;

    let output = Command::new("curl")
        .args([
            "-s",
            "-X", "POST",
            &config.endpoint,
            "-H", "Content-Type: application/json",
            "-d", &request_json,
            "--connect-timeout", &config.connection_timeout.to_string(),
            "--max-time", &config.request_timeout.to_string(),
        ])
        .output()?;

    if !output.status.success() {
        return Err(VlmError::ConnectionFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let response: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| VlmError::InvalidResponse(e.to_string()))?;

    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("");

    // Thinking models put text under reasoning_content instead
    let result = if content.is_empty() {
        response["choices"][0]["message"]["reasoning_content"]
            .as_str()
            .ok_or_else(|| VlmError::InvalidResponse("Response contained no content".to_string()))?
    } else {
        content
    };

    Ok(result.to_string())
}

/// Build the pointer-control prompt for a gridded screenshot.
///
/// The grid lines are `grid_px` pixels apart and the cursor moves in
/// `step_px` units, so the model can count grid cells and convert them into
/// discrete moves.
pub fn build_pointer_prompt(instruction: &str, grid_px: u32, step_px: i32) -> String {
    format!(
        "You are a model specializing in GUI work. Attached is an image and an instruction. \
The image has a grid of red lines on it, each cell symbolizing {grid} pixels. \
The cursor is that of a black square. Your two actions are as follows:\n\
1. Click the screen.\n\
2. Move the cursor by {step}px ({cells} red grid units) up/down/left/right.\n\n\
Here is your goal: {instruction}\n\
Output a specific list of actions of [click] or [move left/down/up/right amount], \
or state NA if not possible. An example output may be \
Response: [move right 1, move left 20, click]. \
Only include the list of actions and nothing else. Now go.",
        grid = grid_px,
        step = step_px,
        cells = step_px as f64 / grid_px as f64,
        instruction = instruction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pointer_prompt_mentions_geometry() {
        let prompt = build_pointer_prompt("click red", 100, 10);
        assert!(prompt.contains("click red"));
        assert!(prompt.contains("100 pixels"));
        assert!(prompt.contains("10px"));
    }

    #[test]
    fn test_build_pointer_prompt_asks_for_token_list() {
        let prompt = build_pointer_prompt("click the blue button", 100, 10);
        assert!(prompt.contains("[move right 1, move left 20, click]"));
        assert!(prompt.contains("NA"));
    }

    #[test]
    fn test_vlm_config_builder() {
        let config = VlmConfig::new("http://localhost:8080")
            .model("llava")
            .max_tokens(200)
            .request_timeout(30);

        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.model, "llava");
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.request_timeout, 30);
    }
}
