//! Session management for benchmark run artifacts.
//!
//! Each benchmark run gets its own directory under a global base location,
//! holding the generated trial images, grid overlays and the results
//! artifact. Directories are cleaned up on drop unless explicitly kept.

use std::fs;
use std::path::PathBuf;

use crate::config;

/// A benchmark run session with organized file management
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,
    /// Root directory for this session
    pub dir: PathBuf,
    /// Whether to keep files after the session ends
    pub keep: bool,
}

impl Session {
    /// Create a new session with a unique ID under the configured base dir
    pub fn new() -> Self {
        let id = format!("run_{}", generate_timestamp_suffix());
        let dir = PathBuf::from(config::session_base_dir()).join(&id);

        Self { id, dir, keep: false }
    }

    /// Create a session with a specific name/prefix
    pub fn with_name(name: &str) -> Self {
        let id = format!("{}_{}", sanitize_name(name), generate_timestamp_suffix());
        let dir = PathBuf::from(config::session_base_dir()).join(&id);

        Self { id, dir, keep: false }
    }

    /// Create a session in a specific directory. User-specified directories
    /// are kept by default.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let id = dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("run_{}", generate_timestamp_suffix()));

        Self { id, dir, keep: true }
    }

    /// Set whether to keep files after the session ends
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Initialize the session directory and write run metadata
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let metadata = serde_json::json!({
            "id": self.id,
            "created": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_path = self.dir.join(".session.json");
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Path for the results artifact
    pub fn results_path(&self) -> PathBuf {
        self.dir.join("results.json")
    }

    /// List all PNG files in the session
    pub fn list_images(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    images.push(path);
                }
            }
        }
        images.sort();
        Ok(images)
    }

    /// Clean up the session directory
    pub fn cleanup(&self) -> std::io::Result<()> {
        if self.dir.exists() && !self.keep {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

/// Generate a timestamp suffix unique enough for session directories
fn generate_timestamp_suffix() -> String {
    format!(
        "{}_{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S"),
        std::process::id()
    )
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
