//! Synthetic trial environment generation.
//!
//! A trial environment is generated exactly once per trial and then shared,
//! read-only, by every agent strategy evaluated in that trial. That sharing
//! is what makes the harness's paired statistics valid, so the environment
//! type is immutable by construction: nothing downstream can alter the
//! target, start position or canvas bounds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use crate::canvas::{Canvas, CanvasError};
use crate::scoring::TargetRect;

/// One synthetic trial: target region, scene image and instruction.
///
/// `image_path` is an opaque handle as far as the harness is concerned; only
/// agent strategies inspect the pixels behind it.
#[derive(Debug, Clone)]
pub struct TrialEnvironment {
    /// Region the pointer must land in
    pub target: TargetRect,
    /// Initial pointer position (canvas center)
    pub start: (i32, i32),
    /// Canvas bounds as (width, height); positions clamp to [0, bound]
    pub bounds: (i32, i32),
    /// Natural-language instruction handed to agents
    pub instruction: String,
    /// Path to the rendered scene image
    pub image_path: PathBuf,
}

/// Result type for environment generation
pub type EnvResult<T> = Result<T, EnvError>;

/// Errors that can occur while generating a trial environment
#[derive(Debug)]
pub enum EnvError {
    /// Button placement failed repeatedly (canvas too crowded)
    Placement(String),
    /// Scene image could not be rendered or written
    Canvas(CanvasError),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for EnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvError::Placement(msg) => write!(f, "Placement error: {}", msg),
            EnvError::Canvas(err) => write!(f, "Canvas error: {}", err),
            EnvError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for EnvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnvError::Placement(_) => None,
            EnvError::Canvas(err) => Some(err),
            EnvError::Io(err) => Some(err),
        }
    }
}

impl From<CanvasError> for EnvError {
    fn from(err: CanvasError) -> Self {
        EnvError::Canvas(err)
    }
}

impl From<std::io::Error> for EnvError {
    fn from(err: std::io::Error) -> Self {
        EnvError::Io(err)
    }
}

/// Pluggable supplier of trial environments.
///
/// The harness calls this once per trial. Implementations may render
/// synthetic scenes, replay recorded screenshots, or anything else that
/// yields a target plus an image.
pub trait EnvironmentSource {
    fn next_trial(&mut self, test_id: usize) -> EnvResult<TrialEnvironment>;
}

/// Named button colors available to synthetic scenes
pub const BUTTON_COLORS: [(&str, [u8; 3]); 5] = [
    ("green", [0, 128, 0]),
    ("red", [255, 0, 0]),
    ("orange", [255, 165, 0]),
    ("blue", [0, 0, 255]),
    ("purple", [128, 0, 128]),
];

/// Geometry and content knobs for synthetic scenes
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Button width in pixels
    pub button_width: u32,
    /// Button height in pixels
    pub button_height: u32,
    /// Minimum center-to-center distance between buttons, and margin from
    /// the canvas edges
    pub min_separation: f64,
    /// Half-size of the cursor square (full size is 2*h+1)
    pub cursor_half: i32,
    /// Color name of the button the instruction points at. Fixed rather than
    /// sampled so every trial asks for the same kind of target.
    pub target_color: &'static str,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let cfg = crate::config::get();
        Self {
            width: cfg.pointer.canvas_width,
            height: cfg.pointer.canvas_height,
            button_width: 40,
            button_height: 30,
            min_separation: 80.0,
            cursor_half: 6,
            target_color: "red",
        }
    }
}

/// Renders random-button scenes: a white canvas, a black cursor square at
/// the center, and five colored buttons at non-overlapping positions.
pub struct SyntheticSceneSource {
    config: SceneConfig,
    output_dir: PathBuf,
    rng: StdRng,
}

/// Placement attempts per button before the whole scene is re-rolled
const PLACEMENT_ATTEMPTS: usize = 100;

/// Scene re-rolls before giving up entirely
const SCENE_ATTEMPTS: usize = 10;

impl SyntheticSceneSource {
    /// Create a source writing scene images into `output_dir`
    pub fn new(config: SceneConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a deterministic source for reproducible runs
    pub fn with_seed(config: SceneConfig, output_dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample button centers, one per color, with minimum separation.
    /// Returns None when the target color could not be placed.
    fn sample_positions(&mut self) -> Option<Vec<(&'static str, [u8; 3], i32, i32)>> {
        let cfg = &self.config;
        let margin = cfg.min_separation as i32;
        let (x_max, y_max) = (cfg.width as i32 - margin, cfg.height as i32 - margin);
        if x_max < margin || y_max < margin {
            return None;
        }

        let mut placed: Vec<(&'static str, [u8; 3], i32, i32)> = Vec::new();
        for (name, rgb) in BUTTON_COLORS {
            for _ in 0..PLACEMENT_ATTEMPTS {
                let x = self.rng.gen_range(margin..=x_max);
                let y = self.rng.gen_range(margin..=y_max);
                let clear = placed.iter().all(|&(_, _, px, py)| {
                    ((x - px).pow(2) + (y - py).pow(2)) as f64 > cfg.min_separation.powi(2)
                });
                if clear {
                    placed.push((name, rgb, x, y));
                    break;
                }
            }
        }

        if placed.iter().any(|&(name, ..)| name == self.config.target_color) {
            Some(placed)
        } else {
            None
        }
    }

    /// Render one scene, returning the canvas and the target rectangle
    fn render_scene(&mut self) -> EnvResult<(Canvas, TargetRect)> {
        for _ in 0..SCENE_ATTEMPTS {
            let Some(buttons) = self.sample_positions() else {
                continue;
            };

            let cfg = &self.config;
            let mut canvas = Canvas::new(cfg.width, cfg.height, [255, 255, 255]);

            // Cursor starts at the canvas center
            let (cx, cy) = (cfg.width as i32 / 2, cfg.height as i32 / 2);
            let cursor_size = (cfg.cursor_half * 2 + 1) as u32;
            canvas.draw_button(cx, cy, cursor_size, cursor_size, [0, 0, 0], [0, 0, 0]);

            let mut target = None;
            for (name, rgb, x, y) in buttons {
                canvas.draw_button(x, y, cfg.button_width, cfg.button_height, rgb, [0, 0, 0]);
                if name == cfg.target_color {
                    target = Some(TargetRect::new(
                        x as f64,
                        y as f64,
                        cfg.button_width as f64,
                        cfg.button_height as f64,
                    ));
                }
            }

            // sample_positions guarantees the target was placed
            if let Some(target) = target {
                return Ok((canvas, target));
            }
        }

        Err(EnvError::Placement(format!(
            "Could not place a {} button after {} scene attempts",
            self.config.target_color, SCENE_ATTEMPTS
        )))
    }
}

impl EnvironmentSource for SyntheticSceneSource {
    fn next_trial(&mut self, test_id: usize) -> EnvResult<TrialEnvironment> {
        let (canvas, target) = self.render_scene()?;

        std::fs::create_dir_all(&self.output_dir)?;
        let image_path = self.output_dir.join(format!("trial_{:03}.png", test_id));
        canvas.save(&image_path)?;

        let cfg = &self.config;
        Ok(TrialEnvironment {
            target,
            start: (cfg.width as i32 / 2, cfg.height as i32 / 2),
            bounds: (cfg.width as i32, cfg.height as i32),
            instruction: format!("click {}", cfg.target_color),
            image_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::distance_to_rect;

    fn seeded_source(dir: &std::path::Path, seed: u64) -> SyntheticSceneSource {
        SyntheticSceneSource::with_seed(SceneConfig::default(), dir, seed)
    }

    #[test]
    fn test_next_trial_geometry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = seeded_source(dir.path(), 7);

        let env = source.next_trial(0).expect("trial");
        assert_eq!(env.start, (300, 175));
        assert_eq!(env.bounds, (600, 350));
        assert_eq!(env.instruction, "click red");
        assert!(env.image_path.exists());

        // Target rect fully inside the canvas
        let (xmin, xmax, ymin, ymax) = env.target.edges();
        assert!(xmin >= 0.0 && xmax <= 600.0);
        assert!(ymin >= 0.0 && ymax <= 350.0);
    }

    #[test]
    fn test_scene_draws_target_pixels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = seeded_source(dir.path(), 42);

        let env = source.next_trial(0).expect("trial");
        let canvas = Canvas::from_png_file(&env.image_path).expect("load scene");

        // Center of the target rect is filled with the red button color
        let px = canvas.get_pixel(env.target.center_x as i32, env.target.center_y as i32);
        assert_eq!(px, [255, 0, 0]);
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let dir_a = tempfile::tempdir().expect("tempdir");
        let dir_b = tempfile::tempdir().expect("tempdir");

        let env_a = seeded_source(dir_a.path(), 99).next_trial(0).expect("trial");
        let env_b = seeded_source(dir_b.path(), 99).next_trial(0).expect("trial");
        assert_eq!(env_a.target, env_b.target);
    }

    #[test]
    fn test_buttons_do_not_cover_start() {
        // Buttons keep an 80px margin from edges and each other; the cursor
        // start can still be covered in principle, but the target center must
        // never be closer than its own footprint allows to the edges.
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = seeded_source(dir.path(), 3);
        for test_id in 0..5 {
            let env = source.next_trial(test_id).expect("trial");
            let d = distance_to_rect(&env.target, (env.target.center_x, env.target.center_y));
            assert_eq!(d, 0.0);
        }
    }
}
