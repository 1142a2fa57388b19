//! Agent strategies: pluggable planners mapping (instruction, image) to a
//! discrete action plan.
//!
//! The harness is agnostic about how a plan is produced. Two production
//! strategies live here (a vision-language model prompted against a gridded
//! screenshot, and a continuous offset predictor routed through the codec)
//! plus a blanket impl so any closure can serve as a strategy in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::action::{self, Action, Displacement};
use crate::canvas::{Canvas, CanvasError};
use crate::vlm::{self, VlmConfig, VlmError};

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors raised by agent strategies.
///
/// These are caught per-agent, per-trial by the harness and recorded; they
/// never abort a benchmark run.
#[derive(Debug)]
pub enum AgentError {
    /// The vision model call failed
    Vlm(VlmError),
    /// The offset predictor failed
    Predictor(String),
    /// The scene image could not be read or re-rendered
    Canvas(CanvasError),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Vlm(err) => write!(f, "VLM error: {}", err),
            AgentError::Predictor(msg) => write!(f, "Predictor error: {}", msg),
            AgentError::Canvas(err) => write!(f, "Canvas error: {}", err),
            AgentError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Vlm(err) => Some(err),
            AgentError::Predictor(_) => None,
            AgentError::Canvas(err) => Some(err),
            AgentError::Io(err) => Some(err),
        }
    }
}

impl From<VlmError> for AgentError {
    fn from(err: VlmError) -> Self {
        AgentError::Vlm(err)
    }
}

impl From<CanvasError> for AgentError {
    fn from(err: CanvasError) -> Self {
        AgentError::Canvas(err)
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Io(err)
    }
}

/// A labeled continuous prediction, kept for diagnostics and plotting.
/// The harness never uses these for scoring.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PredictionPoint {
    pub label: String,
    pub dx: f64,
    pub dy: f64,
}

/// What a strategy hands back: the plan to score plus auxiliary points.
#[derive(Debug, Clone, Default)]
pub struct AgentPlan {
    /// Ordered action sequence; empty means "no actionable plan"
    pub actions: Vec<Action>,
    /// Continuous predictions behind the plan, for diagnostics only
    pub points: Vec<PredictionPoint>,
}

impl AgentPlan {
    pub fn from_actions(actions: Vec<Action>) -> Self {
        Self { actions, points: Vec::new() }
    }
}

/// A pointer-control strategy.
///
/// `&mut self` because strategies may hold lazily initialized clients or
/// models. Implementations should fail promptly; the harness has no timeout
/// of its own.
pub trait AgentStrategy {
    fn plan(&mut self, instruction: &str, image: &Path) -> AgentResult<AgentPlan>;
}

// Plain closures are strategies too; tests and ad-hoc experiments rely on
// this.
impl<F> AgentStrategy for F
where
    F: FnMut(&str, &Path) -> AgentResult<AgentPlan>,
{
    fn plan(&mut self, instruction: &str, image: &Path) -> AgentResult<AgentPlan> {
        self(instruction, image)
    }
}

/// Vision-language-model strategy.
///
/// Overlays a measurement grid on the screenshot, prompts the model for a
/// bracketed token list, and parses it leniently. A response without any
/// bracketed list yields an empty plan, which scores as "no movement, no
/// click" rather than an error.
pub struct VlmPointerAgent {
    vlm: VlmConfig,
    grid_px: u32,
    step_px: i32,
}

impl VlmPointerAgent {
    pub fn new(vlm: VlmConfig) -> Self {
        Self {
            vlm,
            grid_px: crate::config::get().pointer.grid_px,
            step_px: crate::config::step_px(),
        }
    }

    pub fn grid_px(mut self, grid_px: u32) -> Self {
        self.grid_px = grid_px;
        self
    }

    pub fn step_px(mut self, step_px: i32) -> Self {
        self.step_px = step_px;
        self
    }
}

/// Where the gridded copy of a scene image is written: next to the scene
/// itself, `"trial_003.png"` becoming `"trial_003_grid.png"`.
fn grid_overlay_path(image: &Path) -> PathBuf {
    let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("scene");
    image.with_file_name(format!("{}_grid.png", stem))
}

impl AgentStrategy for VlmPointerAgent {
    fn plan(&mut self, instruction: &str, image: &Path) -> AgentResult<AgentPlan> {
        let mut canvas = Canvas::from_png_file(image)?;
        canvas.draw_grid(self.grid_px, [255, 0, 0]);
        let gridded = canvas.to_png()?;
        // Keep the exact image the model saw alongside the scene
        std::fs::write(grid_overlay_path(image), &gridded)?;

        let prompt = vlm::build_pointer_prompt(instruction, self.grid_px, self.step_px);
        let response = vlm::request_plan(&self.vlm, &gridded, &prompt)?;

        let actions = action::parse_token_list(&response);
        let net = action::decode(&actions, self.step_px);
        Ok(AgentPlan {
            actions,
            points: vec![PredictionPoint {
                label: "vlm".to_string(),
                dx: net.dx,
                dy: net.dy,
            }],
        })
    }
}

/// Black-box continuous offset prediction.
///
/// The learned model behind this lives outside the crate; all the core sees
/// is an image handle in and a pixel displacement out.
pub trait OffsetPredictor {
    fn predict(&mut self, image: &Path) -> AgentResult<Displacement>;
}

/// Strategy wrapping an [`OffsetPredictor`]: the continuous estimate is
/// quantized into discrete moves through the codec.
///
/// The predictor ignores the instruction: it is trained to find the target
/// from pixels alone.
pub struct OffsetAgent<P: OffsetPredictor> {
    predictor: P,
    step_px: i32,
}

impl<P: OffsetPredictor> OffsetAgent<P> {
    pub fn new(predictor: P) -> Self {
        Self {
            predictor,
            step_px: crate::config::step_px(),
        }
    }

    pub fn step_px(mut self, step_px: i32) -> Self {
        self.step_px = step_px;
        self
    }
}

impl<P: OffsetPredictor> AgentStrategy for OffsetAgent<P> {
    fn plan(&mut self, _instruction: &str, image: &Path) -> AgentResult<AgentPlan> {
        let displacement = self.predictor.predict(image)?;
        let actions = action::encode(displacement, self.step_px);
        Ok(AgentPlan {
            actions,
            points: vec![PredictionPoint {
                label: "offset".to_string(),
                dx: displacement.dx,
                dy: displacement.dy,
            }],
        })
    }
}

/// Offset predictor that shells out to an external command.
///
/// The command receives the image path as its last argument and must print
/// two whitespace-separated numbers (`dx dy`) on stdout. This keeps the
/// learned model a process boundary away, like the VLM.
pub struct CommandPredictor {
    program: String,
    args: Vec<String>,
}

impl CommandPredictor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl OffsetPredictor for CommandPredictor {
    fn predict(&mut self, image: &Path) -> AgentResult<Displacement> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .output()?;

        if !output.status.success() {
            return Err(AgentError::Predictor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut numbers = stdout.split_whitespace().map(str::parse::<f64>);
        match (numbers.next(), numbers.next()) {
            (Some(Ok(dx)), Some(Ok(dy))) => Ok(Displacement::new(dx, dy)),
            _ => Err(AgentError::Predictor(format!(
                "Expected 'dx dy' on stdout, got: {:?}",
                stdout.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Direction;
    use pretty_assertions::assert_eq;

    struct FixedPredictor(Displacement);

    impl OffsetPredictor for FixedPredictor {
        fn predict(&mut self, _image: &Path) -> AgentResult<Displacement> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_offset_agent_encodes_prediction() {
        let mut agent = OffsetAgent::new(FixedPredictor(Displacement::new(-30.0, 20.0))).step_px(10);
        let plan = agent.plan("click red", Path::new("/nonexistent.png")).unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::Move { direction: Direction::Left, magnitude: 3 },
                Action::Move { direction: Direction::Down, magnitude: 2 },
                Action::Click,
            ]
        );
        assert_eq!(plan.points.len(), 1);
        assert_eq!(plan.points[0].dx, -30.0);
        assert_eq!(plan.points[0].dy, 20.0);
    }

    #[test]
    fn test_closure_is_a_strategy() {
        let mut strategy =
            |_: &str, _: &Path| -> AgentResult<AgentPlan> { Ok(AgentPlan::from_actions(vec![Action::Click])) };
        let plan = AgentStrategy::plan(&mut strategy, "click red", Path::new("x.png")).unwrap();
        assert_eq!(plan.actions, vec![Action::Click]);
    }

    #[test]
    fn test_grid_overlay_path_naming() {
        assert_eq!(
            grid_overlay_path(Path::new("/tmp/run/trial_003.png")),
            PathBuf::from("/tmp/run/trial_003_grid.png")
        );
    }

    #[test]
    fn test_vlm_agent_persists_grid_overlay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("trial_000.png");
        Canvas::new(200, 200, [255, 255, 255]).save(&image).expect("save scene");

        // Nothing listens on this endpoint; the model call fails, but the
        // gridded copy is written before the request goes out.
        let config = VlmConfig::new("http://127.0.0.1:9/v1/chat/completions").request_timeout(1);
        let mut agent = VlmPointerAgent::new(config).grid_px(100).step_px(10);
        assert!(agent.plan("click red", &image).is_err());

        let overlay = Canvas::from_png_file(&dir.path().join("trial_000_grid.png"))
            .expect("overlay written");
        assert_eq!(overlay.get_pixel(100, 50), [255, 0, 0]);
        assert_eq!(overlay.get_pixel(50, 50), [255, 255, 255]);
    }

    #[test]
    fn test_failing_predictor_propagates() {
        struct Failing;
        impl OffsetPredictor for Failing {
            fn predict(&mut self, _image: &Path) -> AgentResult<Displacement> {
                Err(AgentError::Predictor("checkpoint missing".to_string()))
            }
        }

        let mut agent = OffsetAgent::new(Failing).step_px(10);
        let err = agent.plan("click red", Path::new("x.png")).unwrap_err();
        assert!(err.to_string().contains("checkpoint missing"));
    }
}
