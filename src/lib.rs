//! Cursor Vision - GUI pointer-control benchmarking.
//!
//! This crate provides:
//! - A codec between continuous pixel offsets and discrete pointer actions
//! - A deterministic simulator replaying action plans with boundary clamping
//! - Point-to-rectangle distance scoring with a strict containment criterion
//! - Synthetic trial environments rendered onto an RGB canvas
//! - Pluggable agent strategies (vision model, offset predictor, closures)
//! - A benchmark harness with shared-trial fairness and paired t-tests
//!
//! # Example
//!
//! ```rust
//! use cursor_vision::action::{encode, decode, Displacement};
//! use cursor_vision::simulate::simulate;
//!
//! let plan = encode(Displacement::new(30.0, -20.0), 10);
//! assert_eq!(decode(&plan, 10), Displacement::new(30.0, -20.0));
//! let end = simulate(&plan, (300, 175), (600, 350), 10);
//! assert_eq!(end, (330, 155));
//! ```

pub mod action;
pub mod agents;
pub mod bench;
pub mod canvas;
pub mod config;
pub mod envgen;
pub mod scoring;
pub mod session;
pub mod simulate;
pub mod vlm;

// Re-export the action vocabulary
pub use action::{Action, Direction, Displacement, decode, encode, parse_token_list};

// Re-export simulation and scoring
pub use scoring::{TargetRect, distance_to_rect, is_hit};
pub use simulate::simulate;

// Re-export environment generation
pub use envgen::{EnvironmentSource, SceneConfig, SyntheticSceneSource, TrialEnvironment};

// Re-export agent strategies
pub use agents::{
    AgentError, AgentPlan, AgentResult, AgentStrategy, CommandPredictor, OffsetAgent,
    OffsetPredictor, PredictionPoint, VlmPointerAgent,
};

// Re-export the benchmark harness
pub use bench::{
    AggregateResult, BenchError, Benchmark, Comparison, PairedTest, RunRecords, TrialResult,
};

// Re-export session management
pub use session::Session;

// Re-export the VLM client
pub use vlm::{VlmConfig, VlmError, build_pointer_prompt, check_health, request_plan};
