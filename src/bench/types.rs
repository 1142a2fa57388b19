//! Types for benchmark runs and the results artifact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::action::Action;
use crate::envgen::EnvError;

/// Outcome of one agent on one trial.
///
/// `distance` is `None` and `error` is set exactly when the strategy raised;
/// otherwise `distance` is a finite non-negative number and `success` means
/// it was exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial index within the run
    pub test_id: usize,

    /// Whether the final position landed inside the target
    pub success: bool,

    /// Distance from the final position to the target rectangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,

    /// The plan that was replayed (absent when the strategy failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,

    /// Failure message raised by the strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrialResult {
    /// A scored trial
    pub fn scored(test_id: usize, distance: f64, actions: Vec<Action>) -> Self {
        Self {
            test_id,
            success: distance == 0.0,
            distance: Some(distance),
            actions: Some(actions),
            error: None,
        }
    }

    /// A trial on which the strategy raised
    pub fn failed(test_id: usize, error: String) -> Self {
        Self {
            test_id,
            success: false,
            distance: None,
            actions: None,
            error: Some(error),
        }
    }

    /// True when the strategy produced a scoreable plan
    pub fn is_valid(&self) -> bool {
        self.distance.is_some()
    }
}

/// Per-trial records for every agent in a run, keyed by agent name.
///
/// Serializes directly as the results artifact: a JSON object of ordered
/// record lists.
pub type RunRecords = BTreeMap<String, Vec<TrialResult>>;

/// Per-agent summary statistics.
///
/// Distance statistics cover only trials without errors; the success rate
/// keeps the full trial count as its denominator, so an always-failing agent
/// scores 0/N rather than being undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub agent: String,
    /// Total trials attempted
    pub trials: usize,
    /// Trials where the strategy raised
    pub errors: usize,
    /// Trials with distance exactly zero
    pub successes: usize,
    /// successes / trials
    pub success_rate: f64,
    /// Mean distance over non-error trials (None when no valid trials)
    pub mean_distance: Option<f64>,
    /// Standard error of the mean distance (None below 2 valid trials)
    pub sem_distance: Option<f64>,
}

/// Result type for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors that terminate a benchmark run.
///
/// Agent-strategy failures are not here: they are recorded in
/// [`TrialResult`] and isolated per agent, per trial. Only environment-level
/// failures abort the run.
#[derive(Debug)]
pub enum BenchError {
    /// The environment generator failed
    Environment(EnvError),
    /// Results artifact I/O failure
    Io(std::io::Error),
    /// Results artifact encode/decode failure
    Serialization(serde_json::Error),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::Environment(err) => write!(f, "Environment error: {}", err),
            BenchError::Io(err) => write!(f, "I/O error: {}", err),
            BenchError::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Environment(err) => Some(err),
            BenchError::Io(err) => Some(err),
            BenchError::Serialization(err) => Some(err),
        }
    }
}

impl From<EnvError> for BenchError {
    fn from(err: EnvError) -> Self {
        BenchError::Environment(err)
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::Io(err)
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err)
    }
}
