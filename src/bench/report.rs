//! Aggregation, persistence and paired comparison of benchmark records.
//!
//! The results artifact is the only state that survives a run. Everything
//! reported (success rates, mean distances, significance tests) is a pure
//! function of the records, so loading the artifact back and recomputing
//! reproduces the run's numbers exactly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::stats::{self, PairedTest};
use super::types::{AggregateResult, BenchResult, RunRecords, TrialResult};

/// Significance level for the human-readable verdict. Never gates output.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Write the results artifact as pretty-printed JSON
pub fn save_records(records: &RunRecords, path: &Path) -> BenchResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Load a results artifact written by [`save_records`]
pub fn load_records(path: &Path) -> BenchResult<RunRecords> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Summarize one agent's records.
///
/// Distance statistics cover only non-error trials. The success-rate
/// denominator is the full trial count, so errors count as misses.
pub fn aggregate(agent: &str, records: &[TrialResult]) -> AggregateResult {
    let distances: Vec<f64> = records.iter().filter_map(|r| r.distance).collect();
    let successes = records.iter().filter(|r| r.success).count();
    let errors = records.iter().filter(|r| !r.is_valid()).count();
    let trials = records.len();

    AggregateResult {
        agent: agent.to_string(),
        trials,
        errors,
        successes,
        success_rate: if trials > 0 {
            successes as f64 / trials as f64
        } else {
            0.0
        },
        mean_distance: stats::mean(&distances),
        sem_distance: stats::sem(&distances),
    }
}

/// Summarize every agent in a record set
pub fn aggregate_all(records: &RunRecords) -> Vec<AggregateResult> {
    records
        .iter()
        .map(|(agent, rs)| aggregate(agent, rs))
        .collect()
}

/// Paired comparison between exactly two agents.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Comparison {
    /// First agent (series minuend)
    pub first: String,
    /// Second agent (series subtrahend)
    pub second: String,
    /// Trial indices valid for both agents
    pub matched: usize,
    /// Paired t-test over the distance series (None when skipped)
    pub distance: Option<PairedTest>,
    /// Paired t-test over the success (0/1) series (None when skipped)
    pub success: Option<PairedTest>,
}

/// Run the paired comparison when the record set holds exactly two agents.
///
/// Series are matched by trial index: a trial on which either agent raised
/// is excluded from both series, keeping the pairing consistent. Tests that
/// cannot run (fewer than two matched samples, zero-variance differences)
/// come back as `None` and are reported as skipped, never computed with
/// degenerate inputs.
pub fn compare_pair(records: &RunRecords) -> Option<Comparison> {
    if records.len() != 2 {
        return None;
    }

    let mut iter = records.iter();
    let (first_name, first_records) = iter.next()?;
    let (second_name, second_records) = iter.next()?;

    let first_by_id = index_valid(first_records);
    let second_by_id = index_valid(second_records);

    let mut dist_a = Vec::new();
    let mut dist_b = Vec::new();
    let mut succ_a = Vec::new();
    let mut succ_b = Vec::new();

    for (test_id, &(dist, success)) in &first_by_id {
        if let Some(&(other_dist, other_success)) = second_by_id.get(test_id) {
            dist_a.push(dist);
            dist_b.push(other_dist);
            succ_a.push(if success { 1.0 } else { 0.0 });
            succ_b.push(if other_success { 1.0 } else { 0.0 });
        }
    }

    Some(Comparison {
        first: first_name.clone(),
        second: second_name.clone(),
        matched: dist_a.len(),
        distance: stats::paired_t_test(&dist_a, &dist_b),
        success: stats::paired_t_test(&succ_a, &succ_b),
    })
}

/// Valid (non-error) records keyed by trial index
fn index_valid(records: &[TrialResult]) -> BTreeMap<usize, (f64, bool)> {
    records
        .iter()
        .filter_map(|r| r.distance.map(|d| (r.test_id, (d, r.success))))
        .collect()
}

/// One-line human verdict for a paired test outcome
pub fn verdict(test: Option<&PairedTest>, metric: &str) -> String {
    match test {
        Some(t) if t.p_value < SIGNIFICANCE_LEVEL => {
            format!(
                "{}: t-stat={:.4}, p-value={:.4} -> significant difference",
                metric, t.t_stat, t.p_value
            )
        }
        Some(t) => format!(
            "{}: t-stat={:.4}, p-value={:.4} -> no significant difference",
            metric, t.t_stat, t.p_value
        ),
        None => format!("{}: test skipped (insufficient or degenerate data)", metric),
    }
}
