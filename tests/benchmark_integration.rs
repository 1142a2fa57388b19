//! End-to-end benchmark flow: synthetic scenes, scripted strategies, the
//! results artifact, and the paired comparison recomputed from disk.

use std::path::Path;

use cursor_vision::action::{Action, Direction, encode, Displacement};
use cursor_vision::agents::{AgentError, AgentPlan, AgentResult};
use cursor_vision::bench::{self, Benchmark};
use cursor_vision::envgen::{EnvironmentSource, SceneConfig, SyntheticSceneSource, TrialEnvironment, EnvResult};
use cursor_vision::scoring::TargetRect;
use pretty_assertions::assert_eq;

/// Deterministic source with the target a known offset from the start.
/// Trial geometry alternates so the two strategies diverge measurably.
struct ScriptedSource;

impl EnvironmentSource for ScriptedSource {
    fn next_trial(&mut self, test_id: usize) -> EnvResult<TrialEnvironment> {
        // Even trials put the target 100px right, odd trials 60px up
        let target = if test_id % 2 == 0 {
            TargetRect::new(400.0, 175.0, 40.0, 30.0)
        } else {
            TargetRect::new(300.0, 115.0, 40.0, 30.0)
        };
        Ok(TrialEnvironment {
            target,
            start: (300, 175),
            bounds: (600, 350),
            instruction: "click red".to_string(),
            image_path: std::path::PathBuf::from("/nonexistent/scene.png"),
        })
    }
}

fn oracle_plan(test_id_parity: bool) -> AgentPlan {
    if test_id_parity {
        // odd trial: 60px up
        AgentPlan::from_actions(encode(Displacement::new(0.0, -60.0), 10))
    } else {
        // even trial: 100px right
        AgentPlan::from_actions(encode(Displacement::new(100.0, 0.0), 10))
    }
}

#[test]
fn test_full_run_artifact_and_comparison() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results_path = dir.path().join("results.json");

    // The oracle always lands in the target; the slacker undershoots the
    // even trials by 60px and matches the oracle on odd trials.
    let mut trial = 0usize;
    let oracle = move |_: &str, _: &Path| -> AgentResult<AgentPlan> {
        let plan = oracle_plan(trial % 2 == 1);
        trial += 1;
        Ok(plan)
    };

    let mut slacker_trial = 0usize;
    let slacker = move |_: &str, _: &Path| -> AgentResult<AgentPlan> {
        let plan = if slacker_trial % 2 == 1 {
            oracle_plan(true)
        } else {
            AgentPlan::from_actions(encode(Displacement::new(40.0, 0.0), 10))
        };
        slacker_trial += 1;
        Ok(plan)
    };

    let mut benchmark = Benchmark::new(ScriptedSource)
        .step_px(10)
        .agent("oracle", Box::new(oracle))
        .agent("slacker", Box::new(slacker));

    let records = benchmark.run(6).expect("run");
    bench::save_records(&records, &results_path).expect("save");

    // Reload and confirm the artifact reproduces the run exactly
    let loaded = bench::load_records(&results_path).expect("load");
    assert_eq!(loaded, records);

    let aggregates = bench::aggregate_all(&loaded);
    assert_eq!(aggregates.len(), 2);

    let oracle_agg = aggregates.iter().find(|a| a.agent == "oracle").expect("oracle");
    assert_eq!(oracle_agg.trials, 6);
    assert_eq!(oracle_agg.successes, 6);
    assert_eq!(oracle_agg.success_rate, 1.0);
    assert_eq!(oracle_agg.mean_distance, Some(0.0));
    assert_eq!(oracle_agg.errors, 0);

    let slacker_agg = aggregates.iter().find(|a| a.agent == "slacker").expect("slacker");
    assert_eq!(slacker_agg.successes, 3);
    assert_eq!(slacker_agg.success_rate, 0.5);
    // Even trials: final x = 340, target spans [380, 420], so 40px short
    assert_eq!(slacker_agg.mean_distance, Some(20.0));

    let comparison = bench::compare_pair(&loaded).expect("two agents");
    assert_eq!(comparison.matched, 6);
    let distance_test = comparison.distance.expect("distance test");
    assert_eq!(distance_test.n, 6);
    // Oracle distances are uniformly <= slacker's, never greater
    assert!(distance_test.t_stat < 0.0);
    let success_test = comparison.success.expect("success test");
    assert_eq!(success_test.n, 6);
}

#[test]
fn test_failing_agent_recorded_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results_path = dir.path().join("results.json");

    let broken = |_: &str, _: &Path| -> AgentResult<AgentPlan> {
        Err(AgentError::Predictor("model offline".to_string()))
    };
    let clicker = |_: &str, _: &Path| -> AgentResult<AgentPlan> {
        Ok(AgentPlan::from_actions(vec![Action::Click]))
    };

    let mut benchmark = Benchmark::new(ScriptedSource)
        .step_px(10)
        .agent("broken", Box::new(broken))
        .agent("clicker", Box::new(clicker));

    let records = benchmark.run(4).expect("run survives agent failures");
    bench::save_records(&records, &results_path).expect("save");
    let loaded = bench::load_records(&results_path).expect("load");

    let broken_records = &loaded["broken"];
    assert_eq!(broken_records.len(), 4);
    for r in broken_records {
        assert!(!r.success);
        assert_eq!(r.distance, None);
        assert!(r.error.as_deref().unwrap_or("").contains("model offline"));
    }

    // All trials errored for one agent, so no pairs remain and both tests
    // are skipped rather than computed over empty series.
    let comparison = bench::compare_pair(&loaded).expect("two agents");
    assert_eq!(comparison.matched, 0);
    assert!(comparison.distance.is_none());
    assert!(comparison.success.is_none());
}

#[test]
fn test_synthetic_source_feeds_real_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = SyntheticSceneSource::with_seed(SceneConfig::default(), dir.path(), 11);

    // Strategy that reads the scene off disk, proving the source wrote it
    let reader = |_: &str, image: &Path| -> AgentResult<AgentPlan> {
        assert!(image.exists(), "scene image must exist when the agent runs");
        Ok(AgentPlan::from_actions(vec![
            Action::Move { direction: Direction::Right, magnitude: 2 },
            Action::Click,
        ]))
    };

    let mut benchmark = Benchmark::new(source).step_px(10).agent("reader", Box::new(reader));
    let records = benchmark.run(3).expect("run");

    let rs = &records["reader"];
    assert_eq!(rs.len(), 3);
    for (i, r) in rs.iter().enumerate() {
        assert_eq!(r.test_id, i);
        assert!(r.distance.is_some());
        assert_eq!(
            r.actions,
            Some(vec![
                Action::Move { direction: Direction::Right, magnitude: 2 },
                Action::Click,
            ])
        );
    }
}
