//! Benchmark orchestration.
//!
//! A run is a strict sequence: generate one environment per trial, evaluate
//! every registered strategy against that same environment, score each plan
//! through the simulator, and accumulate per-agent records. Everything is
//! single-threaded on purpose: the paired statistics downstream need
//! per-trial alignment across agents, which sequential execution makes
//! trivial to guarantee.

use std::collections::BTreeMap;

use super::types::{BenchResult, RunRecords, TrialResult};
use crate::agents::AgentStrategy;
use crate::envgen::EnvironmentSource;
use crate::scoring::distance_to_rect;
use crate::simulate::simulate;

/// Runs registered agent strategies against shared synthetic trials.
pub struct Benchmark<E: EnvironmentSource> {
    source: E,
    agents: Vec<(String, Box<dyn AgentStrategy>)>,
    step_px: i32,
    verbose: bool,
}

impl<E: EnvironmentSource> Benchmark<E> {
    pub fn new(source: E) -> Self {
        Self {
            source,
            agents: Vec::new(),
            step_px: crate::config::get().pointer.step_px,
            verbose: false,
        }
    }

    /// Override the pixel step used for simulation
    pub fn step_px(mut self, step_px: i32) -> Self {
        self.step_px = step_px;
        self
    }

    /// Print per-trial progress while running
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Register a named strategy. Registration order is evaluation order
    /// within each trial.
    pub fn agent(mut self, name: impl Into<String>, strategy: Box<dyn AgentStrategy>) -> Self {
        self.agents.push((name.into(), strategy));
        self
    }

    /// Names of the registered strategies, in evaluation order
    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Run `num_trials` trials and return per-agent records.
    ///
    /// Each trial's environment is generated once and shared across all
    /// agents. A strategy failure is recorded and isolated: it never aborts
    /// the run or affects other agents. A generator failure, by contrast,
    /// terminates the run.
    pub fn run(&mut self, num_trials: usize) -> BenchResult<RunRecords> {
        let mut records: RunRecords = BTreeMap::new();
        for (name, _) in &self.agents {
            records.insert(name.clone(), Vec::with_capacity(num_trials));
        }

        for test_id in 0..num_trials {
            let env = self.source.next_trial(test_id)?;
            if self.verbose {
                println!("\nTest {}/{}", test_id + 1, num_trials);
                println!("Instruction: {}", env.instruction);
            }

            for (name, strategy) in &mut self.agents {
                let result = match strategy.plan(&env.instruction, &env.image_path) {
                    Ok(plan) => {
                        let end = simulate(&plan.actions, env.start, env.bounds, self.step_px);
                        let distance =
                            distance_to_rect(&env.target, (end.0 as f64, end.1 as f64));
                        if self.verbose {
                            println!(
                                "  {}: final ({}, {}), dist {:.2}, success {}",
                                name,
                                end.0,
                                end.1,
                                distance,
                                distance == 0.0
                            );
                        }
                        TrialResult::scored(test_id, distance, plan.actions)
                    }
                    Err(err) => {
                        if self.verbose {
                            println!("  {}: failed: {}", name, err);
                        }
                        TrialResult::failed(test_id, err.to_string())
                    }
                };

                // Registered in the constructor loop above
                records
                    .get_mut(name.as_str())
                    .expect("agent registered")
                    .push(result);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Direction};
    use crate::agents::{AgentError, AgentPlan, AgentResult};
    use crate::envgen::{EnvResult, TrialEnvironment};
    use crate::scoring::TargetRect;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    /// Fixed-geometry source that never touches the filesystem: the target
    /// is a 40x30 button centered 50px right of the start position.
    struct FixedSource {
        generated: usize,
    }

    impl EnvironmentSource for FixedSource {
        fn next_trial(&mut self, test_id: usize) -> EnvResult<TrialEnvironment> {
            self.generated += 1;
            Ok(TrialEnvironment {
                target: TargetRect::new(350.0, 175.0, 40.0, 30.0),
                start: (300, 175),
                bounds: (600, 350),
                instruction: format!("click red #{}", test_id),
                image_path: PathBuf::from("/nonexistent/scene.png"),
            })
        }
    }

    fn perfect_plan() -> AgentPlan {
        AgentPlan::from_actions(vec![
            Action::Move { direction: Direction::Right, magnitude: 5 },
            Action::Click,
        ])
    }

    #[test]
    fn test_run_scores_perfect_agent() {
        let source = FixedSource { generated: 0 };
        let mut bench = Benchmark::new(source)
            .step_px(10)
            .agent("perfect", Box::new(|_: &str, _: &Path| -> AgentResult<AgentPlan> { Ok(perfect_plan()) }));

        let records = bench.run(4).expect("run");
        let results = &records["perfect"];
        assert_eq!(results.len(), 4);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.test_id, i);
            assert!(r.success);
            assert_eq!(r.distance, Some(0.0));
        }
    }

    #[test]
    fn test_agent_failure_is_isolated() {
        let source = FixedSource { generated: 0 };
        let mut bench = Benchmark::new(source)
            .step_px(10)
            .agent(
                "raising",
                Box::new(|_: &str, _: &Path| -> AgentResult<AgentPlan> {
                    Err(AgentError::Predictor("always broken".to_string()))
                }),
            )
            .agent("perfect", Box::new(|_: &str, _: &Path| -> AgentResult<AgentPlan> { Ok(perfect_plan()) }));

        let records = bench.run(3).expect("run must not abort");

        let raising = &records["raising"];
        assert_eq!(raising.len(), 3);
        assert!(raising.iter().all(|r| !r.success && r.distance.is_none()));
        assert!(raising.iter().all(|r| r.error.as_deref() == Some("Predictor error: always broken")));

        // The other agent is unaffected
        let perfect = &records["perfect"];
        assert_eq!(perfect.len(), 3);
        assert!(perfect.iter().all(|r| r.success));
    }

    #[test]
    fn test_environment_shared_across_agents() {
        // Both agents record the instruction they saw; per trial they must
        // match exactly because the environment is generated once.
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));

        let a = seen_a.clone();
        let b = seen_b.clone();

        let source = FixedSource { generated: 0 };
        let mut bench = Benchmark::new(source)
            .step_px(10)
            .agent(
                "a",
                Box::new(move |instruction: &str, _: &Path| -> AgentResult<AgentPlan> {
                    a.borrow_mut().push(instruction.to_string());
                    Ok(AgentPlan::from_actions(vec![Action::Click]))
                }),
            )
            .agent(
                "b",
                Box::new(move |instruction: &str, _: &Path| -> AgentResult<AgentPlan> {
                    b.borrow_mut().push(instruction.to_string());
                    Ok(AgentPlan::from_actions(vec![Action::Click]))
                }),
            );

        bench.run(5).expect("run");
        assert_eq!(*seen_a.borrow(), *seen_b.borrow());
        assert_eq!(seen_a.borrow().len(), 5);
    }

    #[test]
    fn test_empty_plan_scores_as_miss() {
        let source = FixedSource { generated: 0 };
        let mut bench = Benchmark::new(source).step_px(10).agent(
            "no_plan",
            Box::new(|_: &str, _: &Path| -> AgentResult<AgentPlan> { Ok(AgentPlan::from_actions(Vec::new())) }),
        );

        let records = bench.run(1).expect("run");
        let r = &records["no_plan"][0];
        // No movement from (300, 175); target edge starts at x=330
        assert!(!r.success);
        assert_eq!(r.distance, Some(30.0));
        assert_eq!(r.actions, Some(Vec::new()));
    }
}
