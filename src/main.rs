use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use cursor_vision::agents::{AgentStrategy, CommandPredictor, OffsetAgent, VlmPointerAgent};
use cursor_vision::bench::{self, Benchmark, RunRecords};
use cursor_vision::canvas::Canvas;
use cursor_vision::envgen::{EnvironmentSource, SceneConfig, SyntheticSceneSource};
use cursor_vision::session::Session;
use cursor_vision::vlm::{VlmConfig, check_health};

/// Cursor Vision - GUI pointer-control benchmarking
#[derive(Parser, Debug)]
#[command(
    name = "cursor-vision",
    about = "Benchmark pointer-control agent strategies against synthetic GUI trials",
    after_help = "ENVIRONMENT VARIABLES:\n\
        CURSOR_VISION_VLM_ENDPOINT   VLM API endpoint URL\n\
        CURSOR_VISION_VLM_MODEL      VLM model name\n\
        CURSOR_VISION_SESSION_DIR    Base directory for sessions\n\
        CURSOR_VISION_STEP_PX        Pixels per discrete pointer step\n\
        CURSOR_VISION_GRID_PX        Grid overlay spacing in pixels"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run agent strategies against shared synthetic trials
    Bench {
        /// Number of trials to run
        #[arg(short, long, default_value = "5")]
        trials: usize,

        /// Agent set: vlm, offset, or hybrid (both, paired comparison)
        #[arg(short, long, default_value = "vlm")]
        agent: String,

        /// Command printing "dx dy" for an image path (offset/hybrid agents)
        #[arg(long)]
        predictor_cmd: Option<String>,

        /// Output directory for trial images and results (default: session dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep trial images after completion (default: cleanup unless --output is specified)
        #[arg(long, short = 'k')]
        keep: bool,

        /// Seed for the scene generator (default: entropy)
        #[arg(long)]
        seed: Option<u64>,

        /// Pixels per discrete pointer step
        #[arg(long, env = "CURSOR_VISION_STEP_PX", default_value = "10")]
        step: i32,

        /// VLM endpoint URL
        #[arg(long, env = "CURSOR_VISION_VLM_ENDPOINT", default_value = "http://127.0.0.1:8080/v1/chat/completions")]
        vlm_endpoint: String,

        /// VLM model name
        #[arg(long, env = "CURSOR_VISION_VLM_MODEL", default_value = "qwen3")]
        vlm_model: String,

        /// Output results as JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },

    /// Recompute aggregates and comparison from a results artifact
    Report {
        /// Path to a results.json written by `bench`
        results: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render one synthetic trial scene for inspection
    Scene {
        /// Output file path
        #[arg(short, long, default_value = "./scene.png")]
        output: PathBuf,

        /// Seed for reproducible scenes
        #[arg(long)]
        seed: Option<u64>,

        /// Also draw the measurement grid overlay
        #[arg(long)]
        grid: bool,
    },

    /// Run one strategy against an image and print its plan
    Plan {
        /// Path to the screenshot
        #[arg(short, long)]
        image: PathBuf,

        /// Natural-language instruction
        #[arg(long)]
        instruction: String,

        /// Strategy: vlm or offset
        #[arg(short, long, default_value = "vlm")]
        agent: String,

        /// Command printing "dx dy" for an image path (offset agent)
        #[arg(long)]
        predictor_cmd: Option<String>,

        /// Pixels per discrete pointer step
        #[arg(long, env = "CURSOR_VISION_STEP_PX", default_value = "10")]
        step: i32,

        /// VLM endpoint URL
        #[arg(long, env = "CURSOR_VISION_VLM_ENDPOINT", default_value = "http://127.0.0.1:8080/v1/chat/completions")]
        vlm_endpoint: String,

        /// VLM model name
        #[arg(long, env = "CURSOR_VISION_VLM_MODEL", default_value = "qwen3")]
        vlm_model: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Bench {
            trials,
            agent,
            predictor_cmd,
            output,
            keep,
            seed,
            step,
            vlm_endpoint,
            vlm_model,
            json,
        }) => {
            // Create session - if output specified, use that dir and keep by default
            let session = if let Some(ref dir) = output {
                Session::in_dir(dir).keep(true)
            } else {
                Session::with_name("bench").keep(keep)
            };
            session.init()?;

            let vlm_config = VlmConfig::new(&vlm_endpoint).model(&vlm_model);

            // Warn early when the VLM is needed but unreachable; individual
            // trials will still record the failures.
            let needs_vlm = agent == "vlm" || agent == "hybrid";
            if needs_vlm && !json {
                match check_health(&vlm_endpoint, 5) {
                    Ok(true) => eprintln!("VLM endpoint responding."),
                    Ok(false) | Err(_) => {
                        eprintln!("Warning: VLM endpoint not responding at {}", vlm_endpoint);
                        eprintln!("VLM trials will be recorded as errors.");
                    }
                }
            }

            let source = match seed {
                Some(seed) => {
                    SyntheticSceneSource::with_seed(SceneConfig::default(), &session.dir, seed)
                }
                None => SyntheticSceneSource::new(SceneConfig::default(), &session.dir),
            };

            let mut benchmark = Benchmark::new(source).step_px(step).verbose(!json);
            for (name, strategy) in build_agents(&agent, &vlm_config, predictor_cmd.as_deref(), step)? {
                benchmark = benchmark.agent(name, strategy);
            }

            if !json {
                println!(
                    "Running {} trials for agents: {:?}...",
                    trials,
                    benchmark.agent_names()
                );
            }

            let records = benchmark.run(trials)?;
            let results_path = session.results_path();
            bench::save_records(&records, &results_path)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_summary(&records);
                if session.keep {
                    let images = session.list_images()?;
                    println!(
                        "\nResults saved to {} ({} scene images)",
                        results_path.display(),
                        images.len()
                    );
                }
            }
            // Session Drop cleans up unless kept
        }

        Some(Commands::Report { results, json }) => {
            let records = bench::load_records(&results)?;
            if json {
                let report = serde_json::json!({
                    "aggregates": bench::aggregate_all(&records),
                    "comparison": bench::compare_pair(&records),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&records);
            }
        }

        Some(Commands::Scene { output, seed, grid }) => {
            let dir = tempfile_dir(&output);
            let mut source = match seed {
                Some(seed) => SyntheticSceneSource::with_seed(SceneConfig::default(), &dir, seed),
                None => SyntheticSceneSource::new(SceneConfig::default(), &dir),
            };

            let env = source.next_trial(0)?;
            let mut canvas = Canvas::from_png_file(&env.image_path)?;
            if grid {
                canvas.draw_grid(cursor_vision::config::get().pointer.grid_px, [255, 0, 0]);
            }
            canvas.save(&output)?;
            let _ = std::fs::remove_file(&env.image_path);

            println!("Created scene: {}", output.display());
            println!("  Instruction: {}", env.instruction);
            println!(
                "  Target: center ({}, {}), size {}x{}",
                env.target.center_x, env.target.center_y, env.target.width, env.target.height
            );
        }

        Some(Commands::Plan {
            image,
            instruction,
            agent,
            predictor_cmd,
            step,
            vlm_endpoint,
            vlm_model,
        }) => {
            let vlm_config = VlmConfig::new(&vlm_endpoint).model(&vlm_model);
            let mut strategies = build_agents(&agent, &vlm_config, predictor_cmd.as_deref(), step)?;
            let (name, strategy) = strategies
                .first_mut()
                .ok_or("No strategy selected")?;

            let plan = strategy.plan(&instruction, &image)?;
            println!("{} plan ({} actions):", name, plan.actions.len());
            for action in &plan.actions {
                println!("  {}", action);
            }
            for point in &plan.points {
                println!("  [{}] predicted offset ({:.1}, {:.1})", point.label, point.dx, point.dy);
            }
        }

        None => {
            println!("Cursor Vision - GUI pointer-control benchmarking");
            println!();
            println!("Usage: cursor-vision <COMMAND>");
            println!();
            println!("Commands:");
            println!("  bench   Run agent strategies against shared synthetic trials");
            println!("  report  Recompute aggregates from a results artifact");
            println!("  scene   Render one synthetic trial scene for inspection");
            println!("  plan    Run one strategy against an image and print its plan");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Build the agent set named by the selector.
///
/// `step` must match the step the simulator replays with, so agents encode
/// and prompt for the same displacement the harness scores.
fn build_agents(
    selector: &str,
    vlm_config: &VlmConfig,
    predictor_cmd: Option<&str>,
    step: i32,
) -> Result<Vec<(String, Box<dyn AgentStrategy>)>, Box<dyn Error>> {
    let mut agents: Vec<(String, Box<dyn AgentStrategy>)> = Vec::new();

    if selector == "vlm" || selector == "hybrid" {
        agents.push((
            "vlm".to_string(),
            Box::new(VlmPointerAgent::new(vlm_config.clone()).step_px(step)),
        ));
    }

    if selector == "offset" || selector == "hybrid" {
        let cmd = predictor_cmd.ok_or(
            "--predictor-cmd is required for the offset agent (a command printing \"dx dy\")",
        )?;
        agents.push((
            "offset".to_string(),
            Box::new(OffsetAgent::new(CommandPredictor::new(cmd)).step_px(step)),
        ));
    }

    if agents.is_empty() {
        return Err(format!("Unknown agent selector '{}'. Use: vlm, offset, or hybrid", selector).into());
    }

    Ok(agents)
}

/// Print per-agent aggregates and, for exactly two agents, the paired tests
fn print_summary(records: &RunRecords) {
    println!("\nBenchmark Complete.");
    for agg in bench::aggregate_all(records) {
        let dist = agg
            .mean_distance
            .map(|d| format!("{:.2}px", d))
            .unwrap_or_else(|| "n/a".to_string());
        let sem = agg
            .sem_distance
            .map(|s| format!(" (sem {:.2})", s))
            .unwrap_or_default();
        println!(
            "{}: Success Rate: {}/{} ({:.1}%), Avg Dist: {}{}, Errors: {}",
            agg.agent,
            agg.successes,
            agg.trials,
            agg.success_rate * 100.0,
            dist,
            sem,
            agg.errors
        );
    }

    if let Some(comparison) = bench::compare_pair(records) {
        println!(
            "\nStatistical Analysis ({} vs {}, {} matched trials):",
            comparison.first, comparison.second, comparison.matched
        );
        println!("{}", bench::verdict(comparison.distance.as_ref(), "Distance"));
        println!("{}", bench::verdict(comparison.success.as_ref(), "Success"));
    }
}

/// Directory a scene file should be staged in before moving to its target
fn tempfile_dir(output: &std::path::Path) -> PathBuf {
    output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursor_vision::action::{Action, Direction};
    use std::path::Path;

    #[test]
    fn test_build_agents_selectors() {
        let vlm = VlmConfig::new("http://127.0.0.1:9/v1/chat/completions");
        assert!(build_agents("offset", &vlm, None, 10).is_err());
        assert!(build_agents("teleport", &vlm, None, 10).is_err());

        let names: Vec<String> = build_agents("hybrid", &vlm, Some("true"), 10)
            .expect("hybrid set")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["vlm".to_string(), "offset".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_agents_step_reaches_offset_agent() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("predict.sh");
        std::fs::write(&script, "#!/bin/sh\necho 100 0\n").expect("write script");
        let mut perms = std::fs::metadata(&script).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let vlm = VlmConfig::new("http://127.0.0.1:9/v1/chat/completions");
        let mut agents = build_agents("offset", &vlm, script.to_str(), 20).expect("offset set");
        let (_, strategy) = agents.first_mut().expect("one agent");

        // A 100px offset at a 20px step is five moves, not ten: the agent
        // must quantize with the same step the simulator replays with
        let plan = strategy.plan("click red", Path::new("/nonexistent.png")).expect("plan");
        assert_eq!(
            plan.actions,
            vec![
                Action::Move { direction: Direction::Right, magnitude: 5 },
                Action::Click,
            ]
        );
    }
}
