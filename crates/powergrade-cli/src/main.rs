//! powergrade - grade model answers to power-analysis benchmark tasks
//!
//! ## Commands
//!
//! - `run`: extract and grade every task's raw response, write the results mapping
//! - `evaluate`: grade an existing results file against the task repository
//! - `inspect`: show the extraction candidates for one task

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use powergrade_core::{
    evaluate, init_tracing, inspect, load_results, render_evaluation, render_inspection,
    render_log, render_summary, write_batch_report_json, write_results_json, BatchReportArtifact,
    BatchRunner, FsResponseStore, GraderConfig, ResponseSource, TaskSet,
};

#[derive(Parser)]
#[command(name = "powergrade")]
#[command(author = "Power Agent Benchmark Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract and grade numeric answers in model responses", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ./powergrade.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and grade every task, then write the results mapping
    Run {
        /// Task repository (JSON)
        #[arg(long, env = "POWERGRADE_TASKS")]
        tasks: Option<PathBuf>,

        /// Directory of raw responses, one `<task id>.txt` per task
        #[arg(long, env = "POWERGRADE_RAW_DIR")]
        raw_dir: Option<PathBuf>,

        /// Results mapping output path
        #[arg(short, long, env = "POWERGRADE_OUTPUT")]
        output: Option<PathBuf>,

        /// Also write the full batch report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the per-task verdict log
        #[arg(long)]
        show_log: bool,
    },

    /// Grade an existing results file without running extraction
    Evaluate {
        /// Results file: task id -> number or {"value": number, "unit": ...}
        results: PathBuf,

        /// Task repository (JSON)
        #[arg(long, env = "POWERGRADE_TASKS")]
        tasks: Option<PathBuf>,

        /// Write the evaluation as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show classification, candidates and the chosen value for one task
    Inspect {
        /// Task id
        task: String,

        /// Task repository (JSON)
        #[arg(long, env = "POWERGRADE_TASKS")]
        tasks: Option<PathBuf>,

        /// Directory of raw responses
        #[arg(long, env = "POWERGRADE_RAW_DIR")]
        raw_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            tasks,
            raw_dir,
            output,
            report,
            show_log,
        } => {
            let mut config = config;
            override_path(&mut config.paths.tasks, tasks);
            override_path(&mut config.paths.raw_dir, raw_dir);
            override_path(&mut config.paths.output, output);
            if report.is_some() {
                config.paths.report = report;
            }
            cmd_run(&config, show_log)
        }
        Commands::Evaluate {
            results,
            tasks,
            output,
        } => {
            let tasks = tasks.unwrap_or_else(|| config.paths.tasks.clone());
            cmd_evaluate(&config, &results, &tasks, output.as_deref())
        }
        Commands::Inspect {
            task,
            tasks,
            raw_dir,
        } => {
            let mut config = config;
            override_path(&mut config.paths.tasks, tasks);
            override_path(&mut config.paths.raw_dir, raw_dir);
            cmd_inspect(&config, &task)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<GraderConfig> {
    match path {
        Some(path) => {
            GraderConfig::load(path).with_context(|| format!("load config {:?}", path))
        }
        None => GraderConfig::load_default().context("load ./powergrade.toml"),
    }
}

fn override_path(slot: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn load_tasks(path: &Path) -> Result<TaskSet> {
    TaskSet::load(path).with_context(|| format!("load task repository {:?}", path))
}

fn cmd_run(config: &GraderConfig, show_log: bool) -> Result<()> {
    let tasks = load_tasks(&config.paths.tasks)?;
    let store = FsResponseStore::open(&config.paths.raw_dir)
        .with_context(|| format!("open raw responses {:?}", config.paths.raw_dir))?;

    info!(
        tasks = tasks.len(),
        raw_dir = %config.paths.raw_dir.display(),
        "grading batch"
    );
    let report = BatchRunner::new(&store, config).run(&tasks);

    write_results_json(&config.paths.output, &report.results)?;
    info!(output = %config.paths.output.display(), entries = report.results.len(), "wrote results");

    if let Some(path) = &config.paths.report {
        let artifact = BatchReportArtifact::now(&report);
        write_batch_report_json(path, &artifact)?;
        info!(report = %path.display(), "wrote batch report");
    }

    if show_log {
        print!("{}", render_log(&report));
        println!();
    }
    print!("{}", render_summary(&report));
    Ok(())
}

fn cmd_evaluate(
    config: &GraderConfig,
    results: &Path,
    tasks: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let tasks = load_tasks(tasks)?;
    let submitted =
        load_results(results).with_context(|| format!("load results {:?}", results))?;

    let report = evaluate(&tasks, &submitted, &config.tolerance);
    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&report).context("serialize evaluation")?;
        std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    }
    print!("{}", render_evaluation(&report));
    Ok(())
}

fn cmd_inspect(config: &GraderConfig, task_id: &str) -> Result<()> {
    let tasks = load_tasks(&config.paths.tasks)?;
    let task = tasks
        .get(task_id)
        .with_context(|| format!("no task with id {task_id:?}"))?;
    let store = FsResponseStore::open(&config.paths.raw_dir)
        .with_context(|| format!("open raw responses {:?}", config.paths.raw_dir))?;
    let text = store
        .fetch(task_id)?
        .with_context(|| format!("no raw response for {task_id:?}"))?;

    print!("{}", render_inspection(&inspect(task, &text, config)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "powergrade",
            "--verbose",
            "run",
            "--tasks",
            "tasks.json",
            "--raw-dir",
            "raw",
            "--show-log",
        ])
        .expect("parse");
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                tasks,
                raw_dir,
                show_log,
                ..
            } => {
                assert_eq!(tasks, Some(PathBuf::from("tasks.json")));
                assert_eq!(raw_dir, Some(PathBuf::from("raw")));
                assert!(show_log);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_inspect_requires_task_id() {
        assert!(Cli::try_parse_from(["powergrade", "inspect"]).is_err());
    }

    #[test]
    fn test_cmd_run_writes_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tasks = dir.path().join("all_tasks.json");
        std::fs::write(
            &tasks,
            r#"[{"id": "t1", "ground_truth": {"sample_size_per_group": 64}, "tolerance": {}}]"#,
        )
        .expect("write tasks");
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).expect("mkdir");
        std::fs::write(raw.join("t1.txt"), "Enroll **64** participants per arm.").expect("write");

        let mut config = GraderConfig::default();
        config.paths.tasks = tasks;
        config.paths.raw_dir = raw;
        config.paths.output = dir.path().join("out").join("agent_results.json");
        config.paths.report = Some(dir.path().join("report.json"));

        cmd_run(&config, false).expect("run");
        let written: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&config.paths.output).expect("read results"),
        )
        .expect("json");
        assert_eq!(written, serde_json::json!({"t1": 64}));
        assert!(dir.path().join("report.json").exists());
    }

    #[test]
    fn test_cmd_run_missing_raw_dir_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tasks = dir.path().join("all_tasks.json");
        std::fs::write(&tasks, "[]").expect("write tasks");

        let mut config = GraderConfig::default();
        config.paths.tasks = tasks;
        config.paths.raw_dir = dir.path().join("absent");
        assert!(cmd_run(&config, false).is_err());
    }
}
