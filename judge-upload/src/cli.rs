//! This module implements the CLI interface for judge-upload: command parsing,
//! settings resolution and the user-visible output of a run.
//!
//! All workflow logic (validation, upload and submission ordering) lives in the
//! [`judge-upload-core`] crate. This module only wires settings, the HTTP
//! client and the core workflow together.
//!
//! ## How To Use
//! - From the command line: `judge-upload submit` in the directory holding the
//!   `<data set>.out.txt` files and the `.builds` directory.
//! - Programmatically / in integration tests: call [`run`] with a constructed [`Cli`].
//!
//! [`judge-upload-core`]: ../../judge-upload-core/
use crate::builds::default_solution;
use crate::client::JudgeClient;
use crate::load_config::{load_settings_from_env, Settings};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use judge_upload_core::submit::submit_validated;
use judge_upload_core::validate::{validate_solution, Solution};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI for judge-upload: upload solutions to the judge and submit them.
#[derive(Parser)]
#[clap(
    name = "judge-upload",
    version,
    about = "Upload solution outputs and sources to the judge service and submit them per data set"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "debug", "judge_upload=trace")
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every file and submit each data set
    Submit(SolutionArgs),
    /// Resolve settings and validate the solution without contacting the judge
    Check(SolutionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SolutionArgs {
    /// Optional YAML config file (api_base, builds_dir, data_sets)
    #[clap(long, env = "JUDGE_UPLOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of previous builds; the entry sorting last is submitted as sources
    #[clap(long)]
    pub builds_dir: Option<PathBuf>,

    /// Directory holding the `<data set>.out.txt` files
    #[clap(long, default_value = ".")]
    pub outputs_dir: PathBuf,

    /// JSON file with an explicit solution object, e.g. {"a_example": "a.txt", "sources": "src.zip"}
    #[clap(long)]
    pub solution: Option<PathBuf>,
}

fn read_solution_file(path: &Path, settings: &Settings) -> Result<Solution> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read solution file {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse solution JSON {}", path.display()))?;
    Ok(validate_solution(&raw, &settings.data_sets)?)
}

fn resolve_solution(args: &SolutionArgs, settings: &Settings) -> Result<Solution> {
    match &args.solution {
        Some(path) => read_solution_file(path, settings),
        None => {
            let builds_dir = args.builds_dir.as_deref().unwrap_or(settings.builds_dir.as_path());
            default_solution(&settings.data_sets, &args.outputs_dir, builds_dir)
        }
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Submit(args) => {
            let settings = load_settings_from_env(args.config.as_deref())?;
            let solution = resolve_solution(&args, &settings)?;
            tracing::info!(command = "submit", files = solution.outputs().len() + 1, "Starting submission");

            let client = JudgeClient::from_settings(&settings);
            match submit_validated(&client, &solution).await {
                Ok(report) => {
                    tracing::info!(command = "submit", submitted = report.len(), "Submission complete");
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "submit", error = %e, "Submission failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Check(args) => {
            let settings = load_settings_from_env(args.config.as_deref())?;
            let solution = resolve_solution(&args, &settings)?;
            tracing::info!(command = "check", "Solution is valid");
            for (key, path) in solution.files() {
                println!("{key}: {}", path.display());
            }
            Ok(())
        }
    }
}
