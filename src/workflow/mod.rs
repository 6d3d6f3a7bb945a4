//! The job graph of the matrix workflow, from raw HiC-Pro matrices to TAD plots.
//!
//! ```text
//! convert -> merge_runs -> merge_protocols -> adjust -> normalize -> correct
//!                                                          |            |-> plot_matrix
//!                                                          |            |-> find_tads -> track_config -> plot_tads
//!                                                          |-> diagnostic_plot
//! ```
//!
//! Jobs only know each other through file names, see [`Layout`](crate::Layout).

mod plan;
mod rules;
mod run;
mod tracks;

pub use plan::{Action, Job, Plan};
pub use rules::{Rule, Wildcards};
pub use run::{execute, RunOptions, RunSummary};
pub use tracks::Tracks;

use crate::{Manifest, WorkflowConfig};

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Report, Result, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter};

/// Text representation of a [`Plan`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanFormat {
    #[default]
    Shell,
    Dot,
    Mermaid,
    Json,
}

/// Print the jobs of the workflow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct PlanArgs {
    /// Workflow configuration (JSON).
    #[cfg_attr(feature = "cli", clap(short = 'c', long, required = true))]
    pub config: PathBuf,

    #[cfg_attr(feature = "cli", clap(short = 'f', long, value_enum, default_value_t = PlanFormat::default()))]
    pub format: PlanFormat,

    /// Only plan the jobs needed for this file (repeatable).
    #[cfg_attr(feature = "cli", clap(short = 't', long = "target"))]
    pub targets: Vec<PathBuf>,

    /// Write the plan here instead of printing it.
    #[cfg_attr(feature = "cli", clap(short = 'o', long))]
    pub output: Option<PathBuf>,
}

/// Run the jobs of the workflow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct RunArgs {
    /// Workflow configuration (JSON).
    #[cfg_attr(feature = "cli", clap(short = 'c', long, required = true))]
    pub config: PathBuf,

    /// Only run the jobs needed for this file (repeatable).
    #[cfg_attr(feature = "cli", clap(short = 't', long = "target"))]
    pub targets: Vec<PathBuf>,

    /// Log the jobs that would run, without running them.
    #[cfg_attr(feature = "cli", clap(short = 'n', long))]
    pub dry_run: bool,

    /// Run jobs even when their outputs are up to date.
    #[cfg_attr(feature = "cli", clap(long))]
    pub force: bool,
}

/// Read the configuration and manifest, resolve runs and build the plan for the targets.
pub fn load<P: AsRef<Path>>(config: &Path, targets: &[P]) -> Result<Plan, Report> {
    let config = WorkflowConfig::read(config)?;
    let resolved = Manifest::read(&config.sampled_protocols)?.resolve_runs()?;
    Plan::build(&config, &resolved)?.restrict(targets)
}

/// Render the plan in the requested format.
pub fn render(plan: &Plan, format: PlanFormat) -> Result<String, Report> {
    match format {
        PlanFormat::Shell => plan.to_shell(),
        PlanFormat::Dot => Ok(plan.to_dot()),
        PlanFormat::Mermaid => plan.to_mermaid(),
        PlanFormat::Json => plan.to_json(),
    }
}

/// Build the plan and write or print it.
pub fn plan(args: &PlanArgs) -> Result<Plan, Report> {
    let plan = load(&args.config, &args.targets)?;
    let text = render(&plan, args.format)?;

    match &args.output {
        Some(path) => {
            crate::utils::create_parent_dir(path)?;
            std::fs::write(path, text).wrap_err_with(|| format!("Failed to write plan: {path:?}"))?;
            info!("Wrote {} plan: {path:?}", args.format);
        }
        None => println!("{text}"),
    }

    Ok(plan)
}

/// Build the plan and execute it.
pub fn run(args: &RunArgs) -> Result<RunSummary, Report> {
    let plan = load(&args.config, &args.targets)?;
    let options = RunOptions { dry_run: args.dry_run, force: args.force };
    execute(&plan, &options)
}
