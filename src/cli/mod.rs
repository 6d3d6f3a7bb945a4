//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::manifest::{DiscoverArgs, ResolveArgs};
use crate::script::ScriptArgs;
use crate::workflow::{PlanArgs, RunArgs};
use crate::Verbosity;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function.
/// ```no_run
/// use clap::Parser;
/// let args = hicflow::Cli::parse();
/// ```
/// Here is a manual example of setting the command-line input:
/// ```rust
/// use clap::Parser;
/// use hicflow::{cli::Command, Cli};
///
/// let input = ["hicflow", "plan", "--config", "workflow.json", "--format", "mermaid", "--target", "plots/pig1/50000/1:1-5000000_tads.png"];
/// let args = Cli::parse_from(input);
///
/// let Command::Plan(plan_args) = &args.command else { panic!() };
/// assert_eq!(plan_args.targets.len(), 1);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "hicflow", author, version)]
#[clap(about = "hicflow writes nf-core/hic job scripts and runs the HiCExplorer matrix workflow.")]
pub struct Cli {
    #[clap(subcommand)]
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    #[clap(about = "Render the nf-core/hic batch-job script.")]
    Script(ScriptArgs),

    #[clap(about = "Write a manifest from a directory of nf-core/hic results.")]
    Manifest(DiscoverArgs),

    #[clap(about = "Find the sequencing runs of every manifest row.")]
    Resolve(ResolveArgs),

    #[clap(about = "Print the jobs of the matrix workflow.")]
    Plan(PlanArgs),

    #[clap(about = "Run the jobs of the matrix workflow.")]
    Run(RunArgs),
}
