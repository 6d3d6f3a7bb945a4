use clap::Parser;
use color_eyre::eyre::{Report, Result};
use hicflow::{cli, cli::Cli, manifest, script, workflow};

fn main() -> Result<(), Report> {
    // ------------------------------------------------------------------------
    // CLI Setup

    // Parse CLI parameters
    let args = Cli::parse();

    // initialize color_eyre crate for colorized logs
    color_eyre::install()?;

    // Set logging/verbosity level via RUST_LOG
    std::env::set_var("RUST_LOG", args.verbosity.to_string());

    // initialize env_logger crate for logging/verbosity level
    env_logger::init();

    // check which CLI command we're running
    match args.command {
        cli::Command::Script(args) => _ = script::script(&args)?,
        cli::Command::Manifest(args) => _ = manifest::manifest(&args)?,
        cli::Command::Resolve(args) => _ = manifest::resolve(&args)?,
        cli::Command::Plan(args) => _ = workflow::plan(&args)?,
        cli::Command::Run(args) => _ = workflow::run(&args)?,
    }

    Ok(())
}
