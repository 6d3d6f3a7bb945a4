//! Run the jobs of a [`Plan`] one after the other.

use crate::utils;
use crate::workflow::{Action, Job, Plan};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RunOptions {
    /// Log the jobs that would run without running them.
    pub dry_run: bool,
    /// Run jobs even when their outputs are up to date.
    pub force: bool,
}

/// Ids of the jobs that ran (or would have run) and of the jobs that were up to date.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RunSummary {
    pub ran: Vec<String>,
    pub skipped: Vec<String>,
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A job is up to date when every output exists and none is older than an input.
fn is_up_to_date(job: &Job) -> bool {
    let outputs: Option<Vec<SystemTime>> = job.outputs.iter().map(|p| modified(p)).collect();
    let Some(oldest_output) = outputs.and_then(|times| times.into_iter().min()) else {
        return false;
    };

    job.inputs.iter().all(|input| match modified(input) {
        Some(time) => time <= oldest_output,
        None => false,
    })
}

/// Run one job and check that it wrote its outputs.
fn run_job(job: &Job) -> Result<(), Report> {
    let id = job.id();
    for output in &job.outputs {
        utils::create_parent_dir(output)?;
    }

    match &job.action {
        Action::Command(argv) => {
            let (program, args) = argv.split_first().ok_or_else(|| eyre!("Job {id} has an empty command."))?;
            let status = Command::new(program)
                .args(args)
                .status()
                .wrap_err_with(|| eyre!("Failed to launch {program} for job {id}"))
                .suggestion("Check that HiCExplorer is installed and on the PATH.")?;
            if !status.success() {
                return Err(eyre!("Job {id} failed: {program} exited with {status}"));
            }
        }
        Action::Tracks(tracks) => {
            let output = job.outputs.first().ok_or_else(|| eyre!("Job {id} has no track file output."))?;
            tracks.write(output)?;
        }
    }

    let missing = job.outputs.iter().filter(|p| !p.exists()).collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(eyre!("Job {id} finished without writing: {missing:?}"));
    }
    Ok(())
}

/// Run every job of the plan in dependency order.
///
/// A job is skipped when its outputs are up to date and none of the jobs it depends on ran,
/// unless `force` is set. A job whose inputs do not exist is not launched, and the first
/// failing job stops the run.
pub fn execute(plan: &Plan, options: &RunOptions) -> Result<RunSummary, Report> {
    let mut summary = RunSummary::default();
    let mut ran = HashSet::new();

    for job in plan.order()? {
        let id = job.id();
        let parent_ran = plan.parents(job)?.iter().any(|parent| ran.contains(&parent.id()));

        if !options.force && !parent_ran && is_up_to_date(job) {
            debug!("Up to date: {id}");
            summary.skipped.push(id);
            continue;
        }

        if options.dry_run {
            info!("Would run {id}: {}", job.to_shell()?);
        } else {
            let missing = job.inputs.iter().filter(|p| !p.exists()).collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(eyre!("Job {id} is missing its inputs: {missing:?}"))
                    .suggestion("Check the matrix prefixes of the manifest and the jobs that write these files.");
            }
            info!("Running {id}");
            debug!("{}", job.to_shell()?);
            run_job(job)?;
        }

        ran.insert(id.clone());
        summary.ran.push(id);
    }

    info!("{} job(s) ran, {} up to date.", summary.ran.len(), summary.skipped.len());
    Ok(summary)
}
