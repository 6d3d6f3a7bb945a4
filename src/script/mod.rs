//! Render the cluster batch-job script that runs the nf-core/hic pipeline.
//!
//! The script is plain text: scheduler directives, environment module loads and one
//! `nextflow run` invocation with every value interpolated literally. It is written to
//! disk and never submitted from here.

#[cfg(test)]
mod tests;

use crate::utils::{self, shell_quote};

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Report, Result, WrapErr};
use indoc::formatdoc;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter};

/// The nf-core pipeline launched by the script.
pub const PIPELINE: &str = "nf-core/hic";

// ----------------------------------------------------------------------------
// Scheduler

/// Cluster scheduler, which decides the directive syntax.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scheduler {
    #[default]
    Slurm,
    Sge,
}

impl Scheduler {
    /// Comment prefix of a directive line.
    pub fn prefix(&self) -> &'static str {
        match self {
            Scheduler::Slurm => "#SBATCH",
            Scheduler::Sge => "#$",
        }
    }

    fn directives(&self, script: &JobScript) -> Vec<String> {
        let name = &script.job_name;
        let logs = script.log_dir.display();
        let mut directives = Vec::new();

        match self {
            Scheduler::Slurm => {
                directives.push(format!("--job-name={name}"));
                directives.push(format!("--output={logs}/{name}.%j.out"));
                directives.push(format!("--error={logs}/{name}.%j.err"));
                if let Some(queue) = &script.queue {
                    directives.push(format!("--partition={queue}"));
                }
                if let Some(mail) = &script.mail_user {
                    directives.push(format!("--mail-user={mail}"));
                    directives.push("--mail-type=END,FAIL".to_string());
                }
                directives.push("--nodes=1".to_string());
                directives.push(format!("--cpus-per-task={}", script.cpus));
                directives.push(format!("--mem={}", script.memory));
            }
            Scheduler::Sge => {
                directives.push(format!("-N {name}"));
                directives.push(format!("-o {logs}/{name}.out"));
                directives.push(format!("-e {logs}/{name}.err"));
                if let Some(queue) = &script.queue {
                    directives.push(format!("-q {queue}"));
                }
                if let Some(mail) = &script.mail_user {
                    directives.push(format!("-M {mail}"));
                    directives.push("-m ea".to_string());
                }
                directives.push("-cwd".to_string());
                directives.push(format!("-pe smp {}", script.cpus));
                directives.push(format!("-l h_vmem={}", script.memory));
            }
        }

        directives.into_iter().map(|d| format!("{} {d}", self.prefix())).collect()
    }
}

// ----------------------------------------------------------------------------
// Job Script

/// Variables of the batch-job script.
///
/// Every field has a default, so a parameter file only needs the values that differ.
///
/// ```rust
/// use hicflow::JobScript;
///
/// let script = JobScript { fasta: "genome/Sscrofa11.fa".into(), ..Default::default() };
/// let text = script.render();
///
/// assert!(text.starts_with("#!/bin/bash\n#SBATCH --job-name=nfcore-hic\n"));
/// assert!(text.contains("    --fasta genome/Sscrofa11.fa \\\n"));
/// assert!(text.contains("    -w results/work \\\n"));
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobScript {
    // scheduler
    pub scheduler: Scheduler,
    pub job_name: String,
    /// Directory of the scheduler's stdout and stderr logs.
    pub log_dir: PathBuf,
    pub queue: Option<String>,
    /// Address notified when the job ends or fails.
    pub mail_user: Option<String>,
    pub cpus: usize,
    /// Memory reservation, with unit (ex. `32G`).
    pub memory: String,
    /// Environment modules loaded before the pipeline runs.
    pub modules: Vec<String>,

    // pipeline runner
    /// nf-core/hic release.
    pub revision: String,
    pub profile: String,
    pub nextflow_config: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub resume: bool,

    // inputs
    pub input_dir: PathBuf,
    /// Glob of paired reads inside the input directory.
    pub read_pattern: String,
    pub fasta: PathBuf,
    pub bowtie_index: Option<PathBuf>,
    pub chromosome_size: Option<PathBuf>,
    pub restriction_fragments: Option<PathBuf>,
    pub output_dir: PathBuf,

    // alignment
    pub bwt2_opts_end2end: String,
    pub bwt2_opts_trimmed: String,
    pub min_mapq: u32,

    // valid pairs
    pub restriction_site: String,
    pub ligation_site: String,
    pub min_insert_size: u32,
    pub max_insert_size: u32,
    pub rm_dup: bool,
    pub rm_singleton: bool,

    // contact maps
    pub bin_size: Vec<u64>,
    pub ice_max_iter: u32,
    pub ice_filter_low_count_perc: f64,
    pub ice_filter_high_count_perc: f64,
    pub ice_eps: f64,

    /// Pipeline steps to skip, each rendered as `--skip_<step>`.
    pub skip: Vec<String>,
}

impl Default for JobScript {
    fn default() -> Self {
        JobScript {
            scheduler: Scheduler::default(),
            job_name: "nfcore-hic".to_string(),
            log_dir: PathBuf::from("logs"),
            queue: None,
            mail_user: None,
            cpus: 8,
            memory: "32G".to_string(),
            modules: vec!["nextflow".to_string(), "singularity".to_string()],
            revision: "1.3.1".to_string(),
            profile: "singularity".to_string(),
            nextflow_config: None,
            work_dir: None,
            resume: true,
            input_dir: PathBuf::from("reads"),
            read_pattern: "*_R{1,2}.fastq.gz".to_string(),
            fasta: PathBuf::from("genome.fa"),
            bowtie_index: None,
            chromosome_size: None,
            restriction_fragments: None,
            output_dir: PathBuf::from("results"),
            bwt2_opts_end2end: "--very-sensitive -L 30 --score-min L,-0.6,-0.2 --end-to-end --reorder"
                .to_string(),
            bwt2_opts_trimmed: "--very-sensitive -L 20 --score-min L,-0.6,-0.2 --end-to-end --reorder"
                .to_string(),
            min_mapq: 10,
            restriction_site: "^GATC".to_string(),
            ligation_site: "GATCGATC".to_string(),
            min_insert_size: 20,
            max_insert_size: 1000,
            rm_dup: true,
            rm_singleton: true,
            bin_size: vec![1_000_000, 500_000, 200_000, 50_000],
            ice_max_iter: 100,
            ice_filter_low_count_perc: 0.02,
            ice_filter_high_count_perc: 0.0,
            ice_eps: 0.1,
            skip: vec!["cool".to_string()],
        }
    }
}

impl JobScript {
    /// Nextflow work directory, `<output_dir>/work` unless set.
    pub fn work_dir(&self) -> PathBuf {
        match &self.work_dir {
            Some(dir) => dir.clone(),
            None => self.output_dir.join("work"),
        }
    }

    /// Returns the `nextflow run` arguments, one flag and its value per entry.
    pub fn pipeline_args(&self) -> Vec<String> {
        let path = |p: &Path| shell_quote(&p.to_string_lossy()).into_owned();
        let flag = |name: &str, value: &str| format!("{name} {}", shell_quote(value));

        let mut args = vec![flag("-r", &self.revision), flag("-profile", &self.profile)];
        if let Some(config) = &self.nextflow_config {
            args.push(format!("-c {}", path(config)));
        }
        args.push(format!("-w {}", path(&self.work_dir())));
        if self.resume {
            args.push("-resume".to_string());
        }

        let reads = self.input_dir.join(&self.read_pattern);
        args.push(format!("--reads {}", path(&reads)));
        args.push(format!("--fasta {}", path(&self.fasta)));
        if let Some(index) = &self.bowtie_index {
            args.push(format!("--bwt2_index {}", path(index)));
        }
        if let Some(sizes) = &self.chromosome_size {
            args.push(format!("--chromosome_size {}", path(sizes)));
        }
        if let Some(fragments) = &self.restriction_fragments {
            args.push(format!("--restriction_fragments {}", path(fragments)));
        }
        args.push(format!("--outdir {}", path(&self.output_dir)));

        args.push(flag("--bwt2_opts_end2end", &self.bwt2_opts_end2end));
        args.push(flag("--bwt2_opts_trimmed", &self.bwt2_opts_trimmed));
        args.push(format!("--min_mapq {}", self.min_mapq));

        args.push(flag("--restriction_site", &self.restriction_site));
        args.push(flag("--ligation_site", &self.ligation_site));
        args.push(format!("--min_insert_size {}", self.min_insert_size));
        args.push(format!("--max_insert_size {}", self.max_insert_size));
        if self.rm_dup {
            args.push("--rm_dup".to_string());
        }
        if self.rm_singleton {
            args.push("--rm_singleton".to_string());
        }

        args.push(flag("--bin_size", &self.bin_size.iter().join(",")));
        args.push(format!("--ice_max_iter {}", self.ice_max_iter));
        args.push(format!("--ice_filter_low_count_perc {}", self.ice_filter_low_count_perc));
        args.push(format!("--ice_filter_high_count_perc {}", self.ice_filter_high_count_perc));
        args.push(format!("--ice_eps {}", self.ice_eps));

        args.extend(self.skip.iter().map(|step| format!("--skip_{step}")));
        args
    }

    /// Render the full script text.
    pub fn render(&self) -> String {
        let directives = self.scheduler.directives(self).join("\n");
        let modules = self.modules.iter().map(|m| format!("module load {m}")).join("\n");
        let args = self.pipeline_args().iter().map(|a| format!("    {a}")).join(" \\\n");

        formatdoc! {"
            #!/bin/bash
            {directives}

            set -euo pipefail

            {modules}

            nextflow run {pipeline} \\
            {args}
            ",
            directives = directives,
            modules = modules,
            pipeline = PIPELINE,
            args = args,
        }
    }

    /// Write the rendered script to a file and make it executable.
    ///
    /// The parent directory and the log directory are created when missing.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        utils::create_parent_dir(path)?;
        if !self.log_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.log_dir)
                .wrap_err_with(|| format!("Failed to create log directory: {:?}", self.log_dir))?;
        }

        std::fs::write(path, self.render())
            .wrap_err_with(|| format!("Failed to write job script: {path:?}"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = std::fs::metadata(path)
                .wrap_err_with(|| format!("Failed to read permissions: {path:?}"))?
                .permissions();
            permissions.set_mode(permissions.mode() | 0o755);
            std::fs::set_permissions(path, permissions)
                .wrap_err_with(|| format!("Failed to make job script executable: {path:?}"))?;
        }

        debug!("Job script: {self:?}");
        info!("Wrote job script: {path:?}");
        Ok(())
    }

    /// Reads [`JobScript`] variables from a JSON file.
    pub fn read<P>(path: &P) -> Result<JobScript, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read job script parameters: {path:?}."))?;
        let script = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize job script parameters: {path:?}"))?;
        Ok(script)
    }

    /// Write [`JobScript`] variables to a JSON file.
    pub fn write_json<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        utils::create_parent_dir(path)?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize job script parameters: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write job script parameters: {path:?}"))?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Script Command

/// Render the nf-core/hic batch-job script.
///
/// Values come from the defaults, then the parameter file, then the flags below.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct ScriptArgs {
    /// Job script parameters (JSON).
    #[cfg_attr(feature = "cli", clap(short = 'p', long))]
    pub params: Option<PathBuf>,

    /// Write the script here instead of printing it.
    #[cfg_attr(feature = "cli", clap(short = 'o', long))]
    pub output: Option<PathBuf>,

    #[cfg_attr(feature = "cli", clap(long, value_enum))]
    pub scheduler: Option<Scheduler>,

    #[cfg_attr(feature = "cli", clap(short = 'n', long))]
    pub job_name: Option<String>,

    /// Directory of the paired fastq files.
    #[cfg_attr(feature = "cli", clap(short = 'i', long))]
    pub input_dir: Option<PathBuf>,

    /// Pipeline output directory.
    #[cfg_attr(feature = "cli", clap(short = 'd', long))]
    pub output_dir: Option<PathBuf>,

    /// Genome fasta.
    #[cfg_attr(feature = "cli", clap(short = 'f', long))]
    pub fasta: Option<PathBuf>,

    /// Tab-separated chromosome sizes.
    #[cfg_attr(feature = "cli", clap(long))]
    pub chromosome_size: Option<PathBuf>,

    /// Bed file of restriction fragments.
    #[cfg_attr(feature = "cli", clap(long))]
    pub restriction_fragments: Option<PathBuf>,
}

impl ScriptArgs {
    /// Returns the [`JobScript`] described by the parameter file and flag overrides.
    pub fn job_script(&self) -> Result<JobScript, Report> {
        let mut script = match &self.params {
            Some(path) => JobScript::read(path)?,
            None => JobScript::default(),
        };

        if let Some(scheduler) = self.scheduler {
            script.scheduler = scheduler;
        }
        if let Some(name) = &self.job_name {
            script.job_name = name.clone();
        }
        if let Some(dir) = &self.input_dir {
            script.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            script.output_dir = dir.clone();
        }
        if let Some(fasta) = &self.fasta {
            script.fasta = fasta.clone();
        }
        if let Some(sizes) = &self.chromosome_size {
            script.chromosome_size = Some(sizes.clone());
        }
        if let Some(fragments) = &self.restriction_fragments {
            script.restriction_fragments = Some(fragments.clone());
        }

        Ok(script)
    }
}

/// Render the job script and write or print it.
pub fn script(args: &ScriptArgs) -> Result<JobScript, Report> {
    let script = args.job_script()?;
    match &args.output {
        Some(path) => script.write(path)?,
        None => print!("{}", script.render()),
    }
    Ok(script)
}
