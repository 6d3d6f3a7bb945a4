//! Expand the rules over the configured wildcards into a graph of jobs.

use crate::manifest::ResolvedManifest;
use crate::utils::shell_quote;
use crate::workflow::{Rule, Tracks, Wildcards};
use crate::WorkflowConfig;

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use hicflow_dag::{Dag, ToMermaid};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Job

/// What a job does once its inputs exist.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Run an external program, the first element is the executable.
    Command(Vec<String>),
    /// Write a track file.
    Tracks(Tracks),
}

/// One rule applied to one set of wildcard values.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Job {
    pub rule: Rule,
    pub wildcards: Wildcards,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub action: Action,
}

impl Job {
    fn command<I, S>(rule: Rule, wildcards: Wildcards, inputs: Vec<PathBuf>, outputs: Vec<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let argv = rule.program().into_iter().map(String::from).chain(args.into_iter().map(|a| a.to_string()));
        Job { rule, wildcards, inputs, outputs, action: Action::Command(argv.collect()) }
    }

    /// Unique name of the job: the rule and its wildcard values.
    pub fn id(&self) -> String {
        format!("{}({})", self.rule, self.wildcards)
    }

    /// Returns the job as shell text.
    ///
    /// Commands are quoted word by word, track files become a heredoc.
    pub fn to_shell(&self) -> Result<String, Report> {
        match &self.action {
            Action::Command(argv) => Ok(argv.iter().map(|a| shell_quote(a)).join(" ")),
            Action::Tracks(tracks) => {
                let output = self
                    .outputs
                    .first()
                    .ok_or_else(|| eyre!("Job {} has no output for its track file.", self.id()))?;
                let output = shell_quote(&output.to_string_lossy()).into_owned();
                Ok(format!("cat > {output} << 'EOF'\n{}EOF", tracks.render()))
            }
        }
    }
}

fn display<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().display().to_string()
}

// ----------------------------------------------------------------------------
// Plan

/// The jobs of the workflow and the dependencies between them.
///
/// A job depends on another when one of its inputs is one of the other's outputs.
/// Inputs that no job produces are expected to exist already.
#[derive(Clone, Debug)]
pub struct Plan {
    /// Jobs in the order they were declared.
    pub jobs: Vec<Job>,
    /// Job ids, with edges labelled by the files passed along.
    pub dag: Dag<String, String>,
    index: HashMap<String, usize>,
    producers: HashMap<PathBuf, usize>,
}

impl Plan {
    /// Expand every rule over samples, protocols, runs, resolutions and regions.
    ///
    /// Every sample in the configuration must have at least one manifest row.
    /// A protocol without runs still gets a merge job, with no inputs.
    pub fn build(config: &WorkflowConfig, resolved: &ResolvedManifest) -> Result<Plan, Report> {
        let layout = config.layout();
        let mut jobs = Vec::new();

        for sample in &config.samples {
            let protocols = resolved.protocols(sample);
            if protocols.is_empty() {
                return Err(eyre!("Sample {sample} has no rows in the manifest: {:?}", resolved.path))
                    .suggestion(format!("Manifest samples: {}", resolved.samples().iter().join(", ")));
            }

            for &resolution in &config.resolutions {
                let w = Wildcards::new(sample, resolution);

                for protocol in &protocols {
                    for run in resolved.runs(sample, protocol)? {
                        let matrix = resolved.raw_matrix(sample, protocol, run, resolution)?;
                        let bed = resolved.raw_bed(sample, protocol, run, resolution)?;
                        let h5 = layout.converted(sample, protocol, run, resolution);
                        let args = [
                            "--matrices".to_string(),
                            display(&matrix),
                            "--bedFileHicpro".to_string(),
                            display(&bed),
                            "--inputFormat".to_string(),
                            "hicpro".to_string(),
                            "--outputFormat".to_string(),
                            "h5".to_string(),
                            "--outFileName".to_string(),
                            display(&h5),
                        ];
                        let wildcards = w.clone().protocol(protocol).run(run);
                        jobs.push(Job::command(Rule::Convert, wildcards, vec![matrix, bed], vec![h5], args));
                    }

                    let inputs = resolved.run_matrices(&layout, sample, protocol, resolution)?;
                    let output = layout.protocol_matrix(sample, protocol, resolution);
                    jobs.push(sum(Rule::MergeRuns, w.clone().protocol(protocol), inputs, output));
                }

                let inputs = resolved.protocol_matrices(&layout, sample, resolution);
                let merged = layout.sample_matrix(sample, resolution);
                jobs.push(sum(Rule::MergeProtocols, w.clone(), inputs, merged.clone()));

                let adjusted = layout.adjusted(sample, resolution);
                let args = ["--matrix".to_string(), display(&merged), "--chromosomes".to_string()]
                    .into_iter()
                    .chain(config.chromosomes.iter().cloned())
                    .chain(["--action".to_string(), "keep".to_string()])
                    .chain(["--outFileName".to_string(), display(&adjusted)]);
                jobs.push(Job::command(Rule::Adjust, w.clone(), vec![merged], vec![adjusted.clone()], args));

                let normalized = layout.normalized(sample, resolution);
                let args = [
                    "--matrices".to_string(),
                    display(&adjusted),
                    "--normalize".to_string(),
                    config.normalize.to_string(),
                    "--outFileName".to_string(),
                    display(&normalized),
                ];
                jobs.push(Job::command(Rule::Normalize, w.clone(), vec![adjusted], vec![normalized.clone()], args));

                let corrected = layout.corrected(sample, resolution);
                let [low, high] = config.correction.filter_threshold;
                let args = [
                    "correct".to_string(),
                    "--matrix".to_string(),
                    display(&normalized),
                    "--correctionMethod".to_string(),
                    config.correction.method.to_string(),
                    "--filterThreshold".to_string(),
                    low.to_string(),
                    high.to_string(),
                    "--iterNum".to_string(),
                    config.correction.iterations.to_string(),
                    "--outFileName".to_string(),
                    display(&corrected),
                ];
                let inputs = vec![normalized.clone()];
                jobs.push(Job::command(Rule::Correct, w.clone(), inputs, vec![corrected.clone()], args));

                let diagnostic = layout.diagnostic_plot(sample, resolution);
                let args = [
                    "diagnostic_plot".to_string(),
                    "--matrix".to_string(),
                    display(&normalized),
                    "-o".to_string(),
                    display(&diagnostic),
                ];
                jobs.push(Job::command(Rule::DiagnosticPlot, w.clone(), vec![normalized], vec![diagnostic], args));

                for region in &config.regions {
                    let plot = layout.matrix_plot(sample, resolution, region);
                    let mut args = vec!["--matrix".to_string(), display(&corrected), "--region".to_string(), region.clone()];
                    if config.plot.log1p {
                        args.push("--log1p".to_string());
                    }
                    args.extend([
                        "--dpi".to_string(),
                        config.plot.dpi.to_string(),
                        "--outFileName".to_string(),
                        display(&plot),
                    ]);
                    let wildcards = w.clone().region(region);
                    jobs.push(Job::command(Rule::PlotMatrix, wildcards, vec![corrected.clone()], vec![plot], args));
                }

                let prefix = layout.tads_prefix(sample, resolution);
                let domains = layout.tads_domains(sample, resolution);
                let boundaries = layout.tads_boundaries(sample, resolution);
                let score = layout.tads_score(sample, resolution);
                let args = [
                    "--matrix".to_string(),
                    display(&corrected),
                    "--outPrefix".to_string(),
                    display(&prefix),
                    "--correctForMultipleTesting".to_string(),
                    config.tads.multiple_testing.to_string(),
                    "--thresholdComparisons".to_string(),
                    config.tads.threshold_comparisons.to_string(),
                    "--delta".to_string(),
                    config.tads.delta.to_string(),
                    "--numberOfProcessors".to_string(),
                    config.threads.to_string(),
                ];
                let outputs = vec![domains.clone(), boundaries, score.clone()];
                jobs.push(Job::command(Rule::FindTads, w.clone(), vec![corrected.clone()], outputs, args));

                let ini = layout.tracks(sample, resolution);
                let tracks = Tracks {
                    title: format!("{sample} {resolution}"),
                    matrix: corrected.clone(),
                    domains: domains.clone(),
                    score: score.clone(),
                    depth: config.plot.depth,
                    log1p: config.plot.log1p,
                };
                jobs.push(Job {
                    rule: Rule::TrackConfig,
                    wildcards: w.clone(),
                    inputs: vec![corrected.clone(), domains, score],
                    outputs: vec![ini.clone()],
                    action: Action::Tracks(tracks),
                });

                for region in &config.regions {
                    let plot = layout.tads_plot(sample, resolution, region);
                    let args = [
                        "--tracks".to_string(),
                        display(&ini),
                        "--region".to_string(),
                        region.clone(),
                        "--dpi".to_string(),
                        config.plot.dpi.to_string(),
                        "--outFileName".to_string(),
                        display(&plot),
                    ];
                    let wildcards = w.clone().region(region);
                    jobs.push(Job::command(Rule::PlotTads, wildcards, vec![ini.clone()], vec![plot], args));
                }
            }
        }

        let plan = Plan::from_jobs(jobs)?;
        info!("Planned {} jobs for {} sample(s).", plan.len(), config.samples.len());
        Ok(plan)
    }

    /// Link jobs through their files.
    ///
    /// Two jobs declaring the same output, or jobs that depend on each other, are an error.
    pub fn from_jobs(jobs: Vec<Job>) -> Result<Plan, Report> {
        let mut dag = Dag::new();
        let mut index = HashMap::new();
        let mut producers: HashMap<PathBuf, usize> = HashMap::new();

        for (i, job) in jobs.iter().enumerate() {
            let id = job.id();
            if index.insert(id.clone(), i).is_some() {
                return Err(eyre!("Job {id} is declared more than once."))
                    .suggestion("Check the configuration for repeated samples, resolutions or regions.");
            }
            dag.add_node(id.clone());

            for output in &job.outputs {
                if let Some(other) = producers.insert(output.clone(), i) {
                    return Err(eyre!(
                        "Jobs {} and {id} both write {output:?}",
                        jobs[other].id()
                    ));
                }
            }
        }

        for job in &jobs {
            let mut links: BTreeMap<usize, Vec<String>> = BTreeMap::new();
            for input in &job.inputs {
                if let Some(producer) = producers.get(input) {
                    links.entry(*producer).or_default().push(display(input));
                }
            }
            for (producer, files) in links {
                let (source, target) = (jobs[producer].id(), job.id());
                debug!("{source} -> {target}");
                dag.add_edge(source, target, files.join(", "))
                    .wrap_err_with(|| eyre!("Failed to link job {} to its inputs.", job.id()))?;
            }
        }

        Ok(Plan { jobs, dag, index, producers })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the job with this id.
    pub fn get_job(&self, id: &str) -> Result<&Job, Report> {
        self.index
            .get(id)
            .map(|i| &self.jobs[*i])
            .ok_or_else(|| eyre!("Job {id} is not in the plan."))
    }

    /// Returns the job that writes a file, if any.
    pub fn producer(&self, path: &Path) -> Option<&Job> {
        self.producers.get(path).map(|i| &self.jobs[*i])
    }

    /// Returns the jobs whose outputs are required by some other job.
    pub fn parents(&self, job: &Job) -> Result<Vec<&Job>, Report> {
        self.dag.get_parents(&job.id())?.into_iter().map(|id| self.get_job(id)).collect()
    }

    /// Returns the jobs so that every job comes after the jobs that produce its inputs.
    pub fn order(&self) -> Result<Vec<&Job>, Report> {
        self.dag.topological_order()?.into_iter().map(|id| self.get_job(id)).collect()
    }

    /// Returns the outputs of jobs that no other job depends on.
    pub fn final_outputs(&self) -> Result<Vec<&Path>, Report> {
        let mut outputs = Vec::new();
        for job in &self.jobs {
            if self.dag.get_children(&job.id())?.is_empty() {
                outputs.extend(job.outputs.iter().map(|p| p.as_path()));
            }
        }
        Ok(outputs)
    }

    /// Returns a new [`Plan`] with only the jobs needed to produce the targets.
    ///
    /// An empty target list keeps every job.
    pub fn restrict<P: AsRef<Path>>(&self, targets: &[P]) -> Result<Plan, Report> {
        if targets.is_empty() {
            return Ok(self.clone());
        }

        let mut keep = HashSet::new();
        for target in targets {
            let target = target.as_ref();
            let target = target.strip_prefix(".").unwrap_or(target);
            let job = self.producer(target).ok_or_else(|| {
                let outputs: Vec<String> =
                    self.final_outputs().unwrap_or_default().into_iter().take(3).map(display).collect();
                eyre!("No job produces the target {target:?}")
                    .suggestion(format!("Final outputs include: {}", outputs.join(", ")))
            })?;
            let id = job.id();
            keep.extend(self.dag.get_ancestors(&id)?.into_iter().cloned());
            keep.insert(id);
        }

        let jobs = self.jobs.iter().filter(|job| keep.contains(&job.id())).cloned().collect();
        let plan = Plan::from_jobs(jobs)?;
        info!("Restricted the plan to {} of {} jobs.", plan.len(), self.len());
        Ok(plan)
    }

    /// Returns the plan as a shell script, jobs in dependency order.
    pub fn to_shell(&self) -> Result<String, Report> {
        let mut script = String::from("#!/bin/bash\nset -euo pipefail\n");
        for job in self.order()? {
            let dirs = job
                .outputs
                .iter()
                .filter_map(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| shell_quote(&p.to_string_lossy()).into_owned())
                .unique()
                .collect_vec();

            script.push_str(&format!("\n# {}\n", job.id()));
            if !dirs.is_empty() {
                script.push_str(&format!("mkdir -p {}\n", dirs.join(" ")));
            }
            script.push_str(&job.to_shell()?);
            script.push('\n');
        }
        Ok(script)
    }

    /// Returns the plan as a [DOT](https://graphviz.org/doc/info/lang.html) graph.
    pub fn to_dot(&self) -> String {
        self.dag.to_dot()
    }

    /// Returns the plan as a [Mermaid](https://mermaid.js.org/) graph.
    pub fn to_mermaid(&self) -> Result<String, Report> {
        self.dag.to_mermaid()
    }

    /// Returns the jobs, in dependency order, as pretty JSON.
    pub fn to_json(&self) -> Result<String, Report> {
        let jobs = self.order()?;
        serde_json::to_string_pretty(&jobs).wrap_err("Failed to serialize the plan.")
    }
}

/// A `hicSumMatrices` job.
fn sum(rule: Rule, wildcards: Wildcards, inputs: Vec<PathBuf>, output: PathBuf) -> Job {
    let args = std::iter::once("--matrices".to_string())
        .chain(inputs.iter().map(display))
        .chain(["--outFileName".to_string(), display(&output)])
        .collect_vec();
    Job::command(rule, wildcards, inputs, vec![output], args)
}
