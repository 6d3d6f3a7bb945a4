//! Parameters of the matrix workflow, read from a JSON file.

#[cfg(test)]
mod tests;

use crate::Layout;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString};

// ----------------------------------------------------------------------------
// Tool options

/// Normalization applied before correction (`hicNormalize --normalize`).
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Normalize {
    #[default]
    NormRange,
    Smallest,
    Multiplicative,
}

/// Matrix balancing method (`hicCorrectMatrix --correctionMethod`).
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize)]
pub enum CorrectionMethod {
    #[default]
    #[serde(rename = "ICE")]
    #[strum(serialize = "ICE")]
    Ice,
    #[serde(rename = "KR")]
    #[strum(serialize = "KR")]
    Kr,
}

/// Multiple testing correction of the TAD caller (`hicFindTADs --correctForMultipleTesting`).
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MultipleTesting {
    #[default]
    Fdr,
    Bonferroni,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Correction {
    pub method: CorrectionMethod,
    /// Lower and upper z-score thresholds for filtering bins.
    pub filter_threshold: [f64; 2],
    pub iterations: u32,
}

impl Default for Correction {
    fn default() -> Self {
        Correction { method: CorrectionMethod::default(), filter_threshold: [-1.5, 5.0], iterations: 500 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tads {
    pub threshold_comparisons: f64,
    pub delta: f64,
    pub multiple_testing: MultipleTesting,
}

impl Default for Tads {
    fn default() -> Self {
        Tads { threshold_comparisons: 0.05, delta: 0.01, multiple_testing: MultipleTesting::default() }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Plot {
    pub log1p: bool,
    pub dpi: u32,
    /// Depth of the matrix track in `tracks.ini`, in base pairs.
    pub depth: u64,
}

impl Default for Plot {
    fn default() -> Self {
        Plot { log1p: true, dpi: 300, depth: 1_500_000 }
    }
}

// ----------------------------------------------------------------------------
// Workflow Config

/// Everything the job graph needs besides the manifest rows.
///
/// ```rust
/// use hicflow::WorkflowConfig;
///
/// let config: WorkflowConfig = serde_json::from_str(r#"{
///     "sampled_protocols": "sampled_protocols.tsv",
///     "chromosomes": ["1", "2", "X"],
///     "resolutions": [1000000, 500000],
///     "regions": ["1:1000000-5000000"],
///     "samples": ["pig1"]
/// }"#)?;
///
/// assert_eq!(config.threads, 1);
/// assert_eq!(config.correction.filter_threshold, [-1.5, 5.0]);
/// config.check()?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Tab-separated manifest of (sample, protocol, matrixprefix) rows.
    pub sampled_protocols: PathBuf,
    /// Chromosomes kept by the adjustment step.
    pub chromosomes: Vec<String>,
    /// Bin sizes in base pairs.
    pub resolutions: Vec<u64>,
    /// Genomic regions to plot, `chrom:start-end`.
    #[serde(default)]
    pub regions: Vec<String>,
    pub samples: Vec<String>,
    #[serde(default = "WorkflowConfig::default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "WorkflowConfig::default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub normalize: Normalize,
    #[serde(default)]
    pub correction: Correction,
    #[serde(default)]
    pub tads: Tads,
    #[serde(default)]
    pub plot: Plot,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            sampled_protocols: PathBuf::from("sampled_protocols.tsv"),
            chromosomes: Vec::new(),
            resolutions: vec![1_000_000, 500_000, 200_000, 50_000],
            regions: Vec::new(),
            samples: Vec::new(),
            output_dir: WorkflowConfig::default_output_dir(),
            threads: WorkflowConfig::default_threads(),
            normalize: Normalize::default(),
            correction: Correction::default(),
            tads: Tads::default(),
            plot: Plot::default(),
        }
    }
}

impl WorkflowConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_threads() -> usize {
        1
    }

    /// Returns the [`Layout`] rooted at the output directory.
    pub fn layout(&self) -> Layout {
        Layout::new(&self.output_dir)
    }

    /// Check that the configuration describes at least one job.
    pub fn check(&self) -> Result<(), Report> {
        if self.samples.is_empty() {
            return Err(eyre!("The workflow configuration lists no samples."))
                .suggestion("Add sample names to the \"samples\" key.");
        }
        if self.resolutions.is_empty() {
            return Err(eyre!("The workflow configuration lists no resolutions."))
                .suggestion("Add bin sizes (in base pairs) to the \"resolutions\" key.");
        }
        if self.chromosomes.is_empty() {
            return Err(eyre!("The workflow configuration lists no chromosomes."))
                .suggestion("Add the chromosomes to keep to the \"chromosomes\" key.");
        }
        if let Some(zero) = self.resolutions.iter().find(|r| **r == 0) {
            return Err(eyre!("Invalid resolution: {zero}"));
        }
        let [low, high] = self.correction.filter_threshold;
        if low >= high {
            return Err(eyre!("Correction filter threshold must be increasing: [{low}, {high}]"));
        }
        Ok(())
    }

    /// Reads [`WorkflowConfig`] from a JSON file.
    ///
    /// The manifest path is resolved relative to the working directory, as given.
    pub fn read<P>(path: &P) -> Result<WorkflowConfig, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read workflow config: {path:?}."))?;
        let config: WorkflowConfig = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize workflow config: {path:?}"))?;
        config.check().wrap_err_with(|| format!("Invalid workflow config: {path:?}"))?;
        Ok(config)
    }

    /// Write [`WorkflowConfig`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        crate::utils::create_parent_dir(path)?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize workflow config: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write workflow config: {path:?}"))?;
        Ok(())
    }
}
