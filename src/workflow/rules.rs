//! The rules of the matrix workflow and the wildcards they expand over.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumIter, EnumString};

/// One kind of job. Rules are listed in dependency order, leaves first.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    StrumDisplay,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    /// HiC-Pro matrix and bins to h5.
    Convert,
    /// Sum the runs of one protocol.
    MergeRuns,
    /// Sum the protocols of one sample.
    MergeProtocols,
    /// Keep the configured chromosomes.
    Adjust,
    Normalize,
    Correct,
    DiagnosticPlot,
    PlotMatrix,
    FindTads,
    /// Write the track file of the TAD plot.
    TrackConfig,
    PlotTads,
}

impl Rule {
    /// Names of the wildcards a job of this rule is keyed by.
    ///
    /// ```rust
    /// use hicflow::workflow::Rule;
    ///
    /// assert_eq!(Rule::Convert.wildcards(), ["sample", "protocol", "run", "resolution"]);
    /// assert_eq!(Rule::PlotTads.wildcards(), ["sample", "resolution", "region"]);
    /// ```
    pub fn wildcards(&self) -> &'static [&'static str] {
        match self {
            Rule::Convert => &["sample", "protocol", "run", "resolution"],
            Rule::MergeRuns => &["sample", "protocol", "resolution"],
            Rule::MergeProtocols
            | Rule::Adjust
            | Rule::Normalize
            | Rule::Correct
            | Rule::DiagnosticPlot
            | Rule::FindTads
            | Rule::TrackConfig => &["sample", "resolution"],
            Rule::PlotMatrix | Rule::PlotTads => &["sample", "resolution", "region"],
        }
    }

    /// Executable run by jobs of this rule, if any.
    pub fn program(&self) -> Option<&'static str> {
        match self {
            Rule::Convert => Some("hicConvertFormat"),
            Rule::MergeRuns | Rule::MergeProtocols => Some("hicSumMatrices"),
            Rule::Adjust => Some("hicAdjustMatrix"),
            Rule::Normalize => Some("hicNormalize"),
            Rule::Correct | Rule::DiagnosticPlot => Some("hicCorrectMatrix"),
            Rule::PlotMatrix => Some("hicPlotMatrix"),
            Rule::FindTads => Some("hicFindTADs"),
            Rule::TrackConfig => None,
            Rule::PlotTads => Some("hicPlotTADs"),
        }
    }
}

/// Wildcard values of one job. Values a rule is not keyed by are `None`.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Wildcards {
    pub sample: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    pub resolution: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Wildcards {
    pub fn new(sample: &str, resolution: u64) -> Self {
        Wildcards { sample: sample.to_string(), resolution, ..Default::default() }
    }

    pub fn protocol(self, protocol: &str) -> Self {
        Wildcards { protocol: Some(protocol.to_string()), ..self }
    }

    pub fn run(self, run: &str) -> Self {
        Wildcards { run: Some(run.to_string()), ..self }
    }

    pub fn region(self, region: &str) -> Self {
        Wildcards { region: Some(region.to_string()), ..self }
    }

    /// Returns (name, value) of the wildcards that are set, in rule declaration order.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        let mut values = vec![("sample", self.sample.clone())];
        if let Some(protocol) = &self.protocol {
            values.push(("protocol", protocol.clone()));
        }
        if let Some(run) = &self.run {
            values.push(("run", run.clone()));
        }
        values.push(("resolution", self.resolution.to_string()));
        if let Some(region) = &self.region {
            values.push(("region", region.clone()));
        }
        values
    }
}

impl Display for Wildcards {
    /// ```rust
    /// use hicflow::workflow::Wildcards;
    ///
    /// let wildcards = Wildcards::new("pig1", 1000000).protocol("DpnII").run("run1");
    /// assert_eq!(wildcards.to_string(), "sample=pig1, protocol=DpnII, run=run1, resolution=1000000");
    /// ```
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let values = self.values().into_iter().map(|(name, value)| format!("{name}={value}"));
        write!(f, "{}", values.collect::<Vec<_>>().join(", "))
    }
}
