//! The manifest of sequencing runs per (sample, protocol), and the path lookups built on it.
//!
//! A [`Manifest`] is read from a tab-separated file with at least the columns `sample`,
//! `protocol` and `matrixprefix`. Calling [`Manifest::resolve_runs`] discovers which runs
//! exist on disk and returns a [`ResolvedManifest`], the only type that answers path lookups.

mod discover;
#[cfg(test)]
mod tests;

pub use discover::{discover, manifest, DiscoverArgs, DEFAULT_PREFIX};

use crate::{Layout, Table, WorkflowConfig};

#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Column names

pub const SAMPLE: &str = "sample";
pub const PROTOCOL: &str = "protocol";
pub const MATRIX_PREFIX: &str = "matrixprefix";
pub const RUNS: &str = "runs";

/// A raw matrix file name, after the row prefix: `<run>_<resolution>.matrix`
const RAW_MATRIX_PATTERN: &str = r"^(?P<run>.*)_(?P<resolution>\d+)\.matrix$";

// ----------------------------------------------------------------------------
// Manifest Row

/// One (sample, protocol) pair and the path prefix shared by its raw matrices.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ManifestRow {
    pub sample: String,
    pub protocol: String,
    /// Prefix of the raw matrix files, `<prefix><run>_<resolution>.matrix`.
    pub matrix_prefix: String,
}

impl Display for ManifestRow {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.sample, self.protocol)
    }
}

impl ManifestRow {
    pub fn new(sample: &str, protocol: &str, matrix_prefix: &str) -> Self {
        ManifestRow {
            sample: sample.to_string(),
            protocol: protocol.to_string(),
            matrix_prefix: matrix_prefix.to_string(),
        }
    }

    /// Returns the run identifiers of every `<prefix>*.matrix` file on disk.
    ///
    /// The prefix is split into a directory and a file name prefix, so that matches are
    /// compared by file name regardless of how the directory was spelled.
    fn find_runs(&self, raw_matrix: &Regex) -> Result<BTreeSet<String>, Report> {
        let (dir, name_prefix) = match self.matrix_prefix.rsplit_once('/') {
            Some((dir, name)) => (format!("{dir}/"), name),
            None => (String::new(), self.matrix_prefix.as_str()),
        };
        let pattern = format!(
            "{}{}*.matrix",
            glob::Pattern::escape(&dir),
            glob::Pattern::escape(name_prefix)
        );
        debug!("Searching for raw matrices: {pattern}");

        let mut runs = BTreeSet::new();
        let paths = glob::glob(&pattern)
            .wrap_err_with(|| eyre!("Invalid matrix prefix for {self}: {:?}", self.matrix_prefix))?;

        for path in paths {
            let path = path.wrap_err_with(|| eyre!("Failed to search for matrices of {self}"))?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_prefix(name_prefix) else {
                continue;
            };
            match raw_matrix.captures(stem) {
                Some(captures) => {
                    runs.insert(captures["run"].to_string());
                }
                None => debug!("Ignoring file without a resolution suffix: {path:?}"),
            }
        }

        Ok(runs)
    }
}

// ----------------------------------------------------------------------------
// Manifest

/// Rows of (sample, protocol, matrix prefix), with (sample, protocol) as a unique key.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Manifest {
    pub rows: Vec<ManifestRow>,
    /// Optional file path for where the manifest was read from.
    pub path: Option<PathBuf>,
}

impl Manifest {
    pub fn new() -> Self {
        Manifest { rows: Vec::new(), path: None }
    }

    /// Returns a [`Manifest`] from rows, rejecting duplicated (sample, protocol) pairs.
    ///
    /// ```rust
    /// use hicflow::manifest::{Manifest, ManifestRow};
    ///
    /// let rows = vec![
    ///     ManifestRow::new("pig1", "DpnII", "data/pig1_DpnII_trio_"),
    ///     ManifestRow::new("pig1", "Arima", "data/pig1_Arima_trio_"),
    /// ];
    /// let manifest = Manifest::from_rows(rows)?;
    ///
    /// let duplicated = vec![ManifestRow::new("pig1", "DpnII", "a_"), ManifestRow::new("pig1", "DpnII", "b_")];
    /// assert!(Manifest::from_rows(duplicated).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_rows(rows: Vec<ManifestRow>) -> Result<Self, Report> {
        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert((&row.sample, &row.protocol)) {
                return Err(eyre!("Duplicated (sample, protocol) pair in manifest: {row}"))
                    .suggestion("Each sample and protocol combination must appear on one row only.");
            }
        }
        Ok(Manifest { rows, path: None })
    }

    /// Returns a [`Manifest`] from the `sample`, `protocol` and `matrixprefix` columns of a table.
    ///
    /// Other columns are ignored.
    pub fn from_table(table: &Table<String>) -> Result<Self, Report> {
        let samples = table.get_column(SAMPLE)?;
        let protocols = table.get_column(PROTOCOL)?;
        let prefixes = table.get_column(MATRIX_PREFIX)?;

        let rows = samples
            .into_iter()
            .zip(protocols)
            .zip(prefixes)
            .map(|((sample, protocol), prefix)| ManifestRow::new(sample, protocol, prefix))
            .collect_vec();

        let mut manifest = Manifest::from_rows(rows)
            .wrap_err_with(|| eyre!("Failed to load manifest: {:?}", table.path))?;
        manifest.path = table.path.clone();
        Ok(manifest)
    }

    /// Read a tab-separated [`Manifest`] file.
    ///
    /// ```rust
    /// use hicflow::Manifest;
    /// use std::io::Write;
    ///
    /// let mut file = tempfile::NamedTempFile::new()?;
    /// writeln!(file, "sample\tprotocol\tmatrixprefix\npig1\tDpnII\tdata/pig1_DpnII_trio_")?;
    /// let manifest = Manifest::read(file.path())?;
    /// assert_eq!(manifest.rows[0].matrix_prefix, "data/pig1_DpnII_trio_");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let table = Table::read(path, Some('\t'))
            .wrap_err_with(|| eyre!("Failed to read manifest: {path:?}"))?;
        let manifest = Manifest::from_table(&table)?;
        info!("Loaded {} manifest rows from {path:?}", manifest.rows.len());
        Ok(manifest)
    }

    /// Convert the [`Manifest`] to a [`Table`].
    pub fn to_table(&self) -> Table<String> {
        let mut table = Table::new();
        table.headers = [SAMPLE, PROTOCOL, MATRIX_PREFIX].map(String::from).to_vec();
        table.rows = self
            .rows
            .iter()
            .map(|row| vec![row.sample.clone(), row.protocol.clone(), row.matrix_prefix.clone()])
            .collect();
        table.path = self.path.clone();
        table
    }

    /// Write the [`Manifest`] to a tab-separated file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        self.to_table().write(path, Some('\t'))
    }

    /// Discover the run identifiers of every row and return a [`ResolvedManifest`].
    ///
    /// For each row, files matching `<prefix>*.matrix` are listed, the `_<resolution>.matrix`
    /// suffix is stripped and the remainder after the prefix is the run identifier.
    /// Runs seen at several resolutions are collapsed into one.
    ///
    /// A row without matching files gets an empty run set. This is logged as a warning,
    /// since it usually means a misspelled prefix, but it is not an error.
    ///
    /// ```rust
    /// use hicflow::manifest::{Manifest, ManifestRow};
    ///
    /// let dir = tempfile::tempdir()?;
    /// let prefix = format!("{}/pig1_DpnII_trio_", dir.path().display());
    /// for resolution in [1000000, 500000] {
    ///     std::fs::write(format!("{prefix}run1_{resolution}.matrix"), "")?;
    /// }
    ///
    /// let manifest = Manifest::from_rows(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    /// let resolved = manifest.resolve_runs()?;
    /// assert_eq!(resolved.runs("pig1", "DpnII")?.iter().collect::<Vec<_>>(), [&"run1"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn resolve_runs(&self) -> Result<ResolvedManifest, Report> {
        let raw_matrix = Regex::new(RAW_MATRIX_PATTERN)?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let runs = row.find_runs(&raw_matrix)?;
                if runs.is_empty() {
                    warn!(
                        "No matrices found for {row} with prefix {:?}, this row has no runs.",
                        row.matrix_prefix
                    );
                } else {
                    info!("Found {} run(s) for {row}: {}", runs.len(), runs.iter().join(", "));
                }
                Ok(ResolvedRow { row: row.clone(), runs })
            })
            .collect::<Result<Vec<_>, Report>>()?;

        Ok(ResolvedManifest { rows, path: self.path.clone() })
    }
}

// ----------------------------------------------------------------------------
// Resolved Manifest

/// A [`ManifestRow`] together with the runs discovered for it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ResolvedRow {
    pub row: ManifestRow,
    pub runs: BTreeSet<String>,
}

/// A [`Manifest`] whose run sets have been discovered, see [`Manifest::resolve_runs`].
///
/// All lookups are plain string concatenation: none of them checks that the returned
/// paths exist.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResolvedManifest {
    pub rows: Vec<ResolvedRow>,
    pub path: Option<PathBuf>,
}

impl ResolvedManifest {
    /// Returns the resolved row of a (sample, protocol) pair.
    pub fn get(&self, sample: &str, protocol: &str) -> Result<&ResolvedRow, Report> {
        self.rows
            .iter()
            .find(|r| r.row.sample == sample && r.row.protocol == protocol)
            .ok_or_else(|| {
                eyre!("Sample {sample} with protocol {protocol} is not in the manifest: {:?}", self.path)
                    .suggestion(format!(
                        "Known pairs: {}",
                        self.rows.iter().map(|r| r.row.to_string()).join(", ")
                    ))
            })
    }

    /// Returns the run identifiers of a (sample, protocol) pair.
    pub fn runs(&self, sample: &str, protocol: &str) -> Result<&BTreeSet<String>, Report> {
        Ok(&self.get(sample, protocol)?.runs)
    }

    /// Returns the distinct samples, sorted.
    pub fn samples(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.row.sample.as_str()).sorted().dedup().collect()
    }

    /// Returns the distinct protocols of a sample, sorted. Unknown samples have none.
    pub fn protocols(&self, sample: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.row.sample == sample)
            .map(|r| r.row.protocol.as_str())
            .sorted()
            .dedup()
            .collect()
    }

    /// Returns the raw matrix path: `<prefix><run>_<resolution>.matrix`.
    ///
    /// ```rust
    /// use hicflow::manifest::{ResolvedManifest, ResolvedRow, ManifestRow};
    ///
    /// let row = ManifestRow::new("pig1", "DpnII", "data/pig1_DpnII_trio_");
    /// let resolved = ResolvedManifest { rows: vec![ResolvedRow { row, runs: Default::default() }], path: None };
    ///
    /// let path = resolved.raw_matrix("pig1", "DpnII", "run1", 1000000)?;
    /// assert_eq!(path.to_str(), Some("data/pig1_DpnII_trio_run1_1000000.matrix"));
    ///
    /// let path = resolved.raw_bed("pig1", "DpnII", "run1", 1000000)?;
    /// assert_eq!(path.to_str(), Some("data/pig1_DpnII_trio_run1_1000000_abs.bed"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn raw_matrix(
        &self,
        sample: &str,
        protocol: &str,
        run: &str,
        resolution: u64,
    ) -> Result<PathBuf, Report> {
        let prefix = &self.get(sample, protocol)?.row.matrix_prefix;
        Ok(PathBuf::from(format!("{prefix}{run}_{resolution}.matrix")))
    }

    /// Returns the bin bed file path that accompanies a raw matrix: `<prefix><run>_<resolution>_abs.bed`.
    pub fn raw_bed(
        &self,
        sample: &str,
        protocol: &str,
        run: &str,
        resolution: u64,
    ) -> Result<PathBuf, Report> {
        let prefix = &self.get(sample, protocol)?.row.matrix_prefix;
        Ok(PathBuf::from(format!("{prefix}{run}_{resolution}_abs.bed")))
    }

    /// Returns the converted matrix of every run of a (sample, protocol) pair.
    ///
    /// Empty when no runs were found.
    pub fn run_matrices(
        &self,
        layout: &Layout,
        sample: &str,
        protocol: &str,
        resolution: u64,
    ) -> Result<Vec<PathBuf>, Report> {
        let runs = self.runs(sample, protocol)?;
        Ok(runs.iter().map(|run| layout.converted(sample, protocol, run, resolution)).collect())
    }

    /// Returns the merged matrix of every protocol of a sample, one path per distinct protocol.
    pub fn protocol_matrices(&self, layout: &Layout, sample: &str, resolution: u64) -> Vec<PathBuf> {
        self.protocols(sample)
            .into_iter()
            .map(|protocol| layout.protocol_matrix(sample, protocol, resolution))
            .collect()
    }

    /// Returns the manifest as a [`Table`], with the comma-joined run set in a `runs` column.
    pub fn to_table(&self) -> Result<Table<String>, Report> {
        let manifest = Manifest {
            rows: self.rows.iter().map(|r| r.row.clone()).collect(),
            path: self.path.clone(),
        };
        let runs = self.rows.iter().map(|r| r.runs.iter().join(",")).collect();
        manifest.to_table().with_column(RUNS.to_string(), runs)
    }

    /// Write the manifest and its `runs` column to a tab-separated file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        self.to_table()?.write(path, Some('\t'))
    }
}

// ----------------------------------------------------------------------------
// Resolve Command

/// Discover the runs of every manifest row and report them.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct ResolveArgs {
    /// Workflow configuration (JSON).
    #[cfg_attr(feature = "cli", clap(short = 'c', long, required = true))]
    pub config: PathBuf,

    /// Write the resolved manifest (TSV) here instead of printing it.
    #[cfg_attr(feature = "cli", clap(short = 'o', long))]
    pub output: Option<PathBuf>,
}

/// Resolve the runs of the manifest named by the workflow configuration.
pub fn resolve(args: &ResolveArgs) -> Result<ResolvedManifest, Report> {
    let config = WorkflowConfig::read(&args.config)?;
    let resolved = Manifest::read(&config.sampled_protocols)?.resolve_runs()?;

    match &args.output {
        Some(path) => {
            resolved.write(path)?;
            info!("Wrote resolved manifest: {path:?}");
        }
        None => println!("{}", resolved.to_table()?.to_markdown()),
    }

    Ok(resolved)
}
