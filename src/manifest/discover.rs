//! Build a [`Manifest`] from a directory of nf-core/hic result directories.

use crate::manifest::{Manifest, ManifestRow};

#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default prefix of the result directory names.
pub const DEFAULT_PREFIX: &str = "trio";

/// Location of the raw matrices inside one nf-core/hic result directory.
const RAW_MATRIX_DIR: &str = "hic_results/matrix/raw";

/// Discover nf-core/hic result directories and write a manifest.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct DiscoverArgs {
    /// Directory holding one result directory per (sample, protocol).
    #[cfg_attr(feature = "cli", clap(short = 'd', long, required = true))]
    pub dir: PathBuf,

    /// Only consider result directories whose name starts with this prefix.
    #[cfg_attr(feature = "cli", clap(short = 'p', long, default_value_t = DEFAULT_PREFIX.to_string()))]
    pub prefix: String,

    /// Write the manifest (TSV) here instead of printing it.
    #[cfg_attr(feature = "cli", clap(short = 'o', long))]
    pub output: Option<PathBuf>,
}

impl Default for DiscoverArgs {
    fn default() -> Self {
        DiscoverArgs { dir: PathBuf::from("."), prefix: DEFAULT_PREFIX.to_string(), output: None }
    }
}

/// Returns a [`Manifest`] with one row per result directory under `dir`.
///
/// Result directories are named `<individual>.<species>.<protocol>`. The sample is
/// `<individual>.<species>` and the matrix prefix points into the directory's raw matrices.
/// Names with fewer than three dot-separated fields are skipped.
///
/// ```rust
/// use hicflow::manifest::discover;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::create_dir(dir.path().join("trio1.pig.DpnII"))?;
/// std::fs::create_dir(dir.path().join("trio1.pig.Arima"))?;
/// std::fs::create_dir(dir.path().join("unrelated"))?;
///
/// let manifest = discover(dir.path(), "trio")?;
/// let protocols: Vec<_> = manifest.rows.iter().map(|r| r.protocol.as_str()).collect();
/// assert_eq!(protocols, ["Arima", "DpnII"]);
/// assert_eq!(manifest.rows[0].sample, "trio1.pig");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn discover<P>(dir: &P, prefix: &str) -> Result<Manifest, Report>
where
    P: AsRef<Path> + std::fmt::Debug + ?Sized,
{
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| eyre!("Failed to read result directory: {dir:?}"))?
        .collect::<Result<Vec<_>, _>>()
        .wrap_err_with(|| eyre!("Failed to list result directory: {dir:?}"))?;

    let names = entries
        .into_iter()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .sorted()
        .collect_vec();

    let mut rows = Vec::new();
    for name in names {
        let fields = name.splitn(3, '.').collect_vec();
        let [individual, species, protocol] = fields.as_slice() else {
            warn!("Skipping result directory not named <individual>.<species>.<protocol>: {name}");
            continue;
        };
        let sample = format!("{individual}.{species}");
        let matrix_prefix = format!("{}/", dir.join(&name).join(RAW_MATRIX_DIR).display());
        debug!("Discovered {sample} {protocol}: {matrix_prefix}");
        rows.push(ManifestRow::new(&sample, protocol, &matrix_prefix));
    }

    if rows.is_empty() {
        return Err(eyre!("No result directories starting with {prefix:?} were found in {dir:?}"))
            .suggestion("Check the --dir and --prefix arguments.");
    }

    info!("Discovered {} result directories in {dir:?}", rows.len());
    Manifest::from_rows(rows)
}

/// Discover result directories and write or print the manifest.
pub fn manifest(args: &DiscoverArgs) -> Result<Manifest, Report> {
    let manifest = discover(&args.dir, &args.prefix)?;
    match &args.output {
        Some(path) => {
            manifest.write(path)?;
            info!("Wrote manifest: {path:?}");
        }
        None => println!("{}", manifest.to_table().to_markdown()),
    }
    Ok(manifest)
}
