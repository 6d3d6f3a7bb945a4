//! File naming convention shared by every stage of the matrix workflow.
//!
//! Every intermediate and final file lives under the [`Layout`] root:
//!
//! ```text
//! hdf5/<sample>/<protocol>/<run>_<resolution>.h5
//! hdf5/<sample>/<protocol>/<resolution>/matrix.h5
//! hdf5/<sample>/<resolution>/{matrix,adjusted,normalized,corrected}.h5
//! TADs/<sample>/<resolution>/{tads_domains.bed,tads_boundaries.bed,tads_score.bedgraph,tracks.ini}
//! plots/<sample>/<resolution>/{diagnostic.png,<region>_matrix.png,<region>_tads.png}
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HDF5_DIR: &str = "hdf5";
pub const TADS_DIR: &str = "TADs";
pub const PLOTS_DIR: &str = "plots";
pub const TADS_PREFIX: &str = "tads";

/// Root directory of the workflow outputs.
///
/// ```rust
/// use hicflow::Layout;
///
/// let layout = Layout::new("results");
/// let path = layout.converted("pig1", "DpnII", "run1", 1000000);
/// assert_eq!(path.to_str(), Some("results/hdf5/pig1/DpnII/run1_1000000.h5"));
///
/// // the working directory is not repeated in front of each path
/// let layout = Layout::new(".");
/// assert_eq!(layout.corrected("pig1", 50000).to_str(), Some("hdf5/pig1/50000/corrected.h5"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Layout {
    pub root: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let root = match root == Path::new(".") {
            true => PathBuf::new(),
            false => root.to_path_buf(),
        };
        Layout { root }
    }

    fn sample_dir(&self, base: &str, sample: &str, resolution: u64) -> PathBuf {
        self.root.join(base).join(sample).join(resolution.to_string())
    }

    /// One sequencing run converted to h5.
    pub fn converted(&self, sample: &str, protocol: &str, run: &str, resolution: u64) -> PathBuf {
        self.root.join(HDF5_DIR).join(sample).join(protocol).join(format!("{run}_{resolution}.h5"))
    }

    /// Sum of all runs of one protocol.
    pub fn protocol_matrix(&self, sample: &str, protocol: &str, resolution: u64) -> PathBuf {
        self.root
            .join(HDF5_DIR)
            .join(sample)
            .join(protocol)
            .join(resolution.to_string())
            .join("matrix.h5")
    }

    /// Sum of all protocols of one sample.
    pub fn sample_matrix(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(HDF5_DIR, sample, resolution).join("matrix.h5")
    }

    pub fn adjusted(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(HDF5_DIR, sample, resolution).join("adjusted.h5")
    }

    pub fn normalized(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(HDF5_DIR, sample, resolution).join("normalized.h5")
    }

    pub fn corrected(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(HDF5_DIR, sample, resolution).join("corrected.h5")
    }

    /// Prefix handed to the TAD caller, which appends its own suffixes.
    pub fn tads_prefix(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(TADS_DIR, sample, resolution).join(TADS_PREFIX)
    }

    pub fn tads_domains(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(TADS_DIR, sample, resolution).join(format!("{TADS_PREFIX}_domains.bed"))
    }

    pub fn tads_boundaries(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(TADS_DIR, sample, resolution).join(format!("{TADS_PREFIX}_boundaries.bed"))
    }

    pub fn tads_score(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(TADS_DIR, sample, resolution).join(format!("{TADS_PREFIX}_score.bedgraph"))
    }

    pub fn tracks(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(TADS_DIR, sample, resolution).join("tracks.ini")
    }

    pub fn diagnostic_plot(&self, sample: &str, resolution: u64) -> PathBuf {
        self.sample_dir(PLOTS_DIR, sample, resolution).join("diagnostic.png")
    }

    pub fn matrix_plot(&self, sample: &str, resolution: u64, region: &str) -> PathBuf {
        self.sample_dir(PLOTS_DIR, sample, resolution).join(format!("{region}_matrix.png"))
    }

    pub fn tads_plot(&self, sample: &str, resolution: u64, region: &str) -> PathBuf {
        self.sample_dir(PLOTS_DIR, sample, resolution).join(format!("{region}_tads.png"))
    }
}
