//! `hicflow` is the glue around a Hi-C analysis: it writes the cluster job script that runs
//! [nf-core/hic](https://nf-co.re/hic), then chains
//! [HiCExplorer](https://hicexplorer.readthedocs.io) tools over the resulting contact matrices.
//!
//! 1. **Job script.** A [`JobScript`] renders scheduler directives, module loads and one
//!    `nextflow run nf-core/hic` invocation. Submitting it is up to you.
//!
//! 1. **Manifest.** A [`Manifest`] lists the (sample, protocol) pairs and the prefix of their
//!    raw matrices. [`Manifest::resolve_runs`] finds the sequencing runs on disk and returns
//!    the [`ResolvedManifest`](manifest::ResolvedManifest) that every path lookup goes through.
//!
//! 1. **Workflow.** A [`Plan`](workflow::Plan) expands the rules (conversion, merging,
//!    adjustment, normalization, correction, plots and TAD calling) over samples, resolutions
//!    and regions, and links jobs through the files of the [`Layout`].
//!
//! ```text
//! hicflow script --params params.json --output jobs/hic.sh
//! hicflow manifest --dir hic_studies --output sampled_protocols.tsv
//! hicflow plan --config workflow.json --format mermaid
//! hicflow run --config workflow.json
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod layout;
pub mod manifest;
pub mod script;
pub mod table;
pub mod utils;
pub mod workflow;

#[doc(inline)]
#[cfg(feature = "cli")]
pub use crate::cli::Cli;
#[doc(inline)]
pub use crate::config::WorkflowConfig;
#[doc(inline)]
pub use crate::layout::Layout;
#[doc(inline)]
pub use crate::manifest::Manifest;
#[doc(inline)]
pub use crate::script::JobScript;
#[doc(inline)]
pub use table::Table;
#[doc(inline)]
pub use utils::verbosity::Verbosity;
