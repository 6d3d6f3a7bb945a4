//! A generic directed acyclic graph ([`Dag`]) of nodes (`N`) joined by edges (`E`).
//!
//! Built on a [`petgraph`] [`Graph`](petgraph::graph::Graph), with lookups by node value
//! and an ordering that always places a node after every node it depends on.
//!
//! ```rust
//! use hicflow_dag::Dag;
//!
//! let mut dag = Dag::new();
//! dag.add_edge("convert", "merge", "run1.h5")?;
//! dag.add_edge("merge", "correct", "matrix.h5")?;
//! assert_eq!(dag.topological_order()?, [&"convert", &"merge", &"correct"]);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```

use color_eyre::eyre::{Report, Result};

mod dag;
#[cfg(test)]
mod tests;

#[doc(inline)]
pub use dag::Dag;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Returns a [Mermaid](https://mermaid.js.org/) [`str`] created from an object.
pub trait ToMermaid {
    fn to_mermaid(&self) -> Result<String, Report>;
}
