//! The track file read by `hicPlotTADs`.

use crate::utils;
use color_eyre::eyre::{Report, Result, WrapErr};
use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Tracks of one TAD plot: the corrected matrix, the domains over it and the TAD score.
///
/// Paths are written as given, so they are relative to the directory the workflow runs in.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tracks {
    pub title: String,
    pub matrix: PathBuf,
    pub domains: PathBuf,
    pub score: PathBuf,
    /// Depth of the matrix track in base pairs.
    pub depth: u64,
    pub log1p: bool,
}

impl Tracks {
    /// Returns the track file text.
    ///
    /// ```rust
    /// use hicflow::workflow::Tracks;
    ///
    /// let tracks = Tracks {
    ///     title: "pig1 1000000".to_string(),
    ///     matrix: "hdf5/pig1/1000000/corrected.h5".into(),
    ///     domains: "TADs/pig1/1000000/tads_domains.bed".into(),
    ///     score: "TADs/pig1/1000000/tads_score.bedgraph".into(),
    ///     depth: 1500000,
    ///     log1p: true,
    /// };
    /// let ini = tracks.render();
    /// let sections: Vec<_> = ini.lines().filter(|l| l.starts_with('[')).collect();
    /// assert_eq!(sections, ["[x-axis]", "[hic matrix]", "[tads]", "[bedgraph]", "[spacer]"]);
    /// assert!(ini.contains("file = hdf5/pig1/1000000/corrected.h5\n"));
    /// ```
    pub fn render(&self) -> String {
        let transform = match self.log1p {
            true => "log1p",
            false => "no",
        };

        formatdoc! {"
            [x-axis]
            where = top

            [hic matrix]
            file = {matrix}
            title = {title}
            colormap = RdYlBu_r
            depth = {depth}
            transform = {transform}
            file_type = hic_matrix

            [tads]
            file = {domains}
            file_type = domains
            border_color = black
            color = none
            overlay_previous = share-y

            [bedgraph]
            file = {score}
            title = TAD separation score
            height = 4
            color = blue

            [spacer]
            height = 0.5
            ",
            matrix = self.matrix.display(),
            title = self.title,
            depth = self.depth,
            transform = transform,
            domains = self.domains.display(),
            score = self.score.display(),
        }
    }

    /// Write the track file, creating its directory when missing.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        utils::create_parent_dir(path)?;
        std::fs::write(path, self.render())
            .wrap_err_with(|| format!("Failed to write track file: {path:?}"))?;
        Ok(())
    }
}
