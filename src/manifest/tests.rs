use crate::manifest::{discover, Manifest, ManifestRow, ResolvedManifest};
use crate::{Layout, Table};
use color_eyre::eyre::{Report, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Create empty files named `<prefix><name>` for each name.
fn touch(prefix: &str, names: &[&str]) -> Result<(), Report> {
    for name in names {
        let path = PathBuf::from(format!("{prefix}{name}"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "")?;
    }
    Ok(())
}

fn resolve(rows: Vec<ManifestRow>) -> Result<ResolvedManifest, Report> {
    Manifest::from_rows(rows)?.resolve_runs()
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn runs_collapse_across_resolutions() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/data/pig1_DpnII_trio_", dir.path().display());
    touch(
        &prefix,
        &[
            "run1_1000000.matrix",
            "run1_500000.matrix",
            "run1_1000000_abs.bed",
            "run2_50000.matrix",
        ],
    )?;

    let resolved = resolve(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    assert_eq!(resolved.runs("pig1", "DpnII")?, &set(&["run1", "run2"]));

    let raw = resolved.raw_matrix("pig1", "DpnII", "run1", 1000000)?;
    assert_eq!(raw, PathBuf::from(format!("{prefix}run1_1000000.matrix")));
    assert!(raw.exists());
    Ok(())
}

#[test]
fn relative_prefix_resolves_to_relative_paths() -> Result<(), Report> {
    let row = ManifestRow::new("pig1", "DpnII", "data/pig1_DpnII_trio_");
    let resolved = ResolvedManifest {
        rows: vec![crate::manifest::ResolvedRow { row, runs: set(&["run1"]) }],
        path: None,
    };
    let raw = resolved.raw_matrix("pig1", "DpnII", "run1", 1000000)?;
    assert_eq!(raw, Path::new("data/pig1_DpnII_trio_run1_1000000.matrix"));
    Ok(())
}

#[test]
fn duplicated_run_suffix_is_one_run() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/pig1_DpnII_run1", dir.path().display());
    touch(&prefix, &["_1.matrix", "_2.matrix"])?;

    let resolved = resolve(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    assert_eq!(resolved.runs("pig1", "DpnII")?.len(), 1);
    Ok(())
}

#[test]
fn files_without_resolution_are_ignored() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/pig1_", dir.path().display());
    touch(&prefix, &["run1_1000000.matrix", "run1.matrix", "run1_abc.matrix", "run1_1000000.txt"])?;

    let resolved = resolve(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    assert_eq!(resolved.runs("pig1", "DpnII")?, &set(&["run1"]));
    Ok(())
}

#[test]
fn missing_prefix_gives_empty_runs() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/nothing_here_", dir.path().display());

    let resolved = resolve(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    assert!(resolved.runs("pig1", "DpnII")?.is_empty());

    let layout = Layout::new("results");
    let matrices = resolved.run_matrices(&layout, "pig1", "DpnII", 1000000)?;
    assert!(matrices.is_empty());
    Ok(())
}

#[test]
fn rows_do_not_share_runs() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let dpnii = format!("{}/pig1_DpnII_", dir.path().display());
    let arima = format!("{}/pig1_Arima_", dir.path().display());
    touch(&dpnii, &["run1_1000000.matrix"])?;
    touch(&arima, &["lane7_1000000.matrix"])?;

    let resolved = resolve(vec![
        ManifestRow::new("pig1", "DpnII", &dpnii),
        ManifestRow::new("pig1", "Arima", &arima),
    ])?;
    assert_eq!(resolved.runs("pig1", "DpnII")?, &set(&["run1"]));
    assert_eq!(resolved.runs("pig1", "Arima")?, &set(&["lane7"]));
    Ok(())
}

#[test]
fn run_matrices_follow_layout() -> Result<(), Report> {
    let row = ManifestRow::new("pig1", "DpnII", "data/pig1_DpnII_trio_");
    let resolved = ResolvedManifest {
        rows: vec![crate::manifest::ResolvedRow { row, runs: set(&["run2", "run1"]) }],
        path: None,
    };

    let layout = Layout::new("out");
    let observed = resolved.run_matrices(&layout, "pig1", "DpnII", 500000)?;
    let expected = [
        PathBuf::from("out/hdf5/pig1/DpnII/run1_500000.h5"),
        PathBuf::from("out/hdf5/pig1/DpnII/run2_500000.h5"),
    ];
    assert_eq!(observed, expected);
    Ok(())
}

#[test]
fn protocol_matrices_ignore_row_order() -> Result<(), Report> {
    let rows = vec![
        ManifestRow::new("pig1", "DpnII", "a_"),
        ManifestRow::new("pig2", "DpnII", "b_"),
        ManifestRow::new("pig1", "Arima", "c_"),
    ];
    let mut reversed = rows.clone();
    reversed.reverse();

    let layout = Layout::new(".");
    let forward = resolve(rows)?.protocol_matrices(&layout, "pig1", 50000);
    let backward = resolve(reversed)?.protocol_matrices(&layout, "pig1", 50000);

    let expected = [
        PathBuf::from("hdf5/pig1/Arima/50000/matrix.h5"),
        PathBuf::from("hdf5/pig1/DpnII/50000/matrix.h5"),
    ];
    assert_eq!(forward, expected);
    assert_eq!(backward, expected);
    Ok(())
}

#[test]
fn unknown_pair_is_an_error() -> Result<(), Report> {
    let resolved = resolve(vec![ManifestRow::new("pig1", "DpnII", "a_")])?;
    let error = resolved.raw_matrix("pig1", "HindIII", "run1", 1000000).unwrap_err();
    assert!(error.to_string().contains("HindIII"));
    assert!(resolved.protocols("pig9").is_empty());
    Ok(())
}

#[test]
fn manifest_requires_columns() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["sample", "protocol"];
    table.add_row(vec!["pig1", "DpnII"])?;

    let error = Manifest::from_table(&table.to_string_values()).unwrap_err();
    assert!(error.to_string().contains("matrixprefix"));
    Ok(())
}

#[test]
fn manifest_ignores_extra_columns() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("manifest.tsv");
    fs::write(&path, "matrixprefix\tnote\tsample\tprotocol\ndata/p_\tfirst run\tpig1\tDpnII\n")?;

    let manifest = Manifest::read(&path)?;
    assert_eq!(manifest.rows, [ManifestRow::new("pig1", "DpnII", "data/p_")]);
    assert_eq!(manifest.path, Some(path));
    Ok(())
}

#[test]
fn resolved_table_has_runs_column() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/pig1_", dir.path().display());
    touch(&prefix, &["run2_1000000.matrix", "run1_1000000.matrix"])?;

    let resolved = resolve(vec![
        ManifestRow::new("pig1", "DpnII", &prefix),
        ManifestRow::new("pig2", "DpnII", "missing_"),
    ])?;
    let output = dir.path().join("resolved.tsv");
    resolved.write(&output)?;

    let table = Table::read(&output, None)?;
    assert_eq!(table.headers, ["sample", "protocol", "matrixprefix", "runs"]);
    assert_eq!(table.get("runs", 0)?, "run1,run2");
    assert_eq!(table.get("runs", 1)?, "");
    Ok(())
}

#[test]
fn resolution_is_deterministic() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let prefix = format!("{}/pig1_", dir.path().display());
    touch(&prefix, &["b_1000000.matrix", "a_1000000.matrix", "c_50000.matrix"])?;

    let manifest = Manifest::from_rows(vec![ManifestRow::new("pig1", "DpnII", &prefix)])?;
    assert_eq!(manifest.resolve_runs()?, manifest.resolve_runs()?);
    Ok(())
}

#[test]
fn discover_skips_malformed_names() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("trio1.duroc.HindIII"))?;
    fs::create_dir(dir.path().join("trio1_no_fields"))?;
    fs::write(dir.path().join("trio2.pig.DpnII"), "a file, not a directory")?;

    let manifest = discover(dir.path(), "trio")?;
    assert_eq!(manifest.rows.len(), 1);

    let row = &manifest.rows[0];
    assert_eq!((row.sample.as_str(), row.protocol.as_str()), ("trio1.duroc", "HindIII"));
    let expected = format!("{}/", dir.path().join("trio1.duroc.HindIII/hic_results/matrix/raw").display());
    assert_eq!(row.matrix_prefix, expected);
    Ok(())
}

#[test]
fn discover_without_matches_is_an_error() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("other.pig.DpnII"))?;
    assert!(discover(dir.path(), "trio").is_err());
    Ok(())
}
