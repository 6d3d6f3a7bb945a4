use crate::Table;
use color_eyre::eyre::{Report, Result};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn read_skips_blank_lines() -> Result<(), Report> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "sample\tprotocol\tmatrixprefix\n\npig1\tDpnII\tdata/pig1_\n\npig1\tArima\tdata/pig1_arima_\n")?;
    let table = Table::read(file.path(), Some('\t'))?;

    assert_eq!(table.headers, ["sample", "protocol", "matrixprefix"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.get_column("protocol")?, [&"DpnII".to_string(), &"Arima".to_string()]);
    Ok(())
}

#[test]
fn read_rejects_short_row() -> Result<(), Report> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "sample\tprotocol\tmatrixprefix\npig1\tDpnII")?;
    let result = Table::read(file.path(), Some('\t'));
    assert!(result.is_err());
    Ok(())
}

#[test]
fn missing_column_names_table() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["sample", "protocol"];
    table.add_row(vec!["pig1", "DpnII"])?;

    let error = table.get_column("matrixprefix").unwrap_err();
    assert!(error.to_string().contains("Column 'matrixprefix' was not found"));
    Ok(())
}

#[test]
fn with_column_rejects_wrong_length() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["sample"];
    table.add_row(vec!["pig1"])?;
    table.add_row(vec!["pig2"])?;

    assert!(table.with_column("runs", vec!["run1"]).is_err());
    Ok(())
}

#[test]
fn write_then_read() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested/manifest.tsv");

    let mut table = Table::new();
    table.headers = vec!["sample", "protocol", "runs"];
    table.add_row(vec!["pig1", "DpnII", "run1,run2"])?;
    table.write(&path, None)?;

    let observed = Table::read(&path, None)?;
    let expected = Table { path: Some(path.clone()), ..table.to_string_values() };
    assert_eq!(observed, expected);
    Ok(())
}

#[test]
fn markdown_pads_columns() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["1", "2"];
    table.add_row(vec!["AAA", "B"])?;

    let expected = "|  1  | 2 |\n|-----|---|\n| AAA | B |\n";
    assert_eq!(table.to_markdown(), expected);
    Ok(())
}
