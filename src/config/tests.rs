use crate::config::{CorrectionMethod, MultipleTesting, Normalize, WorkflowConfig};
use color_eyre::eyre::{Report, Result};
use std::path::PathBuf;
use std::str::FromStr;

const MINIMAL: &str = r#"{
    "sampled_protocols": "sampled_protocols.tsv",
    "chromosomes": ["1", "2"],
    "resolutions": [1000000],
    "regions": ["1:1-5000000"],
    "samples": ["pig1"]
}"#;

#[test]
fn minimal_config_gets_defaults() -> Result<(), Report> {
    let config: WorkflowConfig = serde_json::from_str(MINIMAL)?;

    assert_eq!(config.output_dir, PathBuf::from("."));
    assert_eq!(config.normalize, Normalize::NormRange);
    assert_eq!(config.correction.method, CorrectionMethod::Ice);
    assert_eq!(config.correction.iterations, 500);
    assert_eq!(config.tads.multiple_testing, MultipleTesting::Fdr);
    assert!(config.plot.log1p);
    assert_eq!(config.plot.dpi, 300);
    Ok(())
}

#[test]
fn unknown_key_is_rejected() {
    let input = MINIMAL.replace("\"samples\"", "\"sample_names\"");
    assert!(serde_json::from_str::<WorkflowConfig>(&input).is_err());

    let input = MINIMAL.replace("\"samples\": [\"pig1\"]", "\"samples\": [\"pig1\"], \"plot\": {\"colour\": \"red\"}");
    assert!(serde_json::from_str::<WorkflowConfig>(&input).is_err());
}

#[test]
fn nested_sections_merge_with_defaults() -> Result<(), Report> {
    let input = MINIMAL.replace(
        "\"samples\": [\"pig1\"]",
        r#""samples": ["pig1"], "normalize": "smallest", "correction": {"method": "KR"}, "tads": {"multiple_testing": "bonferroni"}"#,
    );
    let config: WorkflowConfig = serde_json::from_str(&input)?;

    assert_eq!(config.normalize, Normalize::Smallest);
    assert_eq!(config.correction.method, CorrectionMethod::Kr);
    assert_eq!(config.correction.filter_threshold, [-1.5, 5.0]);
    assert_eq!(config.tads.multiple_testing, MultipleTesting::Bonferroni);
    assert_eq!(config.tads.delta, 0.01);
    Ok(())
}

#[test]
fn check_rejects_empty_lists() {
    let config = WorkflowConfig {
        samples: vec!["pig1".to_string()],
        chromosomes: vec!["1".to_string()],
        ..Default::default()
    };
    assert!(config.check().is_ok());

    let empty_samples = WorkflowConfig { samples: Vec::new(), ..config.clone() };
    assert!(empty_samples.check().is_err());

    let empty_resolutions = WorkflowConfig { resolutions: Vec::new(), ..config.clone() };
    assert!(empty_resolutions.check().is_err());

    let no_chromosomes = WorkflowConfig { chromosomes: Vec::new(), ..config.clone() };
    assert!(no_chromosomes.check().is_err());

    let zero = WorkflowConfig { resolutions: vec![0], ..config };
    assert!(zero.check().is_err());
}

#[test]
fn tool_option_names() -> Result<(), Report> {
    assert_eq!(Normalize::NormRange.to_string(), "norm_range");
    assert_eq!(Normalize::from_str("multiplicative")?, Normalize::Multiplicative);
    assert_eq!(CorrectionMethod::Kr.to_string(), "KR");
    assert_eq!(CorrectionMethod::from_str("ICE")?, CorrectionMethod::Ice);
    assert_eq!(MultipleTesting::Bonferroni.to_string(), "bonferroni");
    Ok(())
}

#[test]
fn write_then_read() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config/workflow.json");

    let config = WorkflowConfig {
        samples: vec!["pig1".to_string(), "pig2".to_string()],
        chromosomes: vec!["1".to_string()],
        output_dir: PathBuf::from("results"),
        threads: 4,
        ..Default::default()
    };
    config.write(&path)?;

    let observed = WorkflowConfig::read(&path)?;
    assert_eq!(observed, config);
    assert_eq!(observed.layout().root, PathBuf::from("results"));
    Ok(())
}

#[test]
fn read_reports_invalid_config() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("workflow.json");
    std::fs::write(&path, MINIMAL.replace("[\"pig1\"]", "[]"))?;
    assert!(WorkflowConfig::read(&path).is_err());
    Ok(())
}
