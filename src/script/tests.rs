use crate::script::{JobScript, Scheduler, ScriptArgs};
use color_eyre::eyre::{Report, Result};
use std::path::PathBuf;

fn pig_script() -> JobScript {
    JobScript {
        job_name: "hic_pig".to_string(),
        mail_user: Some("hic@example.org".to_string()),
        queue: Some("workq".to_string()),
        input_dir: PathBuf::from("/data/reads/pig1"),
        output_dir: PathBuf::from("/data/hic/pig1"),
        fasta: PathBuf::from("/data/genome/Sscrofa11.1.fa"),
        chromosome_size: Some(PathBuf::from("/data/genome/Sscrofa11.1.sizes")),
        restriction_fragments: Some(PathBuf::from("/data/genome/DpnII.bed")),
        ..Default::default()
    }
}

#[test]
fn render_is_deterministic() {
    let script = pig_script();
    assert_eq!(script.render(), script.render());
}

#[test]
fn slurm_directives() {
    let text = pig_script().render();
    let directives: Vec<_> = text.lines().filter(|l| l.starts_with("#SBATCH")).collect();

    assert_eq!(
        directives,
        [
            "#SBATCH --job-name=hic_pig",
            "#SBATCH --output=logs/hic_pig.%j.out",
            "#SBATCH --error=logs/hic_pig.%j.err",
            "#SBATCH --partition=workq",
            "#SBATCH --mail-user=hic@example.org",
            "#SBATCH --mail-type=END,FAIL",
            "#SBATCH --nodes=1",
            "#SBATCH --cpus-per-task=8",
            "#SBATCH --mem=32G",
        ]
    );
}

#[test]
fn sge_directives() {
    let script = JobScript { scheduler: Scheduler::Sge, ..pig_script() };
    let text = script.render();

    assert!(!text.contains("#SBATCH"));
    assert!(text.contains("#$ -N hic_pig\n"));
    assert!(text.contains("#$ -q workq\n"));
    assert!(text.contains("#$ -pe smp 8\n"));
    assert!(text.contains("#$ -l h_vmem=32G\n"));
}

#[test]
fn optional_values_are_omitted() {
    let script = JobScript { queue: None, mail_user: None, restriction_fragments: None, ..pig_script() };
    let text = script.render();

    assert!(!text.contains("--partition"));
    assert!(!text.contains("--mail-user"));
    assert!(!text.contains("--restriction_fragments"));
    assert!(!text.contains("--bwt2_index"));
    assert!(!text.contains(" -c "));
}

#[test]
fn pipeline_invocation() {
    let text = pig_script().render();

    assert!(text.contains("module load nextflow\nmodule load singularity\n"));
    assert!(text.contains("nextflow run nf-core/hic \\\n    -r 1.3.1 \\\n    -profile singularity \\\n"));
    assert!(text.contains("    --reads '/data/reads/pig1/*_R{1,2}.fastq.gz' \\\n"));
    assert!(text.contains("    --fasta /data/genome/Sscrofa11.1.fa \\\n"));
    assert!(text.contains("    --chromosome_size /data/genome/Sscrofa11.1.sizes \\\n"));
    assert!(text.contains("    --restriction_fragments /data/genome/DpnII.bed \\\n"));
    assert!(text.contains("    -w /data/hic/pig1/work \\\n"));
    assert!(text.contains("    --restriction_site '^GATC' \\\n"));
    assert!(text.contains(
        "    --bwt2_opts_end2end '--very-sensitive -L 30 --score-min L,-0.6,-0.2 --end-to-end --reorder' \\\n"
    ));
    assert!(text.contains("    --bin_size 1000000,500000,200000,50000 \\\n"));
    assert!(text.contains("    --rm_dup \\\n    --rm_singleton \\\n"));

    // the last flag ends the command
    assert!(text.ends_with("    --skip_cool\n"));
}

#[test]
fn every_flag_is_continued() {
    let script = JobScript { skip: vec!["cool".to_string(), "multiqc".to_string()], ..pig_script() };
    let text = script.render();
    let command: Vec<_> = text.lines().skip_while(|l| !l.starts_with("nextflow run")).collect();

    let (last, rest) = command.split_last().unwrap();
    assert_eq!(*last, "    --skip_multiqc");
    assert!(rest.iter().all(|l| l.ends_with(" \\")));
    assert_eq!(command.len(), script.pipeline_args().len() + 1);
}

#[test]
fn work_dir_can_be_set() {
    let script = JobScript { work_dir: Some(PathBuf::from("/scratch/work")), resume: false, ..pig_script() };
    let text = script.render();
    assert!(text.contains("    -w /scratch/work \\\n"));
    assert!(!text.contains("-resume"));
}

#[cfg(unix)]
#[test]
fn write_makes_script_executable() -> Result<(), Report> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("jobs/hic_pig.sh");
    let script = JobScript { log_dir: dir.path().join("logs"), ..pig_script() };
    script.write(&path)?;

    assert_eq!(std::fs::read_to_string(&path)?, script.render());
    assert_eq!(std::fs::metadata(&path)?.permissions().mode() & 0o111, 0o111);
    assert!(dir.path().join("logs").is_dir());
    Ok(())
}

#[test]
fn parameters_file_with_overrides() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let params = dir.path().join("params.json");
    std::fs::write(&params, r#"{"job_name": "duroc", "cpus": 16, "skip": []}"#)?;

    let args = ScriptArgs {
        params: Some(params),
        fasta: Some(PathBuf::from("duroc.fa")),
        scheduler: Some(Scheduler::Sge),
        ..Default::default()
    };
    let script = args.job_script()?;

    assert_eq!(script.job_name, "duroc");
    assert_eq!(script.cpus, 16);
    assert!(script.skip.is_empty());
    assert_eq!(script.fasta, PathBuf::from("duroc.fa"));
    assert_eq!(script.scheduler, Scheduler::Sge);
    assert_eq!(script.memory, JobScript::default().memory);
    Ok(())
}

#[test]
fn parameters_reject_unknown_keys() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let params = dir.path().join("params.json");
    std::fs::write(&params, r#"{"genome": "Sscrofa11.1"}"#)?;
    assert!(JobScript::read(&params).is_err());
    Ok(())
}

#[test]
fn write_json_then_read() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("params/pig1.json");
    let script = pig_script();
    script.write_json(&path)?;
    assert_eq!(JobScript::read(&path)?, script);
    Ok(())
}
