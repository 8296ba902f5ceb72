//! FastQC: read-level quality diagnostics.
//!
//! FastQC is diagnostic-only and does not transform its input. The job
//! still declares pass-through read artifacts (`*.checked.fastq.gz`) so
//! that downstream read consumers depend on it when the stage is enabled;
//! the wrapper materializes them losslessly.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

use super::ReadSet;

/// Quality-control job for one sample. Returns the draft plus the
/// pass-through read set the next read stage consumes.
pub fn job(sample_id: &str, reads: &ReadSet) -> (JobDraft, ReadSet) {
    let passthrough = ReadSet {
        r1: format!("{sample_id}_R1.checked.fastq.gz"),
        r2: reads
            .is_paired()
            .then(|| format!("{sample_id}_R2.checked.fastq.gz")),
    };

    let mut args = vec![
        "--outdir".into(),
        ".".into(),
        "--threads".into(),
        "2".into(),
        reads.r1.clone(),
    ];
    let mut outputs = vec![
        OutputDecl::new(format!("{sample_id}_R1_fastqc.html")),
        OutputDecl::new(format!("{sample_id}_R1_fastqc.zip")).report(),
        OutputDecl::new(&passthrough.r1).scratch_only(),
    ];
    if let (Some(r2), Some(out_r2)) = (&reads.r2, &passthrough.r2) {
        args.push(r2.clone());
        outputs.push(OutputDecl::new(format!("{sample_id}_R2_fastqc.html")));
        outputs.push(OutputDecl::new(format!("{sample_id}_R2_fastqc.zip")).report());
        outputs.push(OutputDecl::new(out_r2).scratch_only());
    }

    let draft = JobDraft {
        id: format!("fastqc_{sample_id}"),
        tool: Tool::Fastqc,
        stage: Stage::QualityControl,
        scope: Scope::Sample(sample_id.to_owned()),
        args,
        inputs: reads.lfns(),
        outputs,
    };
    (draft, passthrough)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_job_declares_both_read_reports() {
        let reads = ReadSet {
            r1: "s1_R1.fastq.gz".into(),
            r2: Some("s1_R2.fastq.gz".into()),
        };
        let (draft, passthrough) = job("s1", &reads);
        assert_eq!(draft.id, "fastqc_s1");
        assert_eq!(draft.inputs.len(), 2);
        let reports: Vec<_> = draft.outputs.iter().filter(|o| o.report).collect();
        assert_eq!(reports.len(), 2);
        assert!(passthrough.is_paired());
        // Pass-through artifacts stay in scratch.
        assert!(
            draft
                .outputs
                .iter()
                .filter(|o| o.lfn.ends_with(".checked.fastq.gz"))
                .all(|o| !o.stage_out)
        );
    }

    #[test]
    fn single_end_job_has_one_report() {
        let reads = ReadSet {
            r1: "s2_R1.fastq.gz".into(),
            r2: None,
        };
        let (draft, passthrough) = job("s2", &reads);
        assert_eq!(draft.inputs, vec!["s2_R1.fastq.gz"]);
        assert_eq!(
            draft.outputs.iter().filter(|o| o.report).count(),
            1
        );
        assert!(!passthrough.is_paired());
    }
}
