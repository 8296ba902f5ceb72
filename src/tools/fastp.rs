//! fastp: adapter and quality trimming.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

use super::ReadSet;

/// Trimming job for one sample. Returns the draft plus the trimmed read
/// set consumed by assembly.
pub fn job(sample_id: &str, reads: &ReadSet) -> (JobDraft, ReadSet) {
    let trimmed = ReadSet {
        r1: format!("{sample_id}_trimmed_R1.fastq.gz"),
        r2: reads
            .is_paired()
            .then(|| format!("{sample_id}_trimmed_R2.fastq.gz")),
    };
    let json = format!("{sample_id}_fastp.json");
    let html = format!("{sample_id}_fastp.html");

    let mut args = vec![
        "-i".into(),
        reads.r1.clone(),
        "-o".into(),
        trimmed.r1.clone(),
    ];
    if let (Some(in_r2), Some(out_r2)) = (&reads.r2, &trimmed.r2) {
        args.extend(["-I".into(), in_r2.clone(), "-O".into(), out_r2.clone()]);
    }
    args.extend([
        "--json".into(),
        json.clone(),
        "--html".into(),
        html.clone(),
        "--thread".into(),
        "4".into(),
        "--qualified_quality_phred".into(),
        "20".into(),
        "--length_required".into(),
        "50".into(),
    ]);

    let mut outputs = vec![OutputDecl::new(&trimmed.r1)];
    if let Some(out_r2) = &trimmed.r2 {
        outputs.push(OutputDecl::new(out_r2));
    }
    outputs.push(OutputDecl::new(json).report());
    outputs.push(OutputDecl::new(html));

    let draft = JobDraft {
        id: format!("fastp_{sample_id}"),
        tool: Tool::Fastp,
        stage: Stage::Trimming,
        scope: Scope::Sample(sample_id.to_owned()),
        args,
        inputs: reads.lfns(),
        outputs,
    };
    (draft, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_end_job_omits_reverse_flags() {
        let reads = ReadSet {
            r1: "s1_R1.fastq.gz".into(),
            r2: None,
        };
        let (draft, trimmed) = job("s1", &reads);
        assert!(!draft.args.contains(&"-I".to_string()));
        assert!(!trimmed.is_paired());
        assert_eq!(
            draft.outputs.iter().filter(|o| o.report).count(),
            1,
            "only the json summary feeds reporting"
        );
    }

    #[test]
    fn consumes_whatever_read_set_it_is_given() {
        // When quality control is enabled the builder hands in the
        // pass-through artifacts instead of the raw reads.
        let reads = ReadSet {
            r1: "s1_R1.checked.fastq.gz".into(),
            r2: Some("s1_R2.checked.fastq.gz".into()),
        };
        let (draft, _) = job("s1", &reads);
        assert_eq!(draft.inputs, reads.lfns());
        assert!(draft.args.contains(&"s1_R1.checked.fastq.gz".to_string()));
    }
}
