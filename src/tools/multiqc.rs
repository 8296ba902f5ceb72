//! MultiQC: run-wide report aggregation.
//!
//! Exactly one job per run; its inputs are the union of every
//! report-flagged artifact across all samples and groups.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

pub fn job(report_inputs: Vec<String>) -> JobDraft {
    JobDraft {
        id: "multiqc".into(),
        tool: Tool::Multiqc,
        stage: Stage::Reporting,
        scope: Scope::Run,
        args: vec![
            ".".into(),
            "-o".into(),
            "multiqc_output".into(),
            "--force".into(),
        ],
        inputs: report_inputs,
        outputs: vec![
            OutputDecl::new("multiqc_report.html"),
            OutputDecl::new("multiqc_data.json"),
        ],
    }
}
