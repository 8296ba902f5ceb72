//! QUAST: assembly metrics.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

pub fn job(group: &str, contigs: &str) -> JobDraft {
    JobDraft {
        id: format!("quast_{group}"),
        tool: Tool::Quast,
        stage: Stage::AssemblyQc,
        scope: Scope::Group(group.to_owned()),
        args: vec![
            contigs.to_owned(),
            "-o".into(),
            format!("{group}_quast"),
            "--min-contig".into(),
            "1000".into(),
            "--threads".into(),
            "4".into(),
        ],
        inputs: vec![contigs.to_owned()],
        outputs: vec![
            OutputDecl::new(format!("{group}_quast_report.tsv")).report(),
            OutputDecl::new(format!("{group}_quast_report.html")),
        ],
    }
}
