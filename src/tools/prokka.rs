//! Prokka: functional annotation of genome bins.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

pub fn job(group: &str, bins: &str) -> JobDraft {
    JobDraft {
        id: format!("prokka_{group}"),
        tool: Tool::Prokka,
        stage: Stage::Annotation,
        scope: Scope::Group(group.to_owned()),
        args: vec![
            "--outdir".into(),
            format!("{group}_prokka"),
            "--prefix".into(),
            group.to_owned(),
            "--metagenome".into(),
            "--cpus".into(),
            "4".into(),
            bins.to_owned(),
        ],
        inputs: vec![bins.to_owned()],
        outputs: vec![
            OutputDecl::new(format!("{group}_prokka.gff")),
            OutputDecl::new(format!("{group}_prokka.gbk")),
            OutputDecl::new(format!("{group}_prokka.faa")),
            // The plain-text summary is what feeds the run report.
            OutputDecl::new(format!("{group}_prokka.txt")).report(),
        ],
    }
}
