//! Prodigal: ORF calling on contigs, metagenome mode.
//!
//! Depends only on the contigs artifact; independent of assembly-qc so the
//! two can run concurrently.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

pub fn job(group: &str, contigs: &str) -> JobDraft {
    let faa = format!("{group}_genes.faa");
    let gff = format!("{group}_genes.gff");
    JobDraft {
        id: format!("prodigal_{group}"),
        tool: Tool::Prodigal,
        stage: Stage::GenePrediction,
        scope: Scope::Group(group.to_owned()),
        args: vec![
            "-i".into(),
            contigs.to_owned(),
            "-a".into(),
            faa.clone(),
            "-o".into(),
            gff.clone(),
            "-f".into(),
            "gff".into(),
            "-p".into(),
            "meta".into(),
        ],
        inputs: vec![contigs.to_owned()],
        outputs: vec![OutputDecl::new(faa), OutputDecl::new(gff)],
    }
}
