//! GTDB-Tk: taxonomic placement of genome bins.
//!
//! Consumes only the genome-bin artifact, so taxonomy runs concurrently
//! with bin-quality and annotation rather than behind them.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

pub fn job(group: &str, bins: &str, database: Option<&str>) -> JobDraft {
    let mut args = vec![
        "classify_wf".into(),
        "--genome_dir".into(),
        bins.to_owned(),
        "--out_dir".into(),
        format!("{group}_gtdbtk"),
        "--extension".into(),
        "fa".into(),
        "--cpus".into(),
        "8".into(),
    ];
    if let Some(db) = database {
        args.extend(["--gtdbtk_data_path".into(), db.to_owned()]);
    }
    JobDraft {
        id: format!("gtdbtk_{group}"),
        tool: Tool::Gtdbtk,
        stage: Stage::Taxonomy,
        scope: Scope::Group(group.to_owned()),
        args,
        inputs: vec![bins.to_owned()],
        outputs: vec![OutputDecl::new(format!("{group}_gtdbtk.summary.tsv")).report()],
    }
}
