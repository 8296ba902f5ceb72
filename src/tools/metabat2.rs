//! MetaBAT2: contig binning, two jobs per group.
//!
//! The depth summarization step and MetaBAT2 proper are separate jobs that
//! share the metabat2 wrapper; the depth table is an intermediate artifact
//! that never leaves scratch.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

/// Contig depth summarization. Returns the draft plus the depth-table lfn.
pub fn depth_job(group: &str, contigs: &str) -> (JobDraft, String) {
    let depth = format!("{group}_depth.txt");
    let draft = JobDraft {
        id: format!("jgi_depth_{group}"),
        tool: Tool::Metabat2,
        stage: Stage::Binning,
        scope: Scope::Group(group.to_owned()),
        args: vec![
            "jgi_summarize_bam_contig_depths".into(),
            "--outputDepth".into(),
            depth.clone(),
            contigs.to_owned(),
        ],
        inputs: vec![contigs.to_owned()],
        outputs: vec![OutputDecl::new(&depth).scratch_only()],
    };
    (draft, depth)
}

/// MetaBAT2 proper. Returns the draft plus the genome-bin directory lfn
/// that bin-quality, taxonomy, and annotation all consume.
pub fn binning_job(group: &str, contigs: &str, depth: &str) -> (JobDraft, String) {
    let bins = format!("{group}_bins");
    let draft = JobDraft {
        id: format!("metabat2_{group}"),
        tool: Tool::Metabat2,
        stage: Stage::Binning,
        scope: Scope::Group(group.to_owned()),
        args: vec![
            "-i".into(),
            contigs.to_owned(),
            "-a".into(),
            depth.to_owned(),
            "-o".into(),
            format!("{group}_bins/bin"),
            "-m".into(),
            "1500".into(),
            "-t".into(),
            "4".into(),
        ],
        inputs: vec![contigs.to_owned(), depth.to_owned()],
        outputs: vec![OutputDecl::new(&bins)],
    };
    (draft, bins)
}
