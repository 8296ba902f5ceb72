//! CheckM2: bin completeness and contamination.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::Stage;

/// Bin-quality job for one group. `database` is an optional local database
/// path passed through verbatim; it is not a graph artifact.
pub fn job(group: &str, bins: &str, database: Option<&str>) -> JobDraft {
    let mut args = vec![
        "predict".into(),
        "--input".into(),
        bins.to_owned(),
        "--output-directory".into(),
        format!("{group}_checkm2"),
        "--threads".into(),
        "8".into(),
    ];
    if let Some(db) = database {
        args.extend(["--database_path".into(), db.to_owned()]);
    }
    JobDraft {
        id: format!("checkm2_{group}"),
        tool: Tool::Checkm2,
        stage: Stage::BinQuality,
        scope: Scope::Group(group.to_owned()),
        args,
        inputs: vec![bins.to_owned()],
        outputs: vec![OutputDecl::new(format!("{group}_checkm2_quality.tsv")).report()],
    }
}
