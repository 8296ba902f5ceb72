//! MEGAHIT / metaSPAdes: contig assembly, one job per co-assembly group.
//!
//! Every member sample's read set feeds the group's single assembly job.
//! Mixed single- and paired-end membership is permitted; only the argument
//! shape changes, never the graph shape. MEGAHIT takes comma-joined read
//! lists, SPAdes takes numbered library flags.

use crate::graph::{JobDraft, OutputDecl, Scope};
use crate::registry::Tool;
use crate::stages::{Assembler, Stage};

use super::ReadSet;

/// Assembly job for one group over its members' current read sets.
/// Returns the draft plus the contigs lfn downstream stages consume.
pub fn job(assembler: Assembler, group: &str, members: &[ReadSet]) -> (JobDraft, String) {
    let contigs = format!("{group}_contigs.fa");
    let log = format!("{group}_assembly.log");

    let (tool, args) = match assembler {
        Assembler::Megahit => (Tool::Megahit, megahit_args(group, members)),
        Assembler::Spades => (Tool::Spades, spades_args(group, members)),
    };

    let inputs = members.iter().flat_map(ReadSet::lfns).collect();
    let draft = JobDraft {
        id: format!("{}_{group}", tool.as_str()),
        tool,
        stage: Stage::Assembly,
        scope: Scope::Group(group.to_owned()),
        args,
        inputs,
        outputs: vec![OutputDecl::new(&contigs), OutputDecl::new(log)],
    };
    (draft, contigs)
}

fn megahit_args(group: &str, members: &[ReadSet]) -> Vec<String> {
    let mut fwd = Vec::new();
    let mut rev = Vec::new();
    let mut single = Vec::new();
    for reads in members {
        match &reads.r2 {
            Some(r2) => {
                fwd.push(reads.r1.clone());
                rev.push(r2.clone());
            }
            None => single.push(reads.r1.clone()),
        }
    }

    let mut args = Vec::new();
    if !fwd.is_empty() {
        args.extend(["-1".into(), fwd.join(","), "-2".into(), rev.join(",")]);
    }
    if !single.is_empty() {
        args.extend(["-r".into(), single.join(",")]);
    }
    args.extend([
        "-o".into(),
        format!("{group}_megahit"),
        "-t".into(),
        "8".into(),
        "--min-contig-len".into(),
        "1000".into(),
    ]);
    args
}

fn spades_args(group: &str, members: &[ReadSet]) -> Vec<String> {
    let mut args = Vec::new();
    for (k, reads) in members.iter().enumerate() {
        let lib = k + 1;
        match &reads.r2 {
            Some(r2) => args.extend([
                format!("--pe{lib}-1"),
                reads.r1.clone(),
                format!("--pe{lib}-2"),
                r2.clone(),
            ]),
            None => args.extend([format!("--s{lib}"), reads.r1.clone()]),
        }
    }
    args.extend([
        "-o".into(),
        format!("{group}_spades"),
        "-t".into(),
        "16".into(),
        "--meta".into(),
    ]);
    args
}
