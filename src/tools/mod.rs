//! Per-tool job constructors.
//!
//! Each submodule knows exactly one wrapper's fixed argument shape and
//! output naming, and turns typed inputs into a [`JobDraft`]. Graph
//! *shape* — which stages exist, co-assembly grouping, fan-out/fan-in,
//! re-wiring across skipped stages — is decided entirely by
//! [`crate::builder::GraphBuilder`]; nothing in here adds or removes
//! dependency edges beyond declaring its own inputs and outputs.
//!
//! Wrapper contract: every tool is an executable `<tool>.sh` invoked with
//! the argument list built here, reading its declared inputs and writing
//! its declared outputs at predictable paths; exit status zero means all
//! declared outputs exist.

pub mod assembly;
pub mod checkm2;
pub mod fastp;
pub mod fastqc;
pub mod gtdbtk;
pub mod metabat2;
pub mod multiqc;
pub mod prodigal;
pub mod prokka;
pub mod quast;

use crate::samplesheet::Sample;

/// A sample's current read artifacts as they flow down the read chain
/// (raw -> quality-control pass-through -> trimmed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadSet {
    pub r1: String,
    pub r2: Option<String>,
}

impl ReadSet {
    /// The raw-read lfns for a sample, as registered in the replica catalog.
    #[must_use]
    pub fn raw(sample: &Sample) -> Self {
        Self {
            r1: format!("{}_R1.fastq.gz", sample.id),
            r2: sample
                .is_paired()
                .then(|| format!("{}_R2.fastq.gz", sample.id)),
        }
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.r2.is_some()
    }

    /// Both lfns, forward first.
    #[must_use]
    pub fn lfns(&self) -> Vec<String> {
        let mut lfns = vec![self.r1.clone()];
        if let Some(r2) = &self.r2 {
            lfns.push(r2.clone());
        }
        lfns
    }
}
