//! Graph construction: samples plus policy in, validated job graph out.
//!
//! [`GraphBuilder`] owns all graph *shape* decisions. It walks each
//! sample's read chain in stage order, re-wiring across skipped read
//! stages, then groups samples for co-assembly and fans out from contigs
//! and bins. Per-tool argument shapes live in [`crate::tools`]; this
//! module only decides which jobs exist and what feeds them.
//!
//! Construction is a single deterministic pass: samples in samplesheet
//! order, groups in first-appearance order, stages in canonical order
//! within each scope. Two builds over equal inputs produce graphs that
//! serialize byte-identically.
//!
//! # Examples
//!
//! ```
//! use magplan::builder::GraphBuilder;
//! use magplan::samplesheet::Sample;
//! use magplan::stages::{SkipFlags, StagePolicy};
//!
//! let samples = vec![Sample::paired(
//!     "s1",
//!     "/data/s1_R1.fastq.gz",
//!     "/data/s1_R2.fastq.gz",
//!     None,
//! )];
//! let graph = GraphBuilder::new("mag-run")
//!     .with_policy(StagePolicy::resolve(&SkipFlags::default()))
//!     .build(&samples)?;
//! assert!(graph.jobs().iter().any(|j| j.id == "multiqc"));
//! # Ok::<(), magplan::builder::BuildError>(())
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::catalogs::resolve_pfn;
use crate::graph::{Graph, GraphError};
use crate::samplesheet::Sample;
use crate::stages::{Assembler, PolicyError, Stage, StagePolicy};
use crate::tools::{self, ReadSet};

/// Fluent builder for one run's job graph.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    name: String,
    policy: StagePolicy,
    assembler: Assembler,
    checkm2_db: Option<String>,
    gtdbtk_db: Option<String>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: StagePolicy::all_enabled(),
            assembler: Assembler::default(),
            checkm2_db: None,
            gtdbtk_db: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: StagePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Local CheckM2 database path, forwarded verbatim to the wrapper.
    #[must_use]
    pub fn with_checkm2_db(mut self, path: impl Into<String>) -> Self {
        self.checkm2_db = Some(path.into());
        self
    }

    /// Local GTDB-Tk database path, forwarded verbatim to the wrapper.
    #[must_use]
    pub fn with_gtdbtk_db(mut self, path: impl Into<String>) -> Self {
        self.gtdbtk_db = Some(path.into());
        self
    }

    /// Construct and validate the job graph for `samples`.
    ///
    /// The policy is validated first, so a hand-built inconsistent policy
    /// fails before any job exists. The finished graph is re-validated
    /// against the same policy; a failure there is a construction defect.
    #[tracing::instrument(skip_all, fields(name = %self.name, samples = samples.len()))]
    pub fn build(&self, samples: &[Sample]) -> Result<Graph, BuildError> {
        self.policy.validate()?;

        let mut graph = Graph::new(&self.name);
        let mut groups: Vec<(String, Vec<ReadSet>)> = Vec::new();
        let mut group_index: FxHashMap<String, usize> = FxHashMap::default();

        for sample in samples {
            let reads = self.read_chain(&mut graph, sample)?;
            let idx = *group_index.entry(sample.group.clone()).or_insert_with(|| {
                groups.push((sample.group.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(reads);
        }

        if self.policy.is_enabled(Stage::Assembly) {
            for (group, members) in &groups {
                self.group_chain(&mut graph, group, members)?;
            }
        }

        if self.policy.is_enabled(Stage::Reporting) {
            graph.add_job(tools::multiqc::job(graph.report_artifacts()))?;
        }

        graph.validate(&self.policy)?;
        tracing::info!(
            jobs = graph.jobs().len(),
            edges = graph.edges().len(),
            groups = groups.len(),
            "graph constructed"
        );
        Ok(graph)
    }

    /// Per-sample read chain: register the raw reads, then thread the
    /// current read set through whichever read stages are enabled.
    fn read_chain(&self, graph: &mut Graph, sample: &Sample) -> Result<ReadSet, BuildError> {
        let raw = ReadSet::raw(sample);
        graph.add_external_input(&raw.r1, pfn_for(&sample.fastq_1)?)?;
        if let (Some(lfn), Some(path)) = (&raw.r2, &sample.fastq_2) {
            graph.add_external_input(lfn, pfn_for(path)?)?;
        }

        let mut current = raw;
        if self.policy.is_enabled(Stage::QualityControl) {
            let (draft, passthrough) = tools::fastqc::job(&sample.id, &current);
            graph.add_job(draft)?;
            current = passthrough;
        }
        if self.policy.is_enabled(Stage::Trimming) {
            let (draft, trimmed) = tools::fastp::job(&sample.id, &current);
            graph.add_job(draft)?;
            current = trimmed;
        }
        Ok(current)
    }

    /// Per-group chain: assembly, then the contig fan-out (assembly-qc and
    /// gene-prediction), then the binning chain and the three-way bin
    /// fan-out. Bin-quality, taxonomy, and annotation each consume only
    /// the genome bins, never each other's outputs.
    fn group_chain(
        &self,
        graph: &mut Graph,
        group: &str,
        members: &[ReadSet],
    ) -> Result<(), BuildError> {
        let (draft, contigs) = tools::assembly::job(self.assembler, group, members);
        graph.add_job(draft)?;

        if self.policy.is_enabled(Stage::AssemblyQc) {
            graph.add_job(tools::quast::job(group, &contigs))?;
        }
        if self.policy.is_enabled(Stage::GenePrediction) {
            graph.add_job(tools::prodigal::job(group, &contigs))?;
        }

        if self.policy.is_enabled(Stage::Binning) {
            let (depth_draft, depth) = tools::metabat2::depth_job(group, &contigs);
            graph.add_job(depth_draft)?;
            let (bin_draft, bins) = tools::metabat2::binning_job(group, &contigs, &depth);
            graph.add_job(bin_draft)?;

            if self.policy.is_enabled(Stage::BinQuality) {
                graph.add_job(tools::checkm2::job(group, &bins, self.checkm2_db.as_deref()))?;
            }
            if self.policy.is_enabled(Stage::Taxonomy) {
                graph.add_job(tools::gtdbtk::job(group, &bins, self.gtdbtk_db.as_deref()))?;
            }
            if self.policy.is_enabled(Stage::Annotation) {
                graph.add_job(tools::prokka::job(group, &bins))?;
            }
        }
        Ok(())
    }
}

fn pfn_for(path: &str) -> Result<String, BuildError> {
    resolve_pfn(path).map_err(|source| BuildError::ReadPath {
        path: path.to_owned(),
        source,
    })
}

/// Errors surfaced while constructing a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// A read path could not be resolved to a physical file name.
    #[error("cannot resolve read path '{path}'")]
    #[diagnostic(code(magplan::builder::read_path))]
    ReadPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
