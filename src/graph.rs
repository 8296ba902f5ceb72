//! Job/artifact graph model and structural validation.
//!
//! A [`Graph`] is the set of all jobs and file artifacts for one run, plus
//! the dependency relation induced by artifact production and consumption.
//! Artifacts are identified by logical file name (lfn); each lfn is
//! produced by exactly one job (or supplied externally) and consumed by
//! zero or more downstream jobs.
//!
//! The graph is append-only during construction and immutable afterwards:
//! [`crate::builder::GraphBuilder`] is the sole writer of artifact
//! identity, [`crate::serialize`] the sole reader for emission.
//!
//! [`Graph::validate`] checks the invariants the rest of the crate relies
//! on: single producer per artifact, no dangling input references, no
//! reference into a disabled stage, and acyclicity.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

use crate::registry::{ResourceProfile, Tool};
use crate::stages::{Stage, StagePolicy};

/// What a job operates on: one sample, one co-assembly group, or the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Sample(String),
    Group(String),
    Run,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Sample(id) => write!(f, "sample '{id}'"),
            Scope::Group(id) => write!(f, "group '{id}'"),
            Scope::Run => write!(f, "run"),
        }
    }
}

/// A declared job output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDecl {
    /// Logical file name, unique across the graph.
    pub lfn: String,
    /// Whether the execution engine should retain this file durably.
    pub stage_out: bool,
    /// Whether this output is a diagnostic/report artifact that the
    /// run-wide reporting job aggregates.
    pub report: bool,
}

impl OutputDecl {
    #[must_use]
    pub fn new(lfn: impl Into<String>) -> Self {
        Self {
            lfn: lfn.into(),
            stage_out: true,
            report: false,
        }
    }

    /// Mark this output as a report artifact for run-wide aggregation.
    #[must_use]
    pub fn report(mut self) -> Self {
        self.report = true;
        self
    }

    /// Keep this output in scratch only; do not stage it out.
    #[must_use]
    pub fn scratch_only(mut self) -> Self {
        self.stage_out = false;
        self
    }
}

/// A job draft as produced by the per-tool constructors in [`crate::tools`].
///
/// Drafts carry everything except resource requirements, which the binder
/// attaches later from the tool registry.
#[derive(Clone, Debug)]
pub struct JobDraft {
    pub id: String,
    pub tool: Tool,
    pub stage: Stage,
    pub scope: Scope,
    pub args: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputDecl>,
}

/// One invocation of a tool for one sample, group, or run.
#[derive(Clone, Debug)]
pub struct Job {
    pub id: String,
    pub tool: Tool,
    pub stage: Stage,
    pub scope: Scope,
    pub args: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputDecl>,
    /// Attached by the resource binder; `None` until bound.
    pub resources: Option<ResourceProfile>,
}

impl Job {
    fn from_draft(draft: JobDraft) -> Self {
        Self {
            id: draft.id,
            tool: draft.tool,
            stage: draft.stage,
            scope: draft.scope,
            args: draft.args,
            inputs: draft.inputs,
            outputs: draft.outputs,
            resources: None,
        }
    }
}

/// An externally-supplied input file (raw reads), resolved to a physical
/// location for the replica catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalInput {
    pub lfn: String,
    pub pfn: String,
}

/// The complete job/artifact graph for one run.
///
/// Jobs and external inputs are kept in construction order, which is what
/// makes serialization deterministic.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    name: String,
    jobs: Vec<Job>,
    external_inputs: Vec<ExternalInput>,
    /// lfn -> index of the producing job.
    producers: FxHashMap<String, usize>,
    /// lfns supplied from outside the graph.
    external_lfns: FxHashSet<String>,
}

impl Graph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut [Job] {
        &mut self.jobs
    }

    #[must_use]
    pub fn external_inputs(&self) -> &[ExternalInput] {
        &self.external_inputs
    }

    /// The job producing `lfn`, if any.
    #[must_use]
    pub fn producer_of(&self, lfn: &str) -> Option<&Job> {
        self.producers.get(lfn).map(|&idx| &self.jobs[idx])
    }

    /// Whether `lfn` is supplied from outside the graph.
    #[must_use]
    pub fn is_external(&self, lfn: &str) -> bool {
        self.external_lfns.contains(lfn)
    }

    /// Register an externally-supplied input artifact.
    pub fn add_external_input(
        &mut self,
        lfn: impl Into<String>,
        pfn: impl Into<String>,
    ) -> Result<(), GraphError> {
        let lfn = lfn.into();
        if self.external_lfns.contains(&lfn) || self.producers.contains_key(&lfn) {
            return Err(GraphError::DuplicateProducer {
                lfn,
                job_id: "<external>".into(),
            });
        }
        self.external_lfns.insert(lfn.clone());
        self.external_inputs.push(ExternalInput {
            lfn,
            pfn: pfn.into(),
        });
        Ok(())
    }

    /// Append a job, registering its outputs as produced artifacts.
    ///
    /// Fails if the job id is already taken or any declared output lfn
    /// already has a producer — artifacts are produced once and immutable
    /// thereafter.
    pub fn add_job(&mut self, draft: JobDraft) -> Result<(), GraphError> {
        if self.jobs.iter().any(|j| j.id == draft.id) {
            return Err(GraphError::DuplicateJobId { job_id: draft.id });
        }
        for output in &draft.outputs {
            if self.producers.contains_key(&output.lfn) || self.external_lfns.contains(&output.lfn)
            {
                return Err(GraphError::DuplicateProducer {
                    lfn: output.lfn.clone(),
                    job_id: draft.id,
                });
            }
        }
        let idx = self.jobs.len();
        for output in &draft.outputs {
            self.producers.insert(output.lfn.clone(), idx);
        }
        tracing::trace!(job = %draft.id, stage = %draft.stage, "job added");
        self.jobs.push(Job::from_draft(draft));
        Ok(())
    }

    /// Every report-flagged artifact from every job, in construction order.
    ///
    /// This is the input set of the run-wide reporting job; deriving it
    /// from graph state (instead of a side list) means adding or removing
    /// a sample can never leave a stale reference behind.
    #[must_use]
    pub fn report_artifacts(&self) -> Vec<String> {
        self.jobs
            .iter()
            .flat_map(|job| job.outputs.iter())
            .filter(|out| out.report)
            .map(|out| out.lfn.clone())
            .collect()
    }

    /// Dependency edges as `(parent job id, child job id)` pairs, in
    /// construction order of the child, deduplicated.
    #[must_use]
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        let mut seen = FxHashSet::default();
        for job in &self.jobs {
            for lfn in &job.inputs {
                if let Some(&parent_idx) = self.producers.get(lfn) {
                    let parent = &self.jobs[parent_idx];
                    if parent.id != job.id && seen.insert((parent_idx, job.id.clone())) {
                        edges.push((parent.id.clone(), job.id.clone()));
                    }
                }
            }
        }
        edges
    }

    /// Check the graph's structural invariants against a stage policy.
    ///
    /// - every input lfn resolves to exactly one producing job or an
    ///   external input (no dangling references);
    /// - no job belongs to, or consumes an artifact of, a disabled stage;
    /// - the induced job relation is acyclic.
    ///
    /// A failure here indicates a builder defect or a policy/graph
    /// inconsistency; it is never a user-input condition.
    pub fn validate(&self, policy: &StagePolicy) -> Result<(), GraphError> {
        for job in &self.jobs {
            if !policy.is_enabled(job.stage) {
                return Err(GraphError::DisabledStage {
                    job_id: job.id.clone(),
                    stage: job.stage,
                });
            }
            for lfn in &job.inputs {
                match self.producers.get(lfn) {
                    Some(&idx) => {
                        let producer = &self.jobs[idx];
                        if !policy.is_enabled(producer.stage) {
                            return Err(GraphError::DisabledStageInput {
                                job_id: job.id.clone(),
                                lfn: lfn.clone(),
                                stage: producer.stage,
                            });
                        }
                    }
                    None if self.external_lfns.contains(lfn) => {}
                    None => {
                        return Err(GraphError::DanglingReference {
                            job_id: job.id.clone(),
                            lfn: lfn.clone(),
                        });
                    }
                }
            }
        }
        self.check_acyclic()
    }

    /// Kahn's algorithm over the job-level dependency relation.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut indegree = vec![0usize; self.jobs.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.jobs.len()];

        for (child_idx, job) in self.jobs.iter().enumerate() {
            let mut parents = FxHashSet::default();
            for lfn in &job.inputs {
                if let Some(&parent_idx) = self.producers.get(lfn)
                    && parent_idx != child_idx
                    && parents.insert(parent_idx)
                {
                    children[parent_idx].push(child_idx);
                    indegree[child_idx] += 1;
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..self.jobs.len())
            .filter(|&i| indegree[i] == 0)
            .collect();
        let mut visited = 0usize;
        while let Some(idx) = queue.pop_front() {
            visited += 1;
            for &child in &children[idx] {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        if visited != self.jobs.len() {
            let stuck = indegree
                .iter()
                .position(|&d| d > 0)
                .map(|i| self.jobs[i].id.clone())
                .unwrap_or_default();
            return Err(GraphError::Cycle { job_id: stuck });
        }
        Ok(())
    }
}

/// Structural errors detected during graph construction or validation.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Two producers declared the same artifact.
    #[error("artifact '{lfn}' already has a producer (while adding job '{job_id}')")]
    #[diagnostic(code(magplan::graph::duplicate_producer))]
    DuplicateProducer { lfn: String, job_id: String },

    /// Two jobs share an identifier.
    #[error("job id '{job_id}' is already taken")]
    #[diagnostic(code(magplan::graph::duplicate_job_id))]
    DuplicateJobId { job_id: String },

    /// A job input resolves to no producer and no external input.
    #[error("job '{job_id}' references artifact '{lfn}' which nothing produces")]
    #[diagnostic(
        code(magplan::graph::dangling_reference),
        help("This indicates a graph construction defect, not an input problem.")
    )]
    DanglingReference { job_id: String, lfn: String },

    /// A job belongs to a stage the policy disabled.
    #[error("job '{job_id}' belongs to disabled stage '{stage}'")]
    #[diagnostic(code(magplan::graph::disabled_stage))]
    DisabledStage { job_id: String, stage: Stage },

    /// A job consumes an artifact produced by a disabled stage.
    #[error("job '{job_id}' consumes '{lfn}' from disabled stage '{stage}'")]
    #[diagnostic(
        code(magplan::graph::disabled_stage_input),
        help("The stage policy and the constructed graph disagree; this is fatal by design.")
    )]
    DisabledStageInput {
        job_id: String,
        lfn: String,
        stage: Stage,
    },

    /// The induced dependency relation contains a cycle.
    #[error("dependency cycle involving job '{job_id}'")]
    #[diagnostic(code(magplan::graph::cycle))]
    Cycle { job_id: String },
}
