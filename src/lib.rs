//! # magplan
//!
//! Deterministic workflow planner for short-read metagenome-assembled
//! genome (MAG) pipelines. Given a samplesheet, a stage policy, and a tool
//! registry, magplan constructs the complete job/artifact graph for one
//! run and emits it as a portable workflow description (workflow document
//! plus transformation, replica, and site catalogs) for an execution
//! engine to schedule.
//!
//! The planner never executes tools and never touches read data; its
//! whole contract is graph construction. Identical inputs always produce
//! byte-identical output documents.
//!
//! ## Module guide
//!
//! - [`samplesheet`]: CSV parsing and the validated [`samplesheet::Sample`]
//!   model, with all row problems collected before failing.
//! - [`stages`]: the fixed stage ordering, assembler selection, and
//!   [`stages::StagePolicy`] resolution from skip flags.
//! - [`registry`]: tools, resource profiles, and per-run overrides.
//! - [`tools`]: per-tool job constructors (argument shapes and artifact
//!   naming).
//! - [`graph`]: the job/artifact graph and its structural validation.
//! - [`builder`]: graph shape — read chains, co-assembly grouping,
//!   fan-out and fan-in across enabled stages.
//! - [`binder`]: attaching registry resource profiles to built jobs.
//! - [`catalogs`]: transformation, replica, and site catalog documents.
//! - [`serialize`]: workflow document assembly and YAML/JSON emission.
//! - [`telemetry`]: tracing subscriber setup for the CLI.
//!
//! ## Quickstart
//!
//! ```
//! use magplan::samplesheet::Sample;
//! use magplan::serialize::OutputFormat;
//! use magplan::{PlanConfig, plan};
//!
//! let samples = vec![
//!     Sample::paired("s1", "/data/s1_R1.fastq.gz", "/data/s1_R2.fastq.gz", Some("g1")),
//!     Sample::paired("s2", "/data/s2_R1.fastq.gz", "/data/s2_R2.fastq.gz", Some("g1")),
//! ];
//! let description = plan(&samples, &PlanConfig::new("demo-run"))?;
//! let documents = description.render(OutputFormat::Yaml)?;
//! assert_eq!(documents.len(), 4);
//! # Ok::<(), magplan::PlanError>(())
//! ```

pub mod binder;
pub mod builder;
pub mod catalogs;
pub mod graph;
pub mod registry;
pub mod samplesheet;
pub mod serialize;
pub mod stages;
pub mod telemetry;
pub mod tools;

use miette::Diagnostic;
use thiserror::Error;

use crate::builder::{BuildError, GraphBuilder};
use crate::catalogs::SiteConfig;
use crate::registry::{RegistryError, ResourceProfile, Tool, ToolRegistry};
use crate::samplesheet::Sample;
use crate::serialize::{SerializeError, WorkflowDescription};
use crate::stages::{Assembler, SkipFlags, StagePolicy};

/// Everything configurable about one planning run.
#[derive(Clone, Debug)]
pub struct PlanConfig {
    pub workflow_name: String,
    pub assembler: Assembler,
    pub skips: SkipFlags,
    /// Per-run resource overrides, applied over the registry defaults.
    pub resource_overrides: Vec<(Tool, ResourceProfile)>,
    pub checkm2_db: Option<String>,
    pub gtdbtk_db: Option<String>,
    pub site: SiteConfig,
}

impl PlanConfig {
    /// Defaults: MEGAHIT, every stage enabled, stock resource profiles,
    /// condorpool execution with output under `mag-output`.
    #[must_use]
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            assembler: Assembler::default(),
            skips: SkipFlags::default(),
            resource_overrides: Vec::new(),
            checkm2_db: None,
            gtdbtk_db: None,
            site: SiteConfig::new("condorpool", "mag-output"),
        }
    }
}

/// Plan one run end to end: resolve the policy, build the registry,
/// construct and validate the graph, bind resources, and assemble the
/// output documents.
pub fn plan(samples: &[Sample], config: &PlanConfig) -> Result<WorkflowDescription, PlanError> {
    let policy = StagePolicy::resolve(&config.skips);

    let mut registry = ToolRegistry::defaults();
    for (tool, profile) in &config.resource_overrides {
        registry = registry.with_profile_override(*tool, *profile)?;
    }
    registry.ensure_stages(&policy, config.assembler)?;

    let mut builder = GraphBuilder::new(&config.workflow_name)
        .with_policy(policy)
        .with_assembler(config.assembler);
    if let Some(db) = &config.checkm2_db {
        builder = builder.with_checkm2_db(db);
    }
    if let Some(db) = &config.gtdbtk_db {
        builder = builder.with_gtdbtk_db(db);
    }

    let graph = builder.build(samples)?;
    let graph = binder::bind(graph, &registry)?;
    Ok(WorkflowDescription::new(&graph, &registry, &config.site)?)
}

/// Any failure along the planning pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Serialize(#[from] SerializeError),
}
