//! Workflow description emission.
//!
//! Turns a bound graph into the 5.0 workflow document plus its three
//! catalogs and writes them as YAML or JSON. Everything serialized here
//! comes from `Vec`s held in construction order, so two descriptions of
//! equal graphs are byte-identical.

use miette::Diagnostic;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalogs::{
    ReplicaCatalog, SCHEMA_VERSION, SiteCatalog, SiteConfig, TransformationCatalog,
};
use crate::graph::{Graph, Job};
use crate::registry::{RegistryError, ToolRegistry};

/// On-disk encoding of the emitted documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yml",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// The top-level workflow document.
#[derive(Debug, Serialize)]
pub struct WorkflowDoc {
    pub pegasus: &'static str,
    pub name: String,
    pub jobs: Vec<JobDoc>,
    #[serde(rename = "jobDependencies", skip_serializing_if = "Vec::is_empty")]
    pub job_dependencies: Vec<DependencyDoc>,
}

#[derive(Debug, Serialize)]
pub struct JobDoc {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Transformation name, matching the transformation catalog.
    pub name: String,
    pub id: String,
    pub arguments: Vec<String>,
    pub uses: Vec<UseDoc>,
    pub profiles: JobProfiles,
}

#[derive(Debug, Serialize)]
pub struct UseDoc {
    pub lfn: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "stageOut", skip_serializing_if = "Option::is_none")]
    pub stage_out: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct JobProfiles {
    pub condor: CondorProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pegasus: Option<PegasusProfile>,
}

#[derive(Debug, Serialize)]
pub struct CondorProfile {
    pub request_cpus: String,
    pub request_memory: String,
}

#[derive(Debug, Serialize)]
pub struct PegasusProfile {
    /// Expected runtime in seconds; a scheduler hint only.
    pub runtime: String,
}

/// Parent-to-children dependency record.
#[derive(Debug, Serialize)]
pub struct DependencyDoc {
    pub id: String,
    pub children: Vec<String>,
}

impl WorkflowDoc {
    /// Build the workflow document from a bound graph.
    ///
    /// Every job must carry resources from [`crate::binder::bind`];
    /// an unbound job is rejected rather than emitted without requests.
    pub fn from_graph(graph: &Graph) -> Result<Self, SerializeError> {
        let jobs = graph
            .jobs()
            .iter()
            .map(job_doc)
            .collect::<Result<Vec<_>, _>>()?;

        // Group edges per parent, keeping parent order by first edge and
        // child order as constructed.
        let mut job_dependencies: Vec<DependencyDoc> = Vec::new();
        for (parent, child) in graph.edges() {
            match job_dependencies.iter_mut().find(|d| d.id == parent) {
                Some(doc) => doc.children.push(child),
                None => job_dependencies.push(DependencyDoc {
                    id: parent,
                    children: vec![child],
                }),
            }
        }

        Ok(Self {
            pegasus: SCHEMA_VERSION,
            name: graph.name().to_owned(),
            jobs,
            job_dependencies,
        })
    }
}

fn job_doc(job: &Job) -> Result<JobDoc, SerializeError> {
    let resources = job.resources.ok_or_else(|| SerializeError::UnboundJob {
        job_id: job.id.clone(),
    })?;

    let mut uses: Vec<UseDoc> = job
        .inputs
        .iter()
        .map(|lfn| UseDoc {
            lfn: lfn.clone(),
            kind: "input",
            stage_out: None,
        })
        .collect();
    uses.extend(job.outputs.iter().map(|out| UseDoc {
        lfn: out.lfn.clone(),
        kind: "output",
        stage_out: Some(out.stage_out),
    }));

    Ok(JobDoc {
        kind: "job",
        name: job.tool.as_str().to_owned(),
        id: job.id.clone(),
        arguments: job.args.clone(),
        uses,
        profiles: JobProfiles {
            condor: CondorProfile {
                request_cpus: resources.cores.to_string(),
                request_memory: format!("{}MB", resources.memory_mb),
            },
            pegasus: resources.walltime_min.map(|minutes| PegasusProfile {
                runtime: (u64::from(minutes) * 60).to_string(),
            }),
        },
    })
}

/// The complete serializable description of one run: workflow plus
/// catalogs.
#[derive(Debug)]
pub struct WorkflowDescription {
    pub workflow: WorkflowDoc,
    pub transformations: TransformationCatalog,
    pub replicas: ReplicaCatalog,
    pub sites: SiteCatalog,
}

impl WorkflowDescription {
    /// Assemble all four documents from a bound graph.
    pub fn new(
        graph: &Graph,
        registry: &ToolRegistry,
        site: &SiteConfig,
    ) -> Result<Self, SerializeError> {
        Ok(Self {
            workflow: WorkflowDoc::from_graph(graph)?,
            transformations: TransformationCatalog::from_graph(graph, registry, site)?,
            replicas: ReplicaCatalog::from_graph(graph),
            sites: SiteCatalog::new(site),
        })
    }

    /// Render each document to a string, paired with its file name.
    pub fn render(&self, format: OutputFormat) -> Result<Vec<(String, String)>, SerializeError> {
        let ext = format.extension();
        Ok(vec![
            (format!("workflow.{ext}"), render_doc(&self.workflow, format)?),
            (
                format!("transformations.{ext}"),
                render_doc(&self.transformations, format)?,
            ),
            (format!("replicas.{ext}"), render_doc(&self.replicas, format)?),
            (format!("sites.{ext}"), render_doc(&self.sites, format)?),
        ])
    }

    /// Write all four documents into `dir`, creating it if needed.
    /// Returns the written paths in emission order.
    pub fn write_to(
        &self,
        dir: &Path,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>, SerializeError> {
        self.write_to_named(dir, &format!("workflow.{}", format.extension()), format)
    }

    /// Like [`write_to`](Self::write_to), but with a caller-chosen file
    /// name for the workflow document. Catalog names are fixed.
    pub fn write_to_named(
        &self,
        dir: &Path,
        workflow_filename: &str,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>, SerializeError> {
        fs::create_dir_all(dir)?;
        let mut documents = self.render(format)?;
        documents[0].0 = workflow_filename.to_owned();
        let mut written = Vec::new();
        for (filename, contents) in documents {
            let path = dir.join(filename);
            fs::write(&path, contents)?;
            tracing::debug!(path = %path.display(), "document written");
            written.push(path);
        }
        Ok(written)
    }
}

fn render_doc<T: Serialize>(doc: &T, format: OutputFormat) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(doc)?),
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(doc)?;
            rendered.push('\n');
            Ok(rendered)
        }
    }
}

/// Errors from workflow description emission.
#[derive(Debug, Error, Diagnostic)]
pub enum SerializeError {
    /// A job reached serialization without bound resources.
    #[error("job '{job_id}' has no bound resource profile")]
    #[diagnostic(
        code(magplan::serialize::unbound_job),
        help("Run the resource binder over the graph before serializing.")
    )]
    UnboundJob { job_id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to write workflow description")]
    #[diagnostic(code(magplan::serialize::io))]
    Io(#[from] std::io::Error),

    #[error("failed to encode YAML")]
    #[diagnostic(code(magplan::serialize::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode JSON")]
    #[diagnostic(code(magplan::serialize::json))]
    Json(#[from] serde_json::Error),
}
