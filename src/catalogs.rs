//! Transformation, replica, and site catalogs.
//!
//! The workflow description names jobs by tool and artifacts by logical
//! file name; the catalogs supply the bindings an execution engine needs
//! to resolve those names. All three are plain serializable documents in
//! the 5.0 catalog schema, derived deterministically from the graph and
//! the run configuration.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::graph::Graph;
use crate::registry::{RegistryError, ToolRegistry};

/// Schema version stamped on every emitted document.
pub const SCHEMA_VERSION: &str = "5.0";

/// Container every tool wrapper runs inside.
pub const CONTAINER_NAME: &str = "mag_container";

/// Default container image when the run does not supply one.
pub const DEFAULT_CONTAINER_IMAGE: &str = "docker://kthare10/mag-workflow:latest";

/// Per-run site configuration.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Site name jobs are scheduled onto.
    pub execution_site: String,
    /// Root for the run's scratch and output directories.
    pub output_dir: PathBuf,
    /// Container image reference.
    pub container_image: String,
}

impl SiteConfig {
    #[must_use]
    pub fn new(execution_site: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            execution_site: execution_site.into(),
            output_dir: output_dir.into(),
            container_image: DEFAULT_CONTAINER_IMAGE.to_owned(),
        }
    }

    #[must_use]
    pub fn with_container_image(mut self, image: impl Into<String>) -> Self {
        self.container_image = image.into();
        self
    }
}

/// Resolve a user-supplied read location to a physical file name.
///
/// Anything carrying a URL scheme passes through verbatim; bare paths are
/// absolutized against the working directory and given a `file://` scheme.
pub fn resolve_pfn(path: &str) -> io::Result<String> {
    if path.contains("://") {
        return Ok(path.to_owned());
    }
    let absolute = std::path::absolute(Path::new(path))?;
    Ok(format!("file://{}", absolute.display()))
}

/// Transformation catalog: one entry per tool the graph actually uses.
#[derive(Debug, Serialize)]
pub struct TransformationCatalog {
    pub pegasus: &'static str,
    pub transformations: Vec<Transformation>,
    pub containers: Vec<Container>,
}

#[derive(Debug, Serialize)]
pub struct Transformation {
    pub name: String,
    pub sites: Vec<TransformationSite>,
}

#[derive(Debug, Serialize)]
pub struct TransformationSite {
    pub name: String,
    pub pfn: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub container: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Container {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image: String,
    #[serde(rename = "image.site")]
    pub image_site: &'static str,
}

impl TransformationCatalog {
    /// Entries for the graph's tools in first-use order, so the catalog is
    /// as deterministic as the graph itself and never lists unused tools.
    pub fn from_graph(
        graph: &Graph,
        registry: &ToolRegistry,
        site: &SiteConfig,
    ) -> Result<Self, RegistryError> {
        let mut transformations = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();
        for job in graph.jobs() {
            if !seen.insert(job.tool) {
                continue;
            }
            let entry = registry.lookup(job.tool)?;
            transformations.push(Transformation {
                name: job.tool.as_str().to_owned(),
                sites: vec![TransformationSite {
                    name: site.execution_site.clone(),
                    pfn: entry.pfn.clone(),
                    kind: "installed",
                    container: CONTAINER_NAME,
                }],
            });
        }
        Ok(Self {
            pegasus: SCHEMA_VERSION,
            transformations,
            containers: vec![Container {
                name: CONTAINER_NAME,
                kind: "singularity",
                image: site.container_image.clone(),
                image_site: "docker_hub",
            }],
        })
    }
}

/// Replica catalog: physical locations of the externally supplied inputs.
#[derive(Debug, Serialize)]
pub struct ReplicaCatalog {
    pub pegasus: &'static str,
    pub replicas: Vec<Replica>,
}

#[derive(Debug, Serialize)]
pub struct Replica {
    pub lfn: String,
    pub pfns: Vec<ReplicaPfn>,
}

#[derive(Debug, Serialize)]
pub struct ReplicaPfn {
    pub site: &'static str,
    pub pfn: String,
}

impl ReplicaCatalog {
    /// One replica per external input, in registration order.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let replicas = graph
            .external_inputs()
            .iter()
            .map(|input| Replica {
                lfn: input.lfn.clone(),
                pfns: vec![ReplicaPfn {
                    site: "local",
                    pfn: input.pfn.clone(),
                }],
            })
            .collect();
        Self {
            pegasus: SCHEMA_VERSION,
            replicas,
        }
    }
}

/// Site catalog: the local staging site plus the execution site.
#[derive(Debug, Serialize)]
pub struct SiteCatalog {
    pub pegasus: &'static str,
    pub sites: Vec<Site>,
}

#[derive(Debug, Serialize)]
pub struct Site {
    pub name: String,
    pub arch: &'static str,
    #[serde(rename = "os.type")]
    pub os_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<&'static str, BTreeMap<&'static str, String>>,
}

#[derive(Debug, Serialize)]
pub struct Directory {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path: String,
    #[serde(rename = "fileServers")]
    pub file_servers: Vec<FileServer>,
}

#[derive(Debug, Serialize)]
pub struct FileServer {
    pub url: String,
    pub operation: &'static str,
}

impl SiteCatalog {
    /// Local site with scratch and storage under the run's output
    /// directory, plus the execution site with its scheduler profiles.
    #[must_use]
    pub fn new(config: &SiteConfig) -> Self {
        let scratch = config.output_dir.join("scratch");
        let storage = config.output_dir.join("output");

        let local = Site {
            name: "local".to_owned(),
            arch: "x86_64",
            os_type: "linux",
            directories: vec![
                directory("sharedScratch", &scratch),
                directory("localStorage", &storage),
            ],
            profiles: BTreeMap::new(),
        };

        let mut profiles = BTreeMap::new();
        profiles.insert("condor", BTreeMap::from([("universe", "vanilla".to_owned())]));
        profiles.insert("pegasus", BTreeMap::from([("style", "condor".to_owned())]));
        let execution = Site {
            name: config.execution_site.clone(),
            arch: "x86_64",
            os_type: "linux",
            directories: Vec::new(),
            profiles,
        };

        Self {
            pegasus: SCHEMA_VERSION,
            sites: vec![local, execution],
        }
    }
}

fn directory(kind: &'static str, path: &Path) -> Directory {
    Directory {
        kind,
        path: path.display().to_string(),
        file_servers: vec![FileServer {
            url: format!("file://{}", path.display()),
            operation: "all",
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::samplesheet::Sample;
    use crate::stages::{SkipFlags, StagePolicy};

    fn sample_graph() -> Graph {
        GraphBuilder::new("t")
            .build(&[Sample::paired(
                "s1",
                "/data/s1_R1.fastq.gz",
                "/data/s1_R2.fastq.gz",
                None,
            )])
            .unwrap()
    }

    #[test]
    fn resolve_pfn_keeps_urls_and_absolutizes_paths() {
        assert_eq!(
            resolve_pfn("https://example.org/x.fq.gz").unwrap(),
            "https://example.org/x.fq.gz"
        );
        assert_eq!(
            resolve_pfn("/data/x.fq.gz").unwrap(),
            "file:///data/x.fq.gz"
        );
        let relative = resolve_pfn("x.fq.gz").unwrap();
        assert!(relative.starts_with("file:///"));
        assert!(relative.ends_with("/x.fq.gz"));
    }

    #[test]
    fn transformation_catalog_lists_tools_in_first_use_order() {
        let graph = sample_graph();
        let site = SiteConfig::new("condorpool", "/runs/t");
        let catalog =
            TransformationCatalog::from_graph(&graph, &ToolRegistry::defaults(), &site).unwrap();
        let names: Vec<_> = catalog
            .transformations
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "fastqc", "fastp", "megahit", "quast", "prodigal", "metabat2", "checkm2",
                "gtdbtk", "prokka", "multiqc",
            ]
        );
        assert_eq!(catalog.transformations[0].sites[0].name, "condorpool");
        assert_eq!(catalog.containers.len(), 1);
        assert_eq!(catalog.containers[0].image, DEFAULT_CONTAINER_IMAGE);
    }

    #[test]
    fn unused_tools_never_appear_in_the_catalog() {
        let policy = StagePolicy::resolve(&SkipFlags {
            binning: true,
            ..Default::default()
        });
        let graph = GraphBuilder::new("t")
            .with_policy(policy)
            .build(&[Sample::single("s1", "/data/s1_R1.fastq.gz", None)])
            .unwrap();
        let site = SiteConfig::new("condorpool", "/runs/t");
        let catalog =
            TransformationCatalog::from_graph(&graph, &ToolRegistry::defaults(), &site).unwrap();
        assert!(
            catalog
                .transformations
                .iter()
                .all(|t| !["metabat2", "checkm2", "gtdbtk", "prokka"].contains(&t.name.as_str()))
        );
    }

    #[test]
    fn replica_catalog_mirrors_external_inputs() {
        let graph = sample_graph();
        let catalog = ReplicaCatalog::from_graph(&graph);
        assert_eq!(catalog.replicas.len(), 2);
        assert_eq!(catalog.replicas[0].lfn, "s1_R1.fastq.gz");
        assert_eq!(catalog.replicas[0].pfns[0].pfn, "file:///data/s1_R1.fastq.gz");
    }

    #[test]
    fn site_catalog_places_directories_under_the_output_dir() {
        let catalog = SiteCatalog::new(&SiteConfig::new("condorpool", "/runs/t"));
        assert_eq!(catalog.sites.len(), 2);
        let local = &catalog.sites[0];
        assert_eq!(local.name, "local");
        assert_eq!(local.directories[0].path, "/runs/t/scratch");
        assert_eq!(local.directories[1].path, "/runs/t/output");
        let execution = &catalog.sites[1];
        assert_eq!(execution.name, "condorpool");
        assert!(execution.profiles.contains_key("condor"));
    }
}
