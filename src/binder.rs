//! Resource binding: attach registry profiles to constructed jobs.
//!
//! Binding is a separate pass after graph construction so that graph shape
//! never depends on resource configuration. Serialization refuses unbound
//! jobs, which keeps "built but never bound" a loud failure instead of a
//! workflow with missing resource requests.

use crate::graph::Graph;
use crate::registry::{RegistryError, ToolRegistry};

/// Attach each job's resource profile from the registry.
///
/// Fails on the first job whose tool has no registry entry. Binding is
/// idempotent; re-binding with an updated registry overwrites previously
/// attached profiles.
pub fn bind(mut graph: Graph, registry: &ToolRegistry) -> Result<Graph, RegistryError> {
    for job in graph.jobs_mut() {
        let entry = registry.lookup(job.tool)?;
        job.resources = Some(entry.profile);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::registry::{ResourceProfile, Tool};
    use crate::samplesheet::Sample;

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
    fn binding_attaches_a_profile_to_every_job() {
        let graph = bind(sample_graph(), &ToolRegistry::defaults()).unwrap();
        for job in graph.jobs() {
            let resources = job.resources.as_ref().unwrap_or_else(|| {
                panic!("job '{}' left unbound", job.id);
            });
            assert!(resources.memory_mb > 0);
        }
    }

    #[test]
    fn empty_registry_fails_on_the_first_job() {
        let err = bind(sample_graph(), &ToolRegistry::empty()).unwrap_err();
        assert!(matches!(err, RegistryError::UnregisteredTool { .. }));
    }

    #[test]
    fn rebinding_picks_up_profile_overrides() {
        let graph = bind(sample_graph(), &ToolRegistry::defaults()).unwrap();
        let registry = ToolRegistry::defaults()
            .with_profile_override(Tool::Megahit, ResourceProfile::new(64 * 1024, 32, 360))
            .unwrap();
        let graph = bind(graph, &registry).unwrap();
        let assembly = graph.jobs().iter().find(|j| j.tool == Tool::Megahit).unwrap();
        assert_eq!(assembly.resources.unwrap().memory_mb, 64 * 1024);
        assert_eq!(assembly.resources.unwrap().cores, 32);
    }
}
