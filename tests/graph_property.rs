//! Property-based checks over randomly shaped sample sets and skip
//! combinations: whatever the inputs, a built graph holds its structural
//! invariants.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use magplan::builder::GraphBuilder;
use magplan::graph::Graph;
use magplan::samplesheet::Sample;
use magplan::stages::{SkipFlags, Stage, StagePolicy};

/// Up to five samples with unique ids, random endness, and random
/// assignment into up to three co-assembly groups.
fn sample_set() -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::hash_set("[a-z][a-z0-9]{2,6}", 1..=5)
        .prop_flat_map(|ids| {
            let ids: Vec<String> = ids.into_iter().collect();
            let len = ids.len();
            (
                Just(ids),
                prop::collection::vec((0..3usize, any::<bool>()), len),
            )
        })
        .prop_map(|(ids, shapes)| {
            ids.into_iter()
                .zip(shapes)
                .map(|(id, (group, is_paired))| {
                    let group = format!("g{group}");
                    if is_paired {
                        Sample::paired(
                            &id,
                            format!("/data/{id}_R1.fastq.gz"),
                            format!("/data/{id}_R2.fastq.gz"),
                            Some(&group),
                        )
                    } else {
                        Sample::single(&id, format!("/data/{id}_R1.fastq.gz"), Some(&group))
                    }
                })
                .collect()
        })
}

fn skip_flags() -> impl Strategy<Value = SkipFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(quality_control, binning, taxonomy, annotation)| SkipFlags {
            quality_control,
            binning,
            taxonomy,
            annotation,
        },
    )
}

fn build(samples: &[Sample], flags: &SkipFlags) -> Graph {
    GraphBuilder::new("prop-run")
        .with_policy(StagePolicy::resolve(flags))
        .build(samples)
        .expect("resolved policies always build")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn any_resolved_policy_builds_a_valid_graph(
        samples in sample_set(),
        flags in skip_flags(),
    ) {
        let graph = build(&samples, &flags);

        let mut ids = HashSet::new();
        for job in graph.jobs() {
            prop_assert!(ids.insert(job.id.clone()), "duplicate job id {}", job.id);
        }

        // Every input resolves to a producer or an external read file.
        for job in graph.jobs() {
            for lfn in &job.inputs {
                prop_assert!(
                    graph.producer_of(lfn).is_some() || graph.is_external(lfn),
                    "job {} has dangling input {lfn}",
                    job.id
                );
            }
        }
    }

    #[test]
    fn exactly_one_assembly_job_per_group(
        samples in sample_set(),
        flags in skip_flags(),
    ) {
        let graph = build(&samples, &flags);
        let groups: HashSet<&str> = samples.iter().map(|s| s.group.as_str()).collect();
        let assemblies = graph
            .jobs()
            .iter()
            .filter(|j| j.stage == Stage::Assembly)
            .count();
        prop_assert_eq!(assemblies, groups.len());
    }

    #[test]
    fn edges_never_point_against_stage_order(
        samples in sample_set(),
        flags in skip_flags(),
    ) {
        let graph = build(&samples, &flags);
        let stage_of: HashMap<&str, Stage> = graph
            .jobs()
            .iter()
            .map(|j| (j.id.as_str(), j.stage))
            .collect();
        for (parent, child) in graph.edges() {
            prop_assert!(
                stage_of[parent.as_str()].index() <= stage_of[child.as_str()].index(),
                "edge {parent} -> {child} points upstream"
            );
        }
    }

    #[test]
    fn skipped_stages_leave_no_jobs_behind(
        samples in sample_set(),
        flags in skip_flags(),
    ) {
        let graph = build(&samples, &flags);
        let present: HashSet<Stage> = graph.jobs().iter().map(|j| j.stage).collect();
        if flags.quality_control {
            prop_assert!(!present.contains(&Stage::QualityControl));
        }
        if flags.binning {
            for stage in [Stage::Binning, Stage::BinQuality, Stage::Taxonomy, Stage::Annotation] {
                prop_assert!(!present.contains(&stage), "{stage} survived skip-binning");
            }
        }
        if flags.taxonomy {
            prop_assert!(!present.contains(&Stage::Taxonomy));
        }
        if flags.annotation {
            prop_assert!(!present.contains(&Stage::Annotation));
        }
    }

    #[test]
    fn reporting_consumes_exactly_the_report_artifacts(
        samples in sample_set(),
        flags in skip_flags(),
    ) {
        let graph = build(&samples, &flags);
        let multiqc = graph
            .jobs()
            .iter()
            .find(|j| j.stage == Stage::Reporting)
            .expect("reporting is never skipped here");
        prop_assert_eq!(&multiqc.inputs, &graph.report_artifacts());
    }
}
