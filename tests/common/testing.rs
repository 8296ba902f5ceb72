//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use magplan::samplesheet::Sample;
use magplan::serialize::WorkflowDescription;
use magplan::{PlanConfig, plan};

pub fn paired(id: &str, group: Option<&str>) -> Sample {
    Sample::paired(
        id,
        format!("/data/{id}_R1.fastq.gz"),
        format!("/data/{id}_R2.fastq.gz"),
        group,
    )
}

pub fn single(id: &str, group: Option<&str>) -> Sample {
    Sample::single(id, format!("/data/{id}_R1.fastq.gz"), group)
}

/// Two paired-end samples sharing one co-assembly group.
pub fn co_assembly_pair() -> Vec<Sample> {
    vec![paired("s1", Some("g1")), paired("s2", Some("g1"))]
}

/// Plan with stock configuration.
pub fn plan_default(samples: &[Sample]) -> WorkflowDescription {
    plan(samples, &PlanConfig::new("test-run")).expect("planning should succeed")
}
