//! Pipeline stages, assembler selection, and stage policy resolution.
//!
//! The pipeline is a fixed, ordered set of stages. The ordering is the
//! backbone of the whole planner: a stage may only ever depend on stages
//! earlier in [`Stage::ORDER`], which makes every constructed graph acyclic
//! by construction.
//!
//! A [`StagePolicy`] records which stages are enabled for a run. Policies
//! are resolved from user-facing skip flags via [`StagePolicy::resolve`],
//! which also applies the structural implication that disabling binning
//! disables everything that consumes genome bins.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One logical pipeline phase.
///
/// The declaration order is the canonical stage order; dependency edges in
/// a constructed graph only ever point from a later stage back to an
/// earlier one's outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Read-level diagnostics on the raw input (FastQC).
    QualityControl,
    /// Adapter/quality trimming (fastp).
    Trimming,
    /// Contig assembly, one job per co-assembly group.
    Assembly,
    /// Assembly metrics (QUAST).
    AssemblyQc,
    /// ORF calling on contigs (Prodigal).
    GenePrediction,
    /// Contig binning into draft genomes (MetaBAT2).
    Binning,
    /// Bin completeness/contamination (CheckM2).
    BinQuality,
    /// Taxonomic placement of bins (GTDB-Tk).
    Taxonomy,
    /// Functional annotation of bins (Prokka).
    Annotation,
    /// Run-wide report aggregation (MultiQC).
    Reporting,
}

impl Stage {
    /// Canonical stage order, earliest first.
    pub const ORDER: [Stage; 10] = [
        Stage::QualityControl,
        Stage::Trimming,
        Stage::Assembly,
        Stage::AssemblyQc,
        Stage::GenePrediction,
        Stage::Binning,
        Stage::BinQuality,
        Stage::Taxonomy,
        Stage::Annotation,
        Stage::Reporting,
    ];

    /// Position of this stage in [`Stage::ORDER`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Stage::QualityControl => 0,
            Stage::Trimming => 1,
            Stage::Assembly => 2,
            Stage::AssemblyQc => 3,
            Stage::GenePrediction => 4,
            Stage::Binning => 5,
            Stage::BinQuality => 6,
            Stage::Taxonomy => 7,
            Stage::Annotation => 8,
            Stage::Reporting => 9,
        }
    }

    /// The stage this one structurally requires, if any.
    ///
    /// A structural requirement is stronger than mere ordering: the stage
    /// cannot exist in any graph where its requirement is disabled, because
    /// it consumes an artifact only that stage produces. Read-level stages
    /// have no requirement (skipping them re-wires the read chain instead).
    #[must_use]
    pub fn requires(self) -> Option<Stage> {
        match self {
            Stage::AssemblyQc | Stage::GenePrediction | Stage::Binning => Some(Stage::Assembly),
            Stage::BinQuality | Stage::Taxonomy | Stage::Annotation => Some(Stage::Binning),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::QualityControl => "quality-control",
            Stage::Trimming => "trimming",
            Stage::Assembly => "assembly",
            Stage::AssemblyQc => "assembly-qc",
            Stage::GenePrediction => "gene-prediction",
            Stage::Binning => "binning",
            Stage::BinQuality => "bin-quality",
            Stage::Taxonomy => "taxonomy",
            Stage::Annotation => "annotation",
            Stage::Reporting => "reporting",
        };
        write!(f, "{name}")
    }
}

/// Which assembler backs the assembly stage.
///
/// This is a policy parameter, not a stage toggle: it selects the tool
/// identifier behind the assembly stage without changing graph shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Assembler {
    #[default]
    Megahit,
    Spades,
}

impl fmt::Display for Assembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assembler::Megahit => write!(f, "megahit"),
            Assembler::Spades => write!(f, "spades"),
        }
    }
}

/// User-facing stage skip flags, mirroring the CLI surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipFlags {
    pub quality_control: bool,
    pub binning: bool,
    pub taxonomy: bool,
    pub annotation: bool,
}

/// Ordered mapping from [`Stage`] to its enabled state for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagePolicy {
    enabled: [bool; Stage::ORDER.len()],
}

impl Default for StagePolicy {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl StagePolicy {
    /// Policy with every stage enabled.
    #[must_use]
    pub fn all_enabled() -> Self {
        Self {
            enabled: [true; Stage::ORDER.len()],
        }
    }

    /// Resolve a policy from skip flags.
    ///
    /// All stages default to enabled. Disabling binning implicitly disables
    /// bin-quality, taxonomy, and annotation, since all three consume the
    /// genome-bin artifact that only binning produces.
    #[must_use]
    pub fn resolve(flags: &SkipFlags) -> Self {
        let mut policy = Self::all_enabled();
        if flags.quality_control {
            policy.set_enabled(Stage::QualityControl, false);
        }
        if flags.taxonomy {
            policy.set_enabled(Stage::Taxonomy, false);
        }
        if flags.annotation {
            policy.set_enabled(Stage::Annotation, false);
        }
        if flags.binning {
            policy.set_enabled(Stage::Binning, false);
            for dependent in [Stage::BinQuality, Stage::Taxonomy, Stage::Annotation] {
                if policy.is_enabled(dependent) {
                    tracing::debug!(stage = %dependent, "disabled implicitly by skip-binning");
                    policy.set_enabled(dependent, false);
                }
            }
        }
        policy
    }

    /// Whether a stage is enabled under this policy.
    #[must_use]
    pub fn is_enabled(&self, stage: Stage) -> bool {
        self.enabled[stage.index()]
    }

    /// Enable or disable a single stage.
    ///
    /// No implication is applied here; callers composing policies by hand
    /// are expected to run [`validate`](Self::validate) afterwards.
    pub fn set_enabled(&mut self, stage: Stage, enabled: bool) {
        self.enabled[stage.index()] = enabled;
    }

    /// Enabled stages, in canonical order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ORDER
            .into_iter()
            .filter(move |stage| self.is_enabled(*stage))
    }

    /// Check structural consistency.
    ///
    /// Fails with [`PolicyError::Inconsistent`] when an enabled stage
    /// structurally requires a disabled one (for example annotation enabled
    /// while binning is skipped). Such a combination is an error, never a
    /// silent disable.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for stage in self.enabled_stages() {
            if let Some(required) = stage.requires()
                && !self.is_enabled(required)
            {
                return Err(PolicyError::Inconsistent {
                    stage,
                    requires: required,
                });
            }
        }
        Ok(())
    }
}

/// Errors from stage policy validation.
#[derive(Debug, Error, Diagnostic)]
pub enum PolicyError {
    /// An enabled stage structurally depends on a disabled upstream stage.
    #[error("stage '{stage}' is enabled but requires disabled stage '{requires}'")]
    #[diagnostic(
        code(magplan::stages::inconsistent),
        help("Either re-enable the required stage or skip the dependent stage as well.")
    )]
    Inconsistent { stage: Stage, requires: Stage },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_total_and_stable() {
        for (i, stage) in Stage::ORDER.into_iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert!(Stage::QualityControl.index() < Stage::Reporting.index());
    }

    #[test]
    fn requirements_point_strictly_upstream() {
        for stage in Stage::ORDER {
            if let Some(required) = stage.requires() {
                assert!(required.index() < stage.index());
            }
        }
    }

    #[test]
    fn default_policy_enables_everything() {
        let policy = StagePolicy::resolve(&SkipFlags::default());
        for stage in Stage::ORDER {
            assert!(policy.is_enabled(stage), "{stage} should default enabled");
        }
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn skip_binning_disables_all_bin_consumers() {
        let policy = StagePolicy::resolve(&SkipFlags {
            binning: true,
            ..Default::default()
        });
        assert!(!policy.is_enabled(Stage::Binning));
        assert!(!policy.is_enabled(Stage::BinQuality));
        assert!(!policy.is_enabled(Stage::Taxonomy));
        assert!(!policy.is_enabled(Stage::Annotation));
        assert!(policy.is_enabled(Stage::Assembly));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn skip_binning_wins_over_individual_flags() {
        // Any combination of the per-stage flags together with skip-binning
        // still yields a consistent, fully-disabled bin chain.
        for taxonomy in [false, true] {
            for annotation in [false, true] {
                let policy = StagePolicy::resolve(&SkipFlags {
                    binning: true,
                    taxonomy,
                    annotation,
                    ..Default::default()
                });
                assert!(!policy.is_enabled(Stage::Taxonomy));
                assert!(!policy.is_enabled(Stage::Annotation));
                assert!(policy.validate().is_ok());
            }
        }
    }

    #[test]
    fn hand_built_inconsistency_is_rejected() {
        let mut policy = StagePolicy::all_enabled();
        policy.set_enabled(Stage::Binning, false);
        // Annotation left enabled: structurally impossible.
        let err = policy.validate().unwrap_err();
        match err {
            PolicyError::Inconsistent { stage, requires } => {
                assert_eq!(stage, Stage::BinQuality);
                assert_eq!(requires, Stage::Binning);
            }
        }
    }

    #[test]
    fn disabled_assembly_requires_disabling_consumers() {
        let mut policy = StagePolicy::all_enabled();
        policy.set_enabled(Stage::Assembly, false);
        assert!(policy.validate().is_err());
        for stage in [
            Stage::AssemblyQc,
            Stage::GenePrediction,
            Stage::Binning,
            Stage::BinQuality,
            Stage::Taxonomy,
            Stage::Annotation,
        ] {
            policy.set_enabled(stage, false);
        }
        assert!(policy.validate().is_ok());
    }
}
