//! Static tool registry: resource profiles and executable references.
//!
//! Every job in a constructed graph names a [`Tool`]; the registry maps
//! each tool to its [`ResourceProfile`] and wrapper executable. The
//! registry is built once per run (defaults plus per-run overrides) and is
//! read-only afterwards — graph construction consults it, never mutates it.
//! A tool missing from the registry is a fatal configuration error, not a
//! silent default.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::stages::{Assembler, Stage, StagePolicy};

/// Identifier of an external tool wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Fastqc,
    Fastp,
    Megahit,
    Spades,
    Quast,
    Prodigal,
    Metabat2,
    Checkm2,
    Gtdbtk,
    Prokka,
    Multiqc,
}

impl Tool {
    /// Every known tool, in registry order.
    pub const ALL: [Tool; 11] = [
        Tool::Fastqc,
        Tool::Fastp,
        Tool::Megahit,
        Tool::Spades,
        Tool::Quast,
        Tool::Prodigal,
        Tool::Metabat2,
        Tool::Checkm2,
        Tool::Gtdbtk,
        Tool::Prokka,
        Tool::Multiqc,
    ];

    /// Lowercase wire identifier, matching the wrapper script name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Fastqc => "fastqc",
            Tool::Fastp => "fastp",
            Tool::Megahit => "megahit",
            Tool::Spades => "spades",
            Tool::Quast => "quast",
            Tool::Prodigal => "prodigal",
            Tool::Metabat2 => "metabat2",
            Tool::Checkm2 => "checkm2",
            Tool::Gtdbtk => "gtdbtk",
            Tool::Prokka => "prokka",
            Tool::Multiqc => "multiqc",
        }
    }

    /// Parse a lowercase wire identifier back into a tool.
    #[must_use]
    pub fn parse(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The tool backing a given stage.
///
/// The assembler choice selects which tool identifier backs the assembly
/// stage; every other stage has a fixed tool. Binning runs two jobs (depth
/// summarization plus MetaBAT2 proper) but both use the metabat2 wrapper.
#[must_use]
pub fn stage_tool(stage: Stage, assembler: Assembler) -> Tool {
    match stage {
        Stage::QualityControl => Tool::Fastqc,
        Stage::Trimming => Tool::Fastp,
        Stage::Assembly => match assembler {
            Assembler::Megahit => Tool::Megahit,
            Assembler::Spades => Tool::Spades,
        },
        Stage::AssemblyQc => Tool::Quast,
        Stage::GenePrediction => Tool::Prodigal,
        Stage::Binning => Tool::Metabat2,
        Stage::BinQuality => Tool::Checkm2,
        Stage::Taxonomy => Tool::Gtdbtk,
        Stage::Annotation => Tool::Prokka,
        Stage::Reporting => Tool::Multiqc,
    }
}

/// Resource requirement for one tool invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Peak resident memory, in megabytes.
    pub memory_mb: u64,
    /// CPU cores requested.
    pub cores: u32,
    /// Wall-time hint in minutes. A hint for the scheduler, never enforced
    /// by the planner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walltime_min: Option<u32>,
}

impl ResourceProfile {
    #[must_use]
    pub fn new(memory_mb: u64, cores: u32, walltime_min: u32) -> Self {
        Self {
            memory_mb,
            cores,
            walltime_min: Some(walltime_min),
        }
    }
}

/// Registry entry: resource profile plus executable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolEntry {
    pub profile: ResourceProfile,
    /// Physical file name of the wrapper executable (inside the container).
    pub pfn: String,
}

/// Read-only mapping from [`Tool`] to its registry entry.
#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    entries: FxHashMap<Tool, ToolEntry>,
}

impl ToolRegistry {
    /// Empty registry. Useful for exercising unregistered-tool handling.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the stock profile for every known tool.
    #[must_use]
    pub fn defaults() -> Self {
        let mut registry = Self::empty();
        for tool in Tool::ALL {
            registry.insert(tool, default_entry(tool));
        }
        registry
    }

    /// Register or replace a tool entry.
    pub fn insert(&mut self, tool: Tool, entry: ToolEntry) {
        self.entries.insert(tool, entry);
    }

    /// Apply a per-run resource override, keeping the executable reference.
    ///
    /// Overrides take precedence over the registry default. Overriding a
    /// tool that is not registered is an error, not an implicit insert.
    pub fn with_profile_override(
        mut self,
        tool: Tool,
        profile: ResourceProfile,
    ) -> Result<Self, RegistryError> {
        let entry = self
            .entries
            .get_mut(&tool)
            .ok_or(RegistryError::UnregisteredTool { tool })?;
        tracing::debug!(%tool, ?profile, "resource profile overridden");
        entry.profile = profile;
        Ok(self)
    }

    /// Look up a tool's entry.
    pub fn lookup(&self, tool: Tool) -> Result<&ToolEntry, RegistryError> {
        self.entries
            .get(&tool)
            .ok_or(RegistryError::UnregisteredTool { tool })
    }

    /// Verify every enabled stage's tool is registered.
    ///
    /// Called before graph construction so a misconfigured registry fails
    /// up front instead of midway through building.
    pub fn ensure_stages(
        &self,
        policy: &StagePolicy,
        assembler: Assembler,
    ) -> Result<(), RegistryError> {
        for stage in policy.enabled_stages() {
            self.lookup(stage_tool(stage, assembler))?;
        }
        Ok(())
    }
}

fn default_entry(tool: Tool) -> ToolEntry {
    // Stock profiles: memory/cores sized for typical short-read metagenome
    // runs, wall-time hints generous enough for the reference test data.
    let profile = match tool {
        Tool::Fastqc => ResourceProfile::new(2 * 1024, 2, 30),
        Tool::Fastp => ResourceProfile::new(4 * 1024, 4, 60),
        Tool::Megahit => ResourceProfile::new(16 * 1024, 8, 720),
        Tool::Spades => ResourceProfile::new(32 * 1024, 16, 1440),
        Tool::Quast => ResourceProfile::new(4 * 1024, 4, 30),
        Tool::Prodigal => ResourceProfile::new(4 * 1024, 1, 60),
        Tool::Metabat2 => ResourceProfile::new(8 * 1024, 4, 120),
        Tool::Checkm2 => ResourceProfile::new(16 * 1024, 8, 240),
        Tool::Gtdbtk => ResourceProfile::new(64 * 1024, 8, 720),
        Tool::Prokka => ResourceProfile::new(8 * 1024, 4, 240),
        Tool::Multiqc => ResourceProfile::new(4 * 1024, 2, 30),
    };
    ToolEntry {
        profile,
        pfn: format!("/usr/local/bin/{}.sh", tool.as_str()),
    }
}

/// Errors from tool registry lookups.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    /// A stage's tool has no registry entry.
    #[error("tool '{tool}' is not registered")]
    #[diagnostic(
        code(magplan::registry::unregistered_tool),
        help("Register the tool (or its resource profile) before building the graph.")
    )]
    UnregisteredTool { tool: Tool },
}
