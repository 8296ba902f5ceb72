use clap::Parser;
use miette::IntoDiagnostic;
use std::path::{Path, PathBuf};

use magplan::catalogs::SiteConfig;
use magplan::registry::{ResourceProfile, Tool};
use magplan::samplesheet::parse_samplesheet;
use magplan::serialize::OutputFormat;
use magplan::stages::{Assembler, SkipFlags};
use magplan::{PlanConfig, plan, telemetry};

/// Plan a MAG pipeline run: samplesheet in, workflow description out.
#[derive(Debug, Parser)]
#[command(name = "magplan", version, about)]
struct Cli {
    /// Samplesheet CSV (sample,fastq_1,fastq_2,group).
    #[arg(long, short = 's', conflicts_with = "test")]
    samplesheet: Option<PathBuf>,

    /// Plan the bundled two-sample test dataset instead of a samplesheet.
    #[arg(long)]
    test: bool,

    /// Workflow name stamped into the emitted documents.
    #[arg(long, default_value = "mag-workflow")]
    name: String,

    /// Directory the documents are written into.
    #[arg(long, short = 'o', default_value = "mag-output")]
    output_dir: PathBuf,

    /// Document encoding.
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Assembler backing the assembly stage.
    #[arg(long, value_enum, default_value_t)]
    assembler: Assembler,

    /// File name for the workflow document (catalog names are fixed).
    #[arg(long)]
    output: Option<String>,

    /// Skip read-level quality control (trimming consumes the raw reads).
    #[arg(long, visible_alias = "skip-fastqc")]
    skip_quality_control: bool,

    /// Skip binning and everything downstream of it.
    #[arg(long)]
    skip_binning: bool,

    /// Skip taxonomic placement of bins.
    #[arg(long)]
    skip_taxonomy: bool,

    /// Skip functional annotation of bins.
    #[arg(long)]
    skip_annotation: bool,

    /// Local CheckM2 database path.
    #[arg(long)]
    checkm2_db: Option<String>,

    /// Local GTDB-Tk database path.
    #[arg(long)]
    gtdbtk_db: Option<String>,

    /// Site jobs are scheduled onto.
    #[arg(long, default_value = "condorpool")]
    execution_site: String,

    /// Container image every tool wrapper runs inside.
    #[arg(long)]
    container_image: Option<String>,

    /// Per-tool resource override, repeatable.
    #[arg(long, value_name = "TOOL=MEM_MB:CORES", value_parser = parse_resource_override)]
    resource_override: Vec<(Tool, ResourceProfile)>,
}

fn parse_resource_override(raw: &str) -> Result<(Tool, ResourceProfile), String> {
    let (tool, spec) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TOOL=MEM_MB:CORES, got '{raw}'"))?;
    let tool = Tool::parse(tool).ok_or_else(|| format!("unknown tool '{tool}'"))?;
    let (memory, cores) = spec
        .split_once(':')
        .ok_or_else(|| format!("expected MEM_MB:CORES, got '{spec}'"))?;
    let memory_mb: u64 = memory
        .parse()
        .map_err(|_| format!("invalid memory '{memory}'"))?;
    let cores: u32 = cores
        .parse()
        .map_err(|_| format!("invalid core count '{cores}'"))?;
    Ok((
        tool,
        ResourceProfile {
            memory_mb,
            cores,
            walltime_min: None,
        },
    ))
}

/// Two small public metagenome samples sharing one co-assembly group,
/// sized for an end-to-end smoke run. The read URLs go straight into the
/// replica catalog; nothing is downloaded.
const TEST_SAMPLESHEET: &str = "\
sample,fastq_1,fastq_2,group
test_minigut,https://github.com/nf-core/test-datasets/raw/mag/test_data/test_minigut_R1.fastq.gz,https://github.com/nf-core/test-datasets/raw/mag/test_data/test_minigut_R2.fastq.gz,minigut
test_minigut_sample2,https://github.com/nf-core/test-datasets/raw/mag/test_data/test_minigut_sample2_R1.fastq.gz,https://github.com/nf-core/test-datasets/raw/mag/test_data/test_minigut_sample2_R2.fastq.gz,minigut
";

/// Write the bundled test samplesheet into the output directory so the
/// run is reproducible from the file it actually planned.
fn write_test_samplesheet(output_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join("test_samplesheet.csv");
    std::fs::write(&path, TEST_SAMPLESHEET)?;
    Ok(path)
}

fn main() -> miette::Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let samples = if cli.test {
        tracing::info!("planning the bundled test dataset");
        let path = write_test_samplesheet(&cli.output_dir).into_diagnostic()?;
        parse_samplesheet(&path)?
    } else {
        let path = cli
            .samplesheet
            .as_deref()
            .ok_or_else(|| miette::miette!("either --samplesheet or --test is required"))?;
        parse_samplesheet(path)?
    };

    let mut site = SiteConfig::new(cli.execution_site, cli.output_dir.clone());
    if let Some(image) = cli.container_image {
        site = site.with_container_image(image);
    }

    let config = PlanConfig {
        workflow_name: cli.name,
        assembler: cli.assembler,
        skips: SkipFlags {
            quality_control: cli.skip_quality_control,
            binning: cli.skip_binning,
            taxonomy: cli.skip_taxonomy,
            annotation: cli.skip_annotation,
        },
        resource_overrides: cli.resource_override,
        checkm2_db: cli.checkm2_db,
        gtdbtk_db: cli.gtdbtk_db,
        site,
    };

    let description = plan(&samples, &config)?;
    let written = match &cli.output {
        Some(filename) => description.write_to_named(&cli.output_dir, filename, cli.format)?,
        None => description.write_to(&cli.output_dir, cli.format)?,
    };
    for path in &written {
        println!("{}", path.display());
    }
    tracing::info!(
        jobs = description.workflow.jobs.len(),
        samples = samples.len(),
        workflow = %written[0].display(),
        "workflow description written; submit with: pegasus-plan --submit"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use magplan::samplesheet::Sample;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn resource_override_parses_well_formed_specs() {
        let (tool, profile) = parse_resource_override("megahit=32768:16").unwrap();
        assert_eq!(tool, Tool::Megahit);
        assert_eq!(profile.memory_mb, 32768);
        assert_eq!(profile.cores, 16);
        assert_eq!(profile.walltime_min, None);
    }

    #[test]
    fn resource_override_rejects_malformed_specs() {
        assert!(parse_resource_override("megahit").is_err());
        assert!(parse_resource_override("nosuchtool=1024:2").is_err());
        assert!(parse_resource_override("fastp=lots:2").is_err());
        assert!(parse_resource_override("fastp=1024").is_err());
    }

    #[test]
    fn bundled_samplesheet_parses_into_one_group() {
        let samples =
            magplan::samplesheet::parse_reader(TEST_SAMPLESHEET.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.group == "minigut"));
        assert!(samples.iter().all(Sample::is_paired));
    }
}
