//! Samplesheet parsing and the validated sample model.
//!
//! The samplesheet is a CSV with a header row and the columns
//! `sample,fastq_1,fastq_2,group`; `fastq_2` and `group` may be empty or
//! absent. Parsing validates every row and collects *all* problems before
//! failing, so the operator gets complete feedback in one pass instead of
//! fixing rows one re-run at a time.
//!
//! # Examples
//!
//! ```
//! use magplan::samplesheet::parse_reader;
//!
//! let sheet = "\
//! sample,fastq_1,fastq_2,group
//! s1,/data/s1_R1.fastq.gz,/data/s1_R2.fastq.gz,g1
//! s2,/data/s2_R1.fastq.gz,,g1
//! ";
//! let samples = parse_reader(sheet.as_bytes()).unwrap();
//! assert_eq!(samples.len(), 2);
//! assert!(samples[0].is_paired());
//! assert!(!samples[1].is_paired());
//! assert_eq!(samples[1].group, "g1");
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One validated sequencing sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Unique, non-empty sample identifier (case-sensitive).
    pub id: String,
    /// Forward-read path or URL. Required.
    pub fastq_1: String,
    /// Reverse-read path or URL. Absent for single-end samples.
    pub fastq_2: Option<String>,
    /// Co-assembly group. Defaults to the sample's own identifier, so an
    /// ungrouped sample is its own group of size one.
    pub group: String,
}

impl Sample {
    /// Paired-end sample; `group` defaults to the sample id when `None`.
    #[must_use]
    pub fn paired(
        id: impl Into<String>,
        fastq_1: impl Into<String>,
        fastq_2: impl Into<String>,
        group: Option<&str>,
    ) -> Self {
        let id = id.into();
        let group = group.map_or_else(|| id.clone(), str::to_owned);
        Self {
            id,
            fastq_1: fastq_1.into(),
            fastq_2: Some(fastq_2.into()),
            group,
        }
    }

    /// Single-end sample; `group` defaults to the sample id when `None`.
    #[must_use]
    pub fn single(
        id: impl Into<String>,
        fastq_1: impl Into<String>,
        group: Option<&str>,
    ) -> Self {
        let id = id.into();
        let group = group.map_or_else(|| id.clone(), str::to_owned);
        Self {
            id,
            fastq_1: fastq_1.into(),
            fastq_2: None,
            group,
        }
    }

    /// Whether the sample has a reverse-read file.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.fastq_2.is_some()
    }
}

/// Raw CSV row before validation. Missing columns deserialize as `None`.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    sample: Option<String>,
    #[serde(default)]
    fastq_1: Option<String>,
    #[serde(default)]
    fastq_2: Option<String>,
    #[serde(default)]
    group: Option<String>,
}

/// What is wrong with a single samplesheet row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowIssue {
    /// The `sample` column is empty.
    EmptyId,
    /// The sample identifier appears on more than one row.
    DuplicateId,
    /// The `fastq_1` column is empty.
    EmptyForwardPath,
    /// Forward and reverse paths are the same file.
    IdenticalReadPaths,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::EmptyId => write!(f, "empty sample identifier"),
            RowIssue::DuplicateId => write!(f, "duplicate sample identifier"),
            RowIssue::EmptyForwardPath => write!(f, "empty forward-read path"),
            RowIssue::IdenticalReadPaths => {
                write!(f, "forward and reverse read paths are identical")
            }
        }
    }
}

/// One malformed row, located by 1-based data row number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowProblem {
    pub row: usize,
    pub sample: String,
    pub issue: RowIssue,
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sample.is_empty() {
            write!(f, "row {}: {}", self.row, self.issue)
        } else {
            write!(f, "row {} ('{}'): {}", self.row, self.sample, self.issue)
        }
    }
}

fn render_problems(problems: &[RowProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from samplesheet reading and validation.
#[derive(Debug, Error, Diagnostic)]
pub enum SamplesheetError {
    #[error("failed to read samplesheet")]
    #[diagnostic(code(magplan::samplesheet::io))]
    Io(#[from] std::io::Error),

    #[error("failed to parse samplesheet CSV")]
    #[diagnostic(code(magplan::samplesheet::csv))]
    Csv(#[from] csv::Error),

    /// One or more malformed rows, all collected before failing.
    #[error("invalid samplesheet: {}", render_problems(problems))]
    #[diagnostic(
        code(magplan::samplesheet::invalid),
        help("Fix every listed row and re-run; rows are numbered from the first data row.")
    )]
    Invalid { problems: Vec<RowProblem> },

    #[error("samplesheet contains no samples")]
    #[diagnostic(code(magplan::samplesheet::empty))]
    Empty,
}

/// Parse and validate a samplesheet file.
pub fn parse_samplesheet(path: &Path) -> Result<Vec<Sample>, SamplesheetError> {
    let file = std::fs::File::open(path)?;
    parse_reader(file)
}

/// Parse and validate a samplesheet from any reader.
///
/// Returns the samples in sheet order, or an [`SamplesheetError::Invalid`]
/// carrying every malformed row. Duplicate identifiers flag *both*
/// occurrences so the operator sees the full collision.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Sample>, SamplesheetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    let mut problems = Vec::new();
    // id -> (first row number, already flagged as duplicate)
    let mut seen: FxHashMap<String, (usize, bool)> = FxHashMap::default();

    for (idx, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let row = idx + 1;
        let raw = record?;

        let id = normalize(raw.sample);
        let fastq_1 = normalize(raw.fastq_1);
        let fastq_2 = normalize(raw.fastq_2);
        let group = normalize(raw.group);

        let sample_label = id.clone().unwrap_or_default();

        let Some(id) = id else {
            problems.push(RowProblem {
                row,
                sample: sample_label.clone(),
                issue: RowIssue::EmptyId,
            });
            continue;
        };

        match seen.get_mut(&id) {
            Some((first_row, flagged)) => {
                if !*flagged {
                    problems.push(RowProblem {
                        row: *first_row,
                        sample: id.clone(),
                        issue: RowIssue::DuplicateId,
                    });
                    *flagged = true;
                }
                problems.push(RowProblem {
                    row,
                    sample: id.clone(),
                    issue: RowIssue::DuplicateId,
                });
            }
            None => {
                seen.insert(id.clone(), (row, false));
            }
        }

        let Some(fastq_1) = fastq_1 else {
            problems.push(RowProblem {
                row,
                sample: id,
                issue: RowIssue::EmptyForwardPath,
            });
            continue;
        };

        if fastq_2.as_deref() == Some(fastq_1.as_str()) {
            problems.push(RowProblem {
                row,
                sample: id,
                issue: RowIssue::IdenticalReadPaths,
            });
            continue;
        }

        let group = group.unwrap_or_else(|| id.clone());
        samples.push(Sample {
            id,
            fastq_1,
            fastq_2,
            group,
        });
    }

    if !problems.is_empty() {
        problems.sort_by_key(|p| p.row);
        return Err(SamplesheetError::Invalid { problems });
    }
    if samples.is_empty() {
        return Err(SamplesheetError::Empty);
    }

    tracing::debug!(count = samples.len(), "samplesheet parsed");
    Ok(samples)
}

fn normalize(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
