//! Samplesheet parsing from real files on disk.

use std::io::Write;

use magplan::samplesheet::{SamplesheetError, parse_samplesheet};

fn write_sheet(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn a_well_formed_sheet_parses_from_disk() {
    let file = write_sheet(
        "sample,fastq_1,fastq_2,group\n\
         s1,/data/s1_R1.fastq.gz,/data/s1_R2.fastq.gz,g1\n\
         s2,/data/s2_R1.fastq.gz,,\n",
    );
    let samples = parse_samplesheet(file.path()).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].group, "g1");
    assert_eq!(samples[1].group, "s2");
}

#[test]
fn a_missing_file_reports_the_io_error() {
    let err = parse_samplesheet(std::path::Path::new("/nonexistent/sheet.csv")).unwrap_err();
    assert!(matches!(err, SamplesheetError::Io(_)));
}

#[test]
fn every_row_problem_is_reported_at_once() {
    let file = write_sheet(
        "sample,fastq_1,fastq_2,group\n\
         ,/data/a_R1.fastq.gz,,\n\
         s2,,,g1\n\
         s3,/data/c.fq.gz,/data/c.fq.gz,g1\n",
    );
    let err = parse_samplesheet(file.path()).unwrap_err();
    let SamplesheetError::Invalid { problems } = err else {
        panic!("expected Invalid, got {err:?}");
    };
    assert_eq!(problems.len(), 3);
    let rows: Vec<usize> = problems.iter().map(|p| p.row).collect();
    assert_eq!(rows, vec![1, 2, 3]);
}
