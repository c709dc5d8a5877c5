use fragdupe::error::ExitCode;
use fragdupe::index::{FileError, IndexError};
use fragdupe::options::{ConfigurationError, DuplicateFinderOptions, ParserType};
use fragdupe::report::{index_and_find, RunControl, RunError};
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

const SENTENCE: &str = "the quick brown fox jumps over the lazy dog";

#[test]
fn test_malformed_xml_is_skipped_and_counted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.xml"), format!("<doc><p>{SENTENCE}</p></doc>")).unwrap();
    fs::write(dir.path().join("b.xml"), format!("<doc><p>{SENTENCE}</p></doc>")).unwrap();
    fs::write(dir.path().join("broken.xml"), format!("<doc><p>{SENTENCE}</doc>")).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["xml"])
        .with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert_eq!(report.index_stats.files_seen, 3);
    assert_eq!(report.index_stats.files_indexed, 2);
    assert_eq!(report.index_stats.failed_files, 1);
    assert_eq!(report.index_stats.parse_failures(), 1);
    assert!(report.index_stats.errors[0].path().ends_with("broken.xml"));
    assert!(report.has_failures());
    assert_eq!(ExitCode::from_report(&report), ExitCode::PartialSuccess);
}

#[test]
fn test_invalid_utf8_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("b.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("c.txt"), [0x66u8, 0x6f, 0xff, 0xfe, 0x6f]).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::File)
        .with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.index_stats.failed_files, 1);
    assert!(matches!(report.index_stats.errors[0], FileError::Parse { .. }));
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let options = DuplicateFinderOptions::new(dir.path().join("missing"));

    let err = index_and_find(&options, &RunControl::default()).unwrap_err();
    assert!(matches!(
        err,
        RunError::Index(IndexError::Configuration(ConfigurationError::RootNotFound(_)))
    ));

    let wrapped = anyhow::Error::new(err);
    assert_eq!(ExitCode::from_error(&wrapped), ExitCode::GeneralError);
}

#[test]
fn test_root_that_is_a_file_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, SENTENCE).unwrap();

    let err = index_and_find(&DuplicateFinderOptions::new(&file), &RunControl::default()).unwrap_err();
    assert!(matches!(
        err,
        RunError::Index(IndexError::Configuration(ConfigurationError::RootNotADirectory(_)))
    ));
}

#[test]
fn test_out_of_range_thresholds_are_fatal() {
    let dir = tempdir().unwrap();
    for options in [
        DuplicateFinderOptions::new(dir.path()).with_min_similarity(-0.1),
        DuplicateFinderOptions::new(dir.path()).with_min_similarity(1.01),
        DuplicateFinderOptions::new(dir.path()).with_ngram_length(0),
        DuplicateFinderOptions::new(dir.path()).with_min_duplicates(0),
    ] {
        let err = index_and_find(&options, &RunControl::default()).unwrap_err();
        assert!(matches!(err, RunError::Index(IndexError::Configuration(_))));
    }
}

#[test]
fn test_cancelled_run_reports_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("b.txt"), SENTENCE).unwrap();

    let options = DuplicateFinderOptions::new(dir.path()).with_min_length(10);
    let control = RunControl::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let err = index_and_find(&options, &control).unwrap_err();

    assert!(err.is_interrupted());
    let wrapped = anyhow::Error::new(err).context("run failed");
    assert_eq!(ExitCode::from_error(&wrapped), ExitCode::Interrupted);
}
