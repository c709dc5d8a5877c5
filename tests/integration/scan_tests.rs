use fragdupe::error::ExitCode;
use fragdupe::options::{DuplicateFinderOptions, ParserType};
use fragdupe::report::{index_and_find, RunControl};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SENTENCE: &str = "the quick brown fox jumps over the lazy dog";

/// Twenty words starting at `offset`: w{offset} .. w{offset + 19}.
fn shifted_words(offset: usize) -> String {
    (offset..offset + 20)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let options = DuplicateFinderOptions::new(dir.path());

    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert!(report.is_empty());
    assert_eq!(report.index_stats.files_seen, 0);
    assert_eq!(ExitCode::from_report(&report), ExitCode::NoDuplicates);
}

#[test]
fn test_identical_files_form_one_group() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("b.txt"), SENTENCE).unwrap();

    let options = DuplicateFinderOptions::new(dir.path()).with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.similarity, 1.0);
    assert_eq!(group.len(), 2);
    assert_eq!(file_name(&group.members[0].path), "a.txt");
    assert_eq!(file_name(&group.members[1].path), "b.txt");
    assert_eq!(group.members[0].range, 0..SENTENCE.len());
    assert_eq!(group.members[0].length, SENTENCE.chars().count());
    assert_eq!(ExitCode::from_report(&report), ExitCode::Success);
}

#[test]
fn test_short_segments_are_not_indexed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "aaaaaaaaaa").unwrap();
    fs::write(dir.path().join("b.txt"), "aaaaaaaaaa").unwrap();

    let options = DuplicateFinderOptions::new(dir.path()).with_min_length(100);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert!(report.is_empty());
    assert_eq!(report.index_stats.segments_indexed, 0);
    assert_eq!(report.index_stats.segments_too_short, 2);
}

#[test]
fn test_whitespace_differences_are_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(
        dir.path().join("b.txt"),
        "  the quick\tbrown fox\n\njumps   over the lazy dog\n",
    )
    .unwrap();

    let options = DuplicateFinderOptions::new(dir.path()).with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].similarity, 1.0);

    let strict = options.with_keep_whitespace(true);
    let report = index_and_find(&strict, &RunControl::default()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_transitive_chain_forms_one_group() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), shifted_words(0)).unwrap();
    fs::write(dir.path().join("b.txt"), shifted_words(1)).unwrap();
    fs::write(dir.path().join("c.txt"), shifted_words(2)).unwrap();

    // a~b and b~c share 17 of 19 trigrams; a~c only 16 of 20
    let options = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::File)
        .with_min_length(10)
        .with_min_similarity(0.85);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.len(), 3);
    assert!((group.similarity - 17.0 / 19.0).abs() < 1e-12);
    assert_eq!(report.detection_stats.edges, 2);

    let strict = options.clone().with_min_similarity(0.9);
    assert!(index_and_find(&strict, &RunControl::default()).unwrap().is_empty());

    let loose = options.with_min_similarity(0.8);
    let report = index_and_find(&loose, &RunControl::default()).unwrap();
    assert_eq!(report.detection_stats.edges, 3);
    assert!((report.groups[0].similarity - 0.8).abs() < 1e-12);
}

#[test]
fn test_min_duplicates_filters_small_groups() {
    let dir = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(dir.path().join(name), shifted_words(0)).unwrap();
    }
    fs::write(dir.path().join("d.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("e.txt"), SENTENCE).unwrap();

    let base = DuplicateFinderOptions::new(dir.path()).with_min_length(10);

    let report = index_and_find(&base, &RunControl::default()).unwrap();
    assert_eq!(report.groups.len(), 2);

    let report = index_and_find(&base.clone().with_min_duplicates(3), &RunControl::default()).unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
    assert_eq!(report.detection_stats.discarded_groups, 1);

    let report = index_and_find(&base.with_min_duplicates(4), &RunControl::default()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_groups_sorted_by_similarity() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), shifted_words(0)).unwrap();
    fs::write(dir.path().join("b.txt"), shifted_words(1)).unwrap();
    fs::write(dir.path().join("x.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("y.txt"), SENTENCE).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_min_length(10)
        .with_min_similarity(0.85);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].similarity, 1.0);
    assert_eq!(file_name(&report.groups[0].members[0].path), "x.txt");
    assert!(report.groups[1].similarity < 1.0);
}

#[test]
fn test_file_mask_limits_scope() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("b.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("c.log"), SENTENCE).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_min_length(10)
        .with_parser(ParserType::File)
        .with_file_mask(["log"]);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.index_stats.files_seen, 1);
    assert!(report.is_empty());
}

#[test]
fn test_ignore_patterns_and_subdirectories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("guide").join("part");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(dir.path().join("build")).unwrap();
    fs::write(dir.path().join("a.txt"), SENTENCE).unwrap();
    fs::write(nested.join("b.txt"), SENTENCE).unwrap();
    fs::write(dir.path().join("build").join("c.txt"), SENTENCE).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_min_length(10)
        .with_ignore_patterns(vec!["build".to_string()]);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(report.groups[0]
        .members
        .iter()
        .all(|m| !m.path.components().any(|c| c.as_os_str() == "build")));
}

#[test]
fn test_results_independent_of_thread_count() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        let content = format!("{}\n\n{}\n", shifted_words(i % 4), SENTENCE);
        fs::write(dir.path().join(format!("doc{i:02}.txt")), content).unwrap();
    }

    let base = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::Line)
        .with_min_length(10)
        .with_min_similarity(0.8);
    let single = index_and_find(&base.clone().with_io_threads(1), &RunControl::default()).unwrap();
    let multi = index_and_find(&base.with_io_threads(4), &RunControl::default()).unwrap();

    assert!(!single.is_empty());
    assert_eq!(single.groups, multi.groups);
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), format!("{SENTENCE}\n{}", shifted_words(0))).unwrap();
    fs::write(dir.path().join("b.txt"), format!("{}\n{SENTENCE}", shifted_words(1))).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::Line)
        .with_min_length(10)
        .with_min_similarity(0.85);
    let first = index_and_find(&options, &RunControl::default()).unwrap();
    let second = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(first.groups.len(), 2);
    assert_eq!(first.groups, second.groups);
}
