use fragdupe::options::DuplicateFinderOptions;
use fragdupe::report::{index_and_find, RunControl};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SHARED: &str = "Configuration files are read from the platform directory and merged with environment variables.";
const NEAR: &str = "Configuration files are read from the platform directory and merged with the environment variables.";

fn write_corpus(root: &Path) {
    for i in 0..40 {
        let body = match i % 3 {
            0 => SHARED.to_string(),
            1 => NEAR.to_string(),
            _ => format!("Chapter {i} covers a topic nobody else in this corpus writes about at all."),
        };
        fs::write(
            root.join(format!("page{i:02}.md")),
            format!("# Page {i}\n\n{body}\n\nClosing remark number {i} for this page.\n"),
        )
        .unwrap();
    }
}

fn options(root: &Path) -> DuplicateFinderOptions {
    DuplicateFinderOptions::new(root)
        .with_file_mask(["md"])
        .with_min_length(20)
        .with_min_similarity(0.7)
}

#[test]
fn test_low_memory_reports_same_groups() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let normal = index_and_find(&options(dir.path()), &RunControl::default()).unwrap();
    let low = index_and_find(&options(dir.path()).with_low_memory(true), &RunControl::default()).unwrap();

    assert!(!normal.is_empty());
    assert!(low.index_stats.low_memory);
    assert!(!normal.index_stats.low_memory);
    assert_eq!(normal.groups, low.groups);
    assert_eq!(
        normal.index_stats.distinct_shingles,
        low.index_stats.distinct_shingles
    );
}

#[test]
fn test_low_memory_recovers_text_from_disk() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let normal = index_and_find(&options(dir.path()), &RunControl::default()).unwrap();
    let low = index_and_find(&options(dir.path()).with_low_memory(true), &RunControl::default()).unwrap();

    for (a, b) in normal.groups.iter().zip(&low.groups) {
        for (m, n) in a.members.iter().zip(&b.members) {
            let expected = normal.member_text(m).unwrap();
            assert_eq!(low.member_text(n), Some(expected));
        }
    }
    assert!(low.segments.iter().all(|s| s.text.is_none()));
}

#[test]
fn test_low_memory_changed_file_has_no_text() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.md"), format!("# A\n\n{SHARED}\n")).unwrap();
    fs::write(dir.path().join("b.md"), format!("# B\n\n{SHARED}\n")).unwrap();

    let report = index_and_find(&options(dir.path()).with_low_memory(true), &RunControl::default()).unwrap();
    assert_eq!(report.groups.len(), 1);
    let member = report.groups[0].members[0].clone();
    assert_eq!(report.member_text(&member).as_deref(), Some(SHARED));

    fs::write(dir.path().join("a.md"), "# rewritten\n").unwrap();
    assert!(report.member_text(&member).is_none());

    fs::remove_file(dir.path().join("a.md")).unwrap();
    assert!(report.member_text(&member).is_none());
}
