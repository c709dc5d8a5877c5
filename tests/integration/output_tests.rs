use fragdupe::error::ExitCode;
use fragdupe::options::DuplicateFinderOptions;
use fragdupe::output::{JsonOutput, TextOutput, PREVIEW_CHARS};
use fragdupe::report::{index_and_find, RunControl};
use std::fs;
use tempfile::tempdir;

const LONG: &str = "Every request is retried three times with exponential backoff before the client gives up and reports the failure to the caller.";

#[test]
fn test_json_report_end_to_end() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), LONG).unwrap();
    fs::write(dir.path().join("b.txt"), LONG).unwrap();
    fs::write(dir.path().join("c.txt"), "Something else entirely, long enough to be indexed.").unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_min_length(20)
        .with_low_memory(true);
    let report = index_and_find(&options, &RunControl::default()).unwrap();
    let exit_code = ExitCode::from_report(&report);

    let json = JsonOutput::new(&report, exit_code).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let groups = value["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["similarity"], 1.0);

    let members = groups[0]["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members[0]["path"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(members[0]["start"], 0);
    assert_eq!(members[0]["end"], LONG.len());
    let preview = members[0]["preview"].as_str().unwrap();
    assert_eq!(preview.chars().count(), PREVIEW_CHARS + 1);
    assert!(LONG.starts_with(preview.trim_end_matches('…')));

    let summary = &value["summary"];
    assert_eq!(summary["files_indexed"], 3);
    assert_eq!(summary["duplicate_groups"], 1);
    assert_eq!(summary["low_memory"], true);
    assert_eq!(summary["exit_code"], 0);
    assert_eq!(summary["exit_code_name"], "FD000");
}

#[test]
fn test_json_report_without_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), LONG).unwrap();

    let report = index_and_find(&DuplicateFinderOptions::new(dir.path()), &RunControl::default()).unwrap();
    let exit_code = ExitCode::from_report(&report);
    let json = JsonOutput::new(&report, exit_code).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["groups"].as_array().unwrap().len(), 0);
    assert_eq!(value["summary"]["exit_code"], 2);
}

#[test]
fn test_text_report_end_to_end() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), LONG).unwrap();
    fs::write(dir.path().join("b.txt"), LONG).unwrap();

    let report = index_and_find(
        &DuplicateFinderOptions::new(dir.path()).with_min_length(20),
        &RunControl::default(),
    )
    .unwrap();

    yansi::disable();
    let mut buffer = Vec::new();
    TextOutput::new(&report, true).write_to(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.contains("Group 1 similarity 1.000 (2 segments in 2 files)"));
    assert!(text.contains(&format!("a.txt [0..{}] depth 0", LONG.len())));
    assert!(text.contains("Every request is retried"));
    assert!(text.contains("Scored 1 candidate pairs, accepted 1 edges"));
}
