use fragdupe::options::{DuplicateFinderOptions, ParserType};
use fragdupe::report::{index_and_find, RunControl};
use std::fs;
use tempfile::tempdir;

const PARAGRAPH: &str = "Install the command line tool with your package manager before running any of the examples below.";

#[test]
fn test_markdown_paragraph_shared_between_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("guide.md"),
        format!("# Guide\n\n{PARAGRAPH}\n\n## Next steps\n\nRead the reference chapter for every flag.\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("readme.md"),
        format!("# Readme\n\nThis project scans documentation.\n\n{PARAGRAPH}\n"),
    )
    .unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["md"])
        .with_min_length(20);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.index_stats.parser.map(|p| p.name()), Some("markdown"));
    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.similarity, 1.0);
    assert_eq!(group.file_count(), 2);
    for member in &group.members {
        assert_eq!(report.member_text(member).as_deref(), Some(PARAGRAPH));
        assert_eq!(member.depth, 2);
    }
}

#[test]
fn test_markdown_inline_compares_whole_sections() {
    let dir = tempdir().unwrap();
    let section = format!("# Setup\n\n{PARAGRAPH}\n\n- first item\n- second item\n");
    fs::write(dir.path().join("a.md"), &section).unwrap();
    fs::write(dir.path().join("b.md"), &section).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["md"])
        .with_min_length(20)
        .with_inline_nested(true);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.index_stats.segments_indexed, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].members[0].range, 0..section.len());
}

#[test]
fn test_xml_elements_with_nesting() {
    let dir = tempdir().unwrap();
    let doc = format!("<book><chapter><title>Intro</title><para>{PARAGRAPH}</para></chapter></book>");
    fs::write(dir.path().join("a.xml"), &doc).unwrap();
    fs::write(dir.path().join("b.xml"), &doc).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["xml"])
        .with_min_length(20);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    let member = &report.groups[0].members[0];
    assert_eq!(member.depth, 2);
    let start = doc.find("<para>").unwrap();
    assert_eq!(member.range, start..start + format!("<para>{PARAGRAPH}</para>").len());
}

#[test]
fn test_asciidoc_paragraph_shared_between_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.adoc"),
        format!("= Manual\n\n{PARAGRAPH}\n\n== Usage\n\nRun it with a directory.\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("b.asciidoc"),
        format!("= Handbook\n\n{PARAGRAPH}\n"),
    )
    .unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["adoc", "asciidoc"])
        .with_min_length(20);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.index_stats.parser.map(|p| p.name()), Some("asciidoc"));
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].file_count(), 2);
}

#[test]
fn test_properties_values_compared_without_keys() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("en.properties"),
        "# labels\nlogin.prompt = Welcome back, please sign in to continue to your dashboard\nlogout = Bye\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("other.properties"),
        "welcome.message: Welcome back, please sign in to continue to your dashboard\n",
    )
    .unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::Properties)
        .with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].similarity, 1.0);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_line_parser_finds_repeated_lines() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.txt"),
        format!("first unique line of the file\n{PARAGRAPH}\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("b.txt"),
        format!("{PARAGRAPH}\nanother line that is different\n{PARAGRAPH}\n"),
    )
    .unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::Line)
        .with_min_length(10);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.len(), 3);
    assert_eq!(group.file_count(), 2);
    // members of the same file are ordered by offset
    assert!(group.members[1].range.start < group.members[2].range.start);
}

#[test]
fn test_ambiguous_mask_falls_back_to_file_parser() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.md"), PARAGRAPH).unwrap();
    fs::write(dir.path().join("b.txt"), PARAGRAPH).unwrap();

    let options = DuplicateFinderOptions::new(dir.path())
        .with_file_mask(["md", "txt"])
        .with_min_length(20);
    let report = index_and_find(&options, &RunControl::default()).unwrap();

    assert_eq!(report.index_stats.parser.map(|p| p.name()), Some("file"));
    assert_eq!(report.groups.len(), 1);
}
