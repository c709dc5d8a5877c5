use clap::Parser;
use fragdupe::cli::Cli;
use fragdupe::config::Config;
use fragdupe::options::ParserType;
use fragdupe::output::OutputFormat;
use fragdupe::report::{index_and_find, RunControl};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_file_drives_a_run() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("docs");
    fs::create_dir(&corpus).unwrap();
    fs::write(corpus.join("a.properties"), "title = shared value text\n").unwrap();
    fs::write(corpus.join("b.properties"), "heading = shared value text\n").unwrap();

    let config_path = dir.path().join("fragdupe.toml");
    fs::write(
        &config_path,
        "parser = \"properties\"\nmin_length = 5\nngram_length = 2\nformat = \"json\"\n",
    )
    .unwrap();

    let config = Config::figment(None, Some(config_path.as_path())).extract::<Config>().unwrap();
    assert_eq!(config.format, OutputFormat::Json);

    let cli = Cli::try_parse_from(["fragdupe", "--root", corpus.to_str().unwrap()]).unwrap();
    let options = cli.options(config);
    assert_eq!(options.parser, ParserType::Properties);
    assert_eq!(options.ngram_length, 2);

    let report = index_and_find(&options, &RunControl::default()).unwrap();
    assert_eq!(report.groups.len(), 1);
}

#[test]
fn test_cli_flags_win_over_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("fragdupe.toml");
    fs::write(&config_path, "min_similarity = 0.5\nlow_memory = false\nfile_mask = [\"md\"]\n").unwrap();

    let config = Config::figment(None, Some(config_path.as_path())).extract::<Config>().unwrap();
    let cli = Cli::try_parse_from([
        "fragdupe",
        "--root",
        ".",
        "--min-similarity",
        "0.95",
        "--memory",
        "--file-mask",
        "adoc",
    ])
    .unwrap();
    let options = cli.options(config);

    assert_eq!(options.min_similarity, 0.95);
    assert!(options.low_memory);
    assert!(options.mask_includes_only("adoc"));
}

#[test]
fn test_environment_layer() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("fragdupe.toml");
    fs::write(&config_path, "io_threads = 2\nmin_duplicates = 2\n").unwrap();

    // io_threads does not change results, so other tests are unaffected
    std::env::set_var("FRAGDUPE_IO_THREADS", "3");
    let config = Config::figment(None, Some(config_path.as_path())).extract::<Config>();
    std::env::remove_var("FRAGDUPE_IO_THREADS");

    let config = config.unwrap();
    assert_eq!(config.io_threads, 3);
    assert_eq!(config.min_duplicates, 2);
}

#[test]
fn test_load_with_broken_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("broken.toml");
    fs::write(&config_path, "min_length = [").unwrap();

    let config = Config::load(Some(config_path.as_path()));
    assert_eq!(config.min_length, Config::default().min_length);
}
