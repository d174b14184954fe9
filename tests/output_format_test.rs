//! Tests for the JSON and TAP output formats.

use std::path::PathBuf;

use dsmcheck::config::{self, Config};
use dsmcheck::report::{self, JsonReport, Report, Status};
use dsmcheck::{Outcome, PluginRegistry};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Run a testdata configuration and return its report.
fn run_config(name: &str) -> Report {
    let testdata = testdata_path();
    let config = Config::parse_file(testdata.join(name)).expect("should parse configuration");
    let registry = PluginRegistry::with_builtins();
    config::build(&config, &registry, &testdata)
        .expect("should build analysis")
        .run()
}

fn run_and_get_json(name: &str) -> JsonReport {
    let json = report::render_json(&run_config(name)).expect("should render JSON");
    serde_json::from_str(&json).expect("should deserialize from JSON")
}

#[test]
fn test_json_report_structure() {
    let report = run_and_get_json("bypass.yml");

    assert!(!report.version.is_empty(), "version should not be empty");
    assert_eq!(report.overall, Outcome::Failed);
    assert!(!report.passed);
    assert_eq!(report.results.len(), 6);

    assert_eq!(report.summary.total, 6);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.failed, 4);
    assert_eq!(report.summary.ignored, 1);
    assert_eq!(report.summary.not_applicable, 0);
}

#[test]
fn test_json_results_format() {
    let report = run_and_get_json("bypass.yml");

    for r in &report.results {
        assert!(!r.analyzer.is_empty(), "analyzer should not be empty");
        assert!(!r.provider.is_empty(), "provider should not be empty");
        assert!(r.checker.starts_with("dsmcheck."), "unexpected checker {}", r.checker);
        assert!(!r.name.is_empty(), "name should not be empty");

        match r.status {
            Status::Passed => assert!(r.hint.is_none(), "passed results carry no hint"),
            Status::Failed | Status::Ignored => {
                assert!(r.message.is_some(), "{} should explain its failure", r.name)
            }
            Status::NotApplicable => {}
        }
        assert_eq!(r.ignored, r.status == Status::Ignored);
    }

    let shared = report
        .results
        .iter()
        .find(|r| r.name == "Shared data")
        .expect("renamed checker should be reported under its name");
    assert_eq!(shared.checker, "dsmcheck.LeastCommonMechanism");
    assert_eq!(shared.status, Status::Ignored);
}

#[test]
fn test_json_field_names() {
    let json = report::render_json(&run_config("bypass.yml")).expect("should render");

    assert!(json.contains("\"version\""), "should have 'version' field");
    assert!(json.contains("\"overall\": \"failed\""), "should have 'overall' field");
    assert!(json.contains("\"passed\""), "should have 'passed' field");
    assert!(json.contains("\"summary\""), "should have 'summary' field");
    assert!(json.contains("\"results\""), "should have 'results' field");

    assert!(json.contains("\"analyzer\""), "results should have 'analyzer' field");
    assert!(json.contains("\"provider\""), "results should have 'provider' field");
    assert!(json.contains("\"checker\""), "results should have 'checker' field");
    assert!(json.contains("\"status\": \"ignored\""), "results should have 'status' field");
    assert!(json.contains("\"message\""), "results should have 'message' field");
    assert!(json.contains("\"hint\""), "failed results should have 'hint' field");
}

#[test]
fn test_json_output_is_deterministic() {
    let first = report::render_json(&run_config("webapp.yml")).unwrap();
    let second = report::render_json(&run_config("webapp.yml")).unwrap();
    assert_eq!(first, second);

    let first = report::render_json(&run_config("bypass.yml")).unwrap();
    let second = report::render_json(&run_config("bypass.yml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_tap_plan_and_lines() {
    let tap = report::render_tap(&run_config("bypass.yml")).expect("should render TAP");
    let lines: Vec<&str> = tap.lines().collect();

    assert_eq!(lines[0], "TAP version 13");
    assert_eq!(lines[1], "1..6");

    let test_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("ok ") || l.starts_with("not ok "))
        .collect();
    assert_eq!(test_lines.len(), 6);

    assert!(test_lines[0].starts_with("ok 1 - bypass: "));
    assert!(test_lines[0].ends_with("webapp_bypass.csv: Code Clean"));
    assert!(test_lines[1].starts_with("not ok 2 - bypass: "));
    assert!(test_lines[1].ends_with(": Complete Mediation"));
    assert!(test_lines[2].ends_with(": Shared data # TODO ignored failure"));
    assert!(test_lines[5].starts_with("not ok 6 - missing: "));
}

#[test]
fn test_tap_diagnostics_are_yaml() {
    let tap = report::render_tap(&run_config("bypass.yml")).unwrap();

    assert!(tap.contains("  ---\n  checker: dsmcheck.CompleteMediation\n"));
    assert!(tap.contains("billing accesses shop_data directly (weight 2)"));
    assert!(tap.contains("  ...\n"));

    // passing lines carry no diagnostic block
    let first_block = tap.find("  ---").unwrap();
    let second_line = tap.find("not ok 2").unwrap();
    assert!(first_block > second_line);
}

#[test]
fn test_tap_all_passing() {
    let tap = report::render_tap(&run_config("webapp.yml")).unwrap();
    assert!(tap.starts_with("TAP version 13\n1..7\n"));
    assert!(!tap.contains("not ok"));
    assert!(!tap.contains("  ---"));
}
