//! Analysis reports and their output formats.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - TAP: Test Anything Protocol version 13, for CI harnesses

use colored::*;
use serde::{Deserialize, Serialize};

use crate::checkers::{Outcome, Verdict};

// =============================================================================
// Report model
// =============================================================================

/// One (analyzer, provider, checker) result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub analyzer: String,
    /// Provider source (file path, `<stdin>`, ...).
    pub provider: String,
    pub checker_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Failures of ignored checkers do not fail the overall result.
    pub ignored: bool,
    pub verdict: Verdict,
}

/// Display status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
    Ignored,
    NotApplicable,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Ignored => "failed (ignored)",
            Status::NotApplicable => "not applicable",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ReportEntry {
    pub fn status(&self) -> Status {
        match self.verdict.outcome {
            Outcome::Passed => Status::Passed,
            Outcome::Failed if self.ignored => Status::Ignored,
            Outcome::Failed => Status::Failed,
            Outcome::NotApplicable => Status::NotApplicable,
        }
    }

    fn title(&self) -> String {
        format!("{}: {}: {}", self.analyzer, self.provider, self.checker_name)
    }
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    pub not_applicable: usize,
}

/// Ordered results of an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Append the entries of another report, keeping their order.
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failed if any entry failed without being ignored.
    pub fn overall(&self) -> Outcome {
        if self.entries.iter().any(|e| e.status() == Status::Failed) {
            Outcome::Failed
        } else {
            Outcome::Passed
        }
    }

    pub fn passed(&self) -> bool {
        self.overall() == Outcome::Passed
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.status() {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Ignored => summary.ignored += 1,
                Status::NotApplicable => summary.not_applicable += 1,
            }
        }
        summary
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub overall: Outcome,
    pub passed: bool,
    pub summary: Summary,
    pub results: Vec<JsonResult>,
}

/// JSON result structure, one per report entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResult {
    pub analyzer: String,
    pub provider: String,
    pub checker: String,
    pub name: String,
    pub status: Status,
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl JsonReport {
    pub fn from_report(report: &Report) -> Self {
        let results = report
            .entries
            .iter()
            .map(|e| JsonResult {
                analyzer: e.analyzer.clone(),
                provider: e.provider.clone(),
                checker: e.verdict.checker_id.clone(),
                name: e.checker_name.clone(),
                status: e.status(),
                ignored: e.ignored,
                message: e.verdict.message.clone(),
                hint: e.verdict.is_failed().then(|| e.hint.clone()).flatten(),
            })
            .collect();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            overall: report.overall(),
            passed: report.passed(),
            summary: report.summary(),
            results,
        }
    }
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &Report) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::from_report(report))?)
}

/// Write results in JSON format.
pub fn write_json(report: &Report) -> anyhow::Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

// =============================================================================
// TAP Format
// =============================================================================

/// YAML diagnostic block attached to non-passing TAP lines.
#[derive(Serialize)]
struct TapDiagnostic<'a> {
    checker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

/// Render a report as TAP version 13.
pub fn render_tap(report: &Report) -> anyhow::Result<String> {
    let mut out = String::from("TAP version 13\n");
    out.push_str(&format!("1..{}\n", report.entries.len()));

    for (n, entry) in report.entries.iter().enumerate() {
        let number = n + 1;
        let title = entry.title();
        match entry.status() {
            Status::Passed => {
                out.push_str(&format!("ok {} - {}\n", number, title));
            }
            Status::NotApplicable => {
                out.push_str(&format!(
                    "ok {} - {} # SKIP {}\n",
                    number,
                    title,
                    entry.verdict.message()
                ));
            }
            Status::Ignored => {
                out.push_str(&format!("not ok {} - {} # TODO ignored failure\n", number, title));
                out.push_str(&tap_diagnostic(entry)?);
            }
            Status::Failed => {
                out.push_str(&format!("not ok {} - {}\n", number, title));
                out.push_str(&tap_diagnostic(entry)?);
            }
        }
    }
    Ok(out)
}

fn tap_diagnostic(entry: &ReportEntry) -> anyhow::Result<String> {
    let diagnostic = TapDiagnostic {
        checker: &entry.verdict.checker_id,
        message: entry.verdict.message.as_deref(),
        hint: entry.hint.as_deref(),
    };
    let yaml = serde_yaml::to_string(&diagnostic)?;
    let mut block = String::from("  ---\n");
    for line in yaml.lines() {
        block.push_str("  ");
        block.push_str(line);
        block.push('\n');
    }
    block.push_str("  ...\n");
    Ok(block)
}

/// Write results in TAP format.
pub fn write_tap(report: &Report) -> anyhow::Result<()> {
    print!("{}", render_tap(report)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(report: &Report, config_path: &str) {
    // Header
    println!();
    print!("  ");
    print!("{}", "dsmcheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Config: ".dimmed());
    println!("{}", config_path);
    println!();

    let mut current: Option<(&str, &str)> = None;
    for entry in &report.entries {
        let group = (entry.analyzer.as_str(), entry.provider.as_str());
        if current != Some(group) {
            if current.map(|(a, _)| a) != Some(group.0) {
                println!("  {}", entry.analyzer.bold());
            }
            println!("    {}", entry.provider.blue());
            current = Some(group);
        }
        write_entry(entry);
    }
    println!();

    write_summary(&report.summary());
    write_final_status(report);
    println!();
}

fn write_entry(entry: &ReportEntry) {
    match entry.status() {
        Status::Passed => print!("      {} ", "✓ PASS".green()),
        Status::Failed => print!("      {} ", "✗ FAIL".red()),
        Status::Ignored => print!("      {} ", "✗ FAIL".yellow()),
        Status::NotApplicable => print!("      {} ", "- N/A ".dimmed()),
    }
    print!("{}", entry.checker_name);
    if entry.ignored {
        print!(" {}", "(ignored)".dimmed());
    }
    println!();

    match entry.status() {
        Status::Failed | Status::Ignored => {
            for line in entry.verdict.message().lines() {
                println!("             {}", line);
            }
            if let Some(hint) = &entry.hint {
                println!("             {}", format!("hint: {}", hint).dimmed());
            }
        }
        Status::NotApplicable => {
            println!("             {}", entry.verdict.message().dimmed());
        }
        Status::Passed => {}
    }
}

fn write_summary(summary: &Summary) {
    println!(
        "  {} {} passed, {} failed, {} ignored, {} not applicable",
        "Summary:".bold(),
        summary.passed,
        summary.failed,
        summary.ignored,
        summary.not_applicable
    );
}

fn write_final_status(report: &Report) {
    print!("  ");
    if report.passed() {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(checker: &str, verdict: Verdict, ignored: bool) -> ReportEntry {
        ReportEntry {
            analyzer: "webapp".to_string(),
            provider: "webapp.csv".to_string(),
            checker_name: checker.to_string(),
            hint: Some("fix it".to_string()),
            ignored,
            verdict,
        }
    }

    fn sample() -> Report {
        let mut report = Report::new();
        report.push(entry("Clean", Verdict::passed("dsmcheck.CodeClean"), false));
        report.push(entry(
            "Layers",
            Verdict::failed("dsmcheck.LayeredArchitecture", "a depends on b"),
            true,
        ));
        report.push(entry(
            "Mediation",
            Verdict::not_applicable("dsmcheck.CompleteMediation", "matrix has no categories"),
            false,
        ));
        report
    }

    #[test]
    fn test_ignored_failure_does_not_fail_overall() {
        let report = sample();
        assert_eq!(report.overall(), Outcome::Passed);
        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.not_applicable, 1);
    }

    #[test]
    fn test_failure_fails_overall() {
        let mut report = sample();
        report.push(entry(
            "Economy",
            Verdict::failed("dsmcheck.EconomyOfMechanism", "too dense"),
            false,
        ));
        assert_eq!(report.overall(), Outcome::Failed);
        assert!(!report.passed());
    }

    #[test]
    fn test_empty_report_passes() {
        assert!(Report::new().passed());
    }

    #[test]
    fn test_json_fields() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["overall"], "passed");
        assert_eq!(json["passed"], true);
        assert_eq!(json["summary"]["total"], 3);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[0]["checker"], "dsmcheck.CodeClean");
        assert_eq!(results[0]["status"], "passed");
        assert!(results[0].get("hint").is_none());
        assert_eq!(results[1]["status"], "ignored");
        assert_eq!(results[1]["hint"], "fix it");
        assert_eq!(results[2]["status"], "not_applicable");
    }

    #[test]
    fn test_tap_output() {
        let tap = render_tap(&sample()).unwrap();
        let lines: Vec<&str> = tap.lines().collect();
        assert_eq!(lines[0], "TAP version 13");
        assert_eq!(lines[1], "1..3");
        assert_eq!(lines[2], "ok 1 - webapp: webapp.csv: Clean");
        assert_eq!(
            lines[3],
            "not ok 2 - webapp: webapp.csv: Layers # TODO ignored failure"
        );
        assert_eq!(lines[4], "  ---");
        assert!(tap.contains("  checker: dsmcheck.LayeredArchitecture\n"));
        assert!(tap.contains("  ...\n"));
        assert!(tap.ends_with(
            "ok 3 - webapp: webapp.csv: Mediation # SKIP matrix has no categories\n"
        ));
    }
}
