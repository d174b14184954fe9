//! Analyzer that runs checkers against the matrices of its providers.

use rayon::prelude::*;

use crate::checkers::{AnalysisContext, BoundChecker, Verdict};
use crate::providers::Provider;
use crate::report::{Report, ReportEntry};
use crate::roles::RoleMap;

/// A group of providers and the checkers to run against each of their matrices.
pub struct Analyzer {
    name: String,
    description: Option<String>,
    roles: RoleMap,
    providers: Vec<Box<dyn Provider>>,
    checkers: Vec<BoundChecker>,
    parallel: bool,
}

impl Analyzer {
    /// Create an analyzer using the built-in category roles.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            roles: RoleMap::builtin(),
            providers: Vec::new(),
            checkers: Vec::new(),
            parallel: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the category roles and layers checkers see.
    pub fn with_roles(mut self, roles: RoleMap) -> Self {
        self.roles = roles;
        self
    }

    /// Set whether checkers for one matrix run in parallel.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn Provider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn add_checker(&mut self, checker: BoundChecker) -> &mut Self {
        self.checkers.push(checker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn providers(&self) -> &[Box<dyn Provider>] {
        &self.providers
    }

    pub fn checkers(&self) -> &[BoundChecker] {
        &self.checkers
    }

    /// Run every checker against every provider's matrix.
    ///
    /// Provider and checker errors are recorded as failed entries; the run
    /// always covers every (provider, checker) pair.
    pub fn run(&self) -> Report {
        let mut report = Report::new();

        for provider in &self.providers {
            let source = provider.source();
            tracing::info!(
                "analyzer {}: running {} on {}",
                self.name,
                provider.identifier(),
                source
            );

            let matrix = match provider.produce() {
                Ok(matrix) => matrix,
                Err(e) => {
                    tracing::warn!("provider {} failed: {}", provider.identifier(), e);
                    self.record_provider_failure(&mut report, provider.as_ref(), &source, &e);
                    continue;
                }
            };

            let ctx = AnalysisContext::new(&matrix, &self.roles);
            let verdicts: Vec<Verdict> = if self.parallel {
                self.checkers.par_iter().map(|c| c.run(&ctx)).collect()
            } else {
                self.checkers.iter().map(|c| c.run(&ctx)).collect()
            };

            for (checker, verdict) in self.checkers.iter().zip(verdicts) {
                report.push(self.entry(checker, &source, verdict));
            }
        }

        report
    }

    fn entry(&self, checker: &BoundChecker, source: &str, verdict: Verdict) -> ReportEntry {
        ReportEntry {
            analyzer: self.name.clone(),
            provider: source.to_string(),
            checker_name: checker.display_name().to_string(),
            hint: Some(checker.hint().to_string()).filter(|h| !h.is_empty()),
            ignored: checker.is_ignored(),
            verdict,
        }
    }

    fn record_provider_failure(
        &self,
        report: &mut Report,
        provider: &dyn Provider,
        source: &str,
        error: &crate::error::ProviderError,
    ) {
        let message = format!("provider error: {}", error);
        if self.checkers.is_empty() {
            report.push(ReportEntry {
                analyzer: self.name.clone(),
                provider: source.to_string(),
                checker_name: provider.name().to_string(),
                hint: None,
                ignored: false,
                verdict: Verdict::failed(provider.identifier(), message),
            });
            return;
        }
        // ignore masks checker failures only, never a missing matrix
        for checker in &self.checkers {
            let verdict = Verdict::failed(checker.identifier(), message.clone());
            let mut entry = self.entry(checker, source, verdict);
            entry.ignored = false;
            report.push(entry);
        }
    }
}

/// Several analyzers run in order, their reports merged.
#[derive(Default)]
pub struct Analysis {
    analyzers: Vec<Analyzer>,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, analyzer: Analyzer) -> &mut Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn analyzers(&self) -> &[Analyzer] {
        &self.analyzers
    }

    pub fn run(&self) -> Report {
        let mut report = Report::new();
        for analyzer in &self.analyzers {
            report.merge(analyzer.run());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::{CodeClean, EconomyOfMechanism, Outcome};
    use crate::error::ProviderError;
    use crate::matrix::Matrix;
    use crate::providers::StaticMatrix;

    struct Broken;

    impl Provider for Broken {
        fn identifier(&self) -> &'static str {
            "test.Broken"
        }
        fn name(&self) -> &'static str {
            "Broken"
        }
        fn description(&self) -> &'static str {
            "always fails"
        }
        fn source(&self) -> String {
            "nowhere".to_string()
        }
        fn produce(&self) -> Result<Matrix, ProviderError> {
            Err(ProviderError::Unavailable("no data".to_string()))
        }
    }

    fn cyclic() -> Matrix {
        Matrix::from_weights(vec![vec![0, 1], vec![1, 0]]).unwrap()
    }

    #[test]
    fn test_entries_follow_registration_order() {
        let mut analyzer = Analyzer::new("a");
        analyzer
            .add_provider(Box::new(StaticMatrix::new("m", cyclic())))
            .add_checker(BoundChecker::new(Box::new(EconomyOfMechanism::default())))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())));

        let report = analyzer.run();
        let ids: Vec<&str> = report
            .entries
            .iter()
            .map(|e| e.verdict.checker_id.as_str())
            .collect();
        assert_eq!(ids, vec!["dsmcheck.EconomyOfMechanism", "dsmcheck.CodeClean"]);
        assert_eq!(report.entries[1].verdict.outcome, Outcome::Failed);
        assert_eq!(report.overall(), Outcome::Failed);
    }

    #[test]
    fn test_provider_error_fails_every_checker_and_continues() {
        let mut analyzer = Analyzer::new("a");
        analyzer
            .add_provider(Box::new(Broken))
            .add_provider(Box::new(StaticMatrix::new(
                "ok",
                Matrix::from_weights(vec![vec![0, 1], vec![0, 0]]).unwrap(),
            )))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())))
            .add_checker(BoundChecker::new(Box::new(EconomyOfMechanism::default())));

        let report = analyzer.run();
        assert_eq!(report.entries.len(), 4);
        for entry in &report.entries[..2] {
            assert_eq!(entry.provider, "nowhere");
            assert!(entry.verdict.is_failed());
            assert!(entry.verdict.message().contains("no data"));
        }
        assert_eq!(report.entries[2].verdict.outcome, Outcome::Passed);
    }

    #[test]
    fn test_provider_error_is_not_masked_by_ignored_checker() {
        let mut analyzer = Analyzer::new("a");
        analyzer
            .add_provider(Box::new(Broken))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())).ignored(true));

        let report = analyzer.run();
        assert_eq!(report.entries.len(), 1);
        assert!(!report.entries[0].ignored);
        assert_eq!(report.entries[0].status(), crate::report::Status::Failed);
        assert_eq!(report.overall(), Outcome::Failed);
    }

    #[test]
    fn test_provider_error_without_checkers() {
        let mut analyzer = Analyzer::new("a");
        analyzer.add_provider(Box::new(Broken));
        let report = analyzer.run();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].verdict.checker_id, "test.Broken");
        assert!(!report.passed());
    }

    #[test]
    fn test_ignored_checker_does_not_fail() {
        let mut analyzer = Analyzer::new("a").parallel(false);
        analyzer
            .add_provider(Box::new(StaticMatrix::new("m", cyclic())))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())).ignored(true));
        let report = analyzer.run();
        assert!(report.entries[0].verdict.is_failed());
        assert!(report.passed());
    }

    #[test]
    fn test_analysis_merges_in_order() {
        let mut first = Analyzer::new("first");
        first
            .add_provider(Box::new(StaticMatrix::new("m", cyclic())))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())));
        let mut second = Analyzer::new("second");
        second
            .add_provider(Box::new(StaticMatrix::new("m", cyclic())))
            .add_checker(BoundChecker::new(Box::new(CodeClean::default())));

        let mut analysis = Analysis::new();
        analysis.add(first).add(second);
        let report = analysis.run();
        let names: Vec<&str> = report.entries.iter().map(|e| e.analyzer.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
