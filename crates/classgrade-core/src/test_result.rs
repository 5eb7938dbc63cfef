//! Parsed test-suite results and their per-repository aggregate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogParseError;

/// One suite's counts as reported by the build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    suite: String,
    total: u64,
    errors: u64,
}

impl TestResult {
    /// Build a result; `errors` may not exceed `total`.
    pub fn new(suite: impl Into<String>, total: u64, errors: u64) -> Result<Self, LogParseError> {
        let suite = suite.into();
        if errors > total {
            return Err(LogParseError::InconsistentCounts {
                suite,
                total,
                errors,
            });
        }
        Ok(Self {
            suite,
            total,
            errors,
        })
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn passed(&self) -> u64 {
        self.total - self.errors
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.passed(), self.total)
    }
}

/// How error counts combine across suites when summarising one repository.
///
/// `LastSuite` reproduces historical reports, which summed totals but kept
/// only the last suite's error count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    Sum,
    LastSuite,
}

impl FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationMode::Sum),
            "last" | "last_suite" => Ok(AggregationMode::LastSuite),
            other => Err(format!("unknown aggregation mode: {other}")),
        }
    }
}

/// Aggregate over a repository's suites, rendered as `passed/total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: u64,
    pub errors: u64,
}

impl TestSummary {
    /// Combine `results`, optionally restricted to one suite name.
    pub fn aggregate(results: &[TestResult], suite: Option<&str>, mode: AggregationMode) -> Self {
        let mut summary = TestSummary::default();
        for result in results
            .iter()
            .filter(|r| suite.map_or(true, |name| r.suite() == name))
        {
            summary.total = summary.total.saturating_add(result.total());
            summary.errors = match mode {
                AggregationMode::Sum => summary.errors.saturating_add(result.errors()),
                AggregationMode::LastSuite => result.errors(),
            };
        }
        summary
    }

    pub fn passed(&self) -> u64 {
        self.total.saturating_sub(self.errors)
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.passed(), self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(suite: &str, total: u64, errors: u64) -> TestResult {
        TestResult::new(suite, total, errors).unwrap()
    }

    #[test]
    fn test_display_passed_over_total() {
        assert_eq!(result("Foo", 10, 1).to_string(), "9/10");
        assert_eq!(result("Empty", 0, 0).to_string(), "0/0");
    }

    #[test]
    fn test_errors_cannot_exceed_total() {
        let err = TestResult::new("Foo", 2, 3).unwrap_err();
        assert!(matches!(err, LogParseError::InconsistentCounts { .. }));
    }

    #[test]
    fn test_aggregate_sums_errors() {
        let results = vec![result("A", 5, 2), result("B", 10, 1)];
        let summary = TestSummary::aggregate(&results, None, AggregationMode::Sum);
        assert_eq!(summary.total, 15);
        assert_eq!(summary.errors, 3);
        assert_eq!(summary.to_string(), "12/15");
    }

    #[test]
    fn test_aggregate_last_suite_errors() {
        let results = vec![result("A", 5, 2), result("B", 10, 1)];
        let summary = TestSummary::aggregate(&results, None, AggregationMode::LastSuite);
        assert_eq!(summary.total, 15);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.to_string(), "14/15");
    }

    #[test]
    fn test_aggregate_saturates_huge_totals() {
        let results = vec![result("A", u64::MAX, u64::MAX), result("B", 10, 10)];
        let summary = TestSummary::aggregate(&results, None, AggregationMode::Sum);
        assert_eq!(summary.total, u64::MAX);
        assert_eq!(summary.errors, u64::MAX);
        assert_eq!(summary.passed(), 0);
    }

    #[test]
    fn test_aggregate_filters_by_suite() {
        let results = vec![result("StudentTest", 5, 0), result("Lab1Test", 8, 3)];
        let summary = TestSummary::aggregate(&results, Some("Lab1Test"), AggregationMode::Sum);
        assert_eq!(summary.to_string(), "5/8");
    }

    #[test]
    fn test_aggregate_no_matching_suite() {
        let results = vec![result("StudentTest", 5, 0)];
        let summary = TestSummary::aggregate(&results, Some("Lab1Test"), AggregationMode::Sum);
        assert_eq!(summary.to_string(), "0/0");
    }

    #[test]
    fn test_aggregation_mode_from_str() {
        assert_eq!("sum".parse::<AggregationMode>(), Ok(AggregationMode::Sum));
        assert_eq!("LAST".parse::<AggregationMode>(), Ok(AggregationMode::LastSuite));
        assert!("median".parse::<AggregationMode>().is_err());
    }
}
