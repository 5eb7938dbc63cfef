//! JUnit-under-Ant console log parser.
//!
//! Ant's `junit` task prints one announcement per suite followed, some lines
//! later, by a summary line:
//!
//! ```text
//!     [junit] Testsuite: edu.ucsb.cs56.Lab1Test
//!     [junit] Tests run: 5, Failures: 1, Errors: 2, Skipped: 0, Time elapsed: 0.04 sec
//! ```
//!
//! The parser is a two-state machine over the lines of the log. Lines that
//! match neither marker are ignored.

use crate::error::LogParseError;
use crate::test_result::TestResult;

/// Marks the line that announces a suite.
pub const SUITE_MARKER: &str = "[junit] Testsuite:";

/// Marks the per-suite summary line.
pub const SUMMARY_MARKER: &str = "[junit] Tests run:";

// Token positions in a summary line once commas are stripped:
// [junit] Tests run: N Failures: F Errors: E Skipped: S ...
const TOTAL_TOKEN: usize = 3;
const FAILURE_TOKENS: [usize; 3] = [5, 7, 9];

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserState {
    AwaitingSuite,
    AwaitingSummary(String),
}

/// Converts captured build output into an ordered list of [`TestResult`].
pub struct LogParser;

impl LogParser {
    /// Parse a full console log.
    ///
    /// A log without any suite markers yields an empty list. A second
    /// announcement before a summary replaces the pending suite name.
    pub fn parse(output: &str) -> Result<Vec<TestResult>, LogParseError> {
        let mut state = ParserState::AwaitingSuite;
        let mut results = Vec::new();

        for (idx, line) in output.lines().enumerate() {
            if let Some(pos) = line.find(SUITE_MARKER) {
                let name = line[pos + SUITE_MARKER.len()..].trim();
                state = ParserState::AwaitingSummary(name.to_string());
            } else if let Some(pos) = line.find(SUMMARY_MARKER) {
                if let ParserState::AwaitingSummary(suite) = state {
                    results.push(parse_summary(&line[pos..], idx + 1, suite)?);
                    state = ParserState::AwaitingSuite;
                }
            }
        }

        Ok(results)
    }
}

fn parse_summary(summary: &str, line: usize, suite: String) -> Result<TestResult, LogParseError> {
    let stripped: String = summary.chars().filter(|c| *c != ',').collect();
    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    let needed = FAILURE_TOKENS[FAILURE_TOKENS.len() - 1] + 1;
    if tokens.len() < needed {
        return Err(LogParseError::TruncatedSummary {
            line,
            expected: needed,
            actual: tokens.len(),
        });
    }

    let total = parse_count(tokens[TOTAL_TOKEN], line)?;
    let mut errors = 0u64;
    for idx in FAILURE_TOKENS {
        errors = errors
            .checked_add(parse_count(tokens[idx], line)?)
            .ok_or(LogParseError::CountOverflow { line })?;
    }

    TestResult::new(suite, total, errors)
}

fn parse_count(token: &str, line: usize) -> Result<u64, LogParseError> {
    token.parse::<u64>().map_err(|_| LogParseError::InvalidCount {
        line,
        token: token.to_string(),
    })
}
