//! Phase definitions and per-phase outcomes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use classgrade_core::{AggregationMode, RunContext, TestResult, TestSummary};
use serde::{Deserialize, Serialize};

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Resolve members and repositories; always runs first.
    Init,

    /// git clone / git pull every checkout
    Update,

    /// `ant compile`
    Build,

    /// `ant test`, parsed into suite results
    Test,

    /// Documentation repository publishing convention
    Javadoc,

    /// `ant test` with an instructor test injected
    Validate,
}

impl PhaseKind {
    /// Every phase after init, in execution order.
    pub const ORDERED: [PhaseKind; 5] = [
        PhaseKind::Update,
        PhaseKind::Build,
        PhaseKind::Test,
        PhaseKind::Javadoc,
        PhaseKind::Validate,
    ];

    /// Config section name.
    pub fn name(&self) -> &'static str {
        match self {
            PhaseKind::Init => "init",
            PhaseKind::Update => "update",
            PhaseKind::Build => "build",
            PhaseKind::Test => "test",
            PhaseKind::Javadoc => "javadoc",
            PhaseKind::Validate => "validate",
        }
    }

    /// Summary table header, for phases that contribute a column.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            PhaseKind::Init | PhaseKind::Update => None,
            PhaseKind::Build => Some("BuildStatus"),
            PhaseKind::Test => Some("StudentTests"),
            PhaseKind::Javadoc => Some("JavadocStatus"),
            PhaseKind::Validate => Some("InstructorTests"),
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Test run outcome for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Build tool exited zero.
    pub success: bool,

    /// Parsed suites; `None` when the run failed or its log was unreadable.
    pub results: Option<Vec<TestResult>>,

    /// Suite the results are restricted to, for injected tests.
    pub suite: Option<String>,
}

impl TestOutcome {
    pub fn failed(suite: Option<String>) -> Self {
        Self {
            success: false,
            results: None,
            suite,
        }
    }

    /// `passed/total`, or `-` when no trustworthy counts exist.
    pub fn render(&self, mode: AggregationMode) -> String {
        match (&self.results, self.success) {
            (Some(results), true) => {
                TestSummary::aggregate(results, self.suite.as_deref(), mode).to_string()
            }
            _ => MISSING.to_string(),
        }
    }
}

/// Value a phase records for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    Flag(bool),
    Tests(TestOutcome),
}

impl PhaseOutcome {
    pub fn render(&self, mode: AggregationMode) -> String {
        match self {
            PhaseOutcome::Flag(value) => value.to_string(),
            PhaseOutcome::Tests(outcome) => outcome.render(mode),
        }
    }

    /// Whether this outcome counts as a failure in logs and reports.
    pub fn is_failure(&self) -> bool {
        match self {
            PhaseOutcome::Flag(value) => !value,
            PhaseOutcome::Tests(outcome) => !outcome.success,
        }
    }
}

/// Placeholder for an owner with no recorded outcome.
pub const MISSING: &str = "-";

/// Outcomes keyed by owner login.
pub type OutcomeMap = BTreeMap<String, PhaseOutcome>;

/// One toggleable stage of the grading pipeline.
///
/// Phases read the shared [`RunContext`] and keep their own outcome map.
/// Per-repository failures are recorded, never returned; an `Err` from
/// `configure` or `run` means the phase as a whole could not proceed.
#[async_trait]
pub trait Phase: Send + Sync {
    fn kind(&self) -> PhaseKind;

    /// Whether this phase runs (and contributes a summary column).
    fn is_active(&self, ctx: &RunContext) -> bool {
        ctx.phase_enabled(self.kind().name())
    }

    /// Read phase settings from the context.
    fn configure(&mut self, ctx: &RunContext) -> anyhow::Result<()>;

    /// Process every repository the phase is responsible for.
    async fn run(&mut self, ctx: &RunContext) -> anyhow::Result<()>;

    fn outcomes(&self) -> &OutcomeMap;
}
