//! Pipeline orchestration: init, then every toggleable phase in order.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use classgrade_core::{
    emit_phase_finished, emit_phase_skipped, emit_phase_started, emit_run_finished,
    emit_run_started, AggregationMode, Config, GraderError, ProcessRunner, RepoHost, Roster,
    RunContext, RunSpan,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::phase::{OutcomeMap, Phase, PhaseKind};
use crate::phases::{BuildPhase, InitPhase, JavadocPhase, TestPhase, UpdatePhase, ValidatePhase};

/// What one phase produced.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub kind: PhaseKind,

    /// Whether the phase ran; inactive phases contribute no column.
    pub active: bool,

    pub outcomes: OutcomeMap,

    /// Set when the phase as a whole could not complete.
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl PhaseReport {
    fn skipped(kind: PhaseKind) -> Self {
        Self {
            kind,
            active: false,
            outcomes: OutcomeMap::new(),
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failure()).count()
    }
}

/// Result of a complete grading run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Repositories discovered by init.
    pub roster: Roster,

    /// Every phase after init, in execution order.
    pub phases: Vec<PhaseReport>,

    /// How test error counts are combined when rendering.
    pub aggregation: AggregationMode,
}

impl PipelineResult {
    pub fn phase(&self, kind: PhaseKind) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    /// Active phases that contribute a summary column, in column order.
    pub fn columns(&self) -> Vec<&PhaseReport> {
        self.phases
            .iter()
            .filter(|p| p.active && p.kind.column().is_some())
            .collect()
    }

    /// Phases that ended with an error.
    pub fn errored_phases(&self) -> Vec<&PhaseReport> {
        self.phases.iter().filter(|p| p.error.is_some()).collect()
    }
}

/// Grading pipeline orchestrator.
pub struct Pipeline {
    host: Arc<dyn RepoHost>,
    runner: Arc<dyn ProcessRunner>,
}

impl Pipeline {
    pub fn new(host: Arc<dyn RepoHost>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { host, runner }
    }

    /// Every phase after init, in execution order.
    fn phases(&self) -> Vec<Box<dyn Phase>> {
        vec![
            Box::new(UpdatePhase::new(self.runner.clone())),
            Box::new(BuildPhase::new(self.runner.clone())),
            Box::new(TestPhase::new(self.runner.clone())),
            Box::new(JavadocPhase::new()),
            Box::new(ValidatePhase::new(self.runner.clone())),
        ]
    }

    /// Execute a grading run.
    ///
    /// Configuration and init errors are fatal and returned. A phase that
    /// fails to configure or run is logged and recorded in its report; the
    /// remaining phases still run.
    pub async fn run(&self, config: Config) -> anyhow::Result<PipelineResult> {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        let _span = RunSpan::enter(&run_id);

        emit_run_started(&run_id, config.get_str("init.org").unwrap_or_default());

        let aggregation = match config.get_str("test.aggregate_errors") {
            None => AggregationMode::default(),
            Some(raw) => raw.parse().map_err(|reason| GraderError::InvalidConfig {
                key: "test.aggregate_errors".to_string(),
                reason,
            })?,
        };

        let mut ctx = RunContext::new(config);
        let init_start = Instant::now();
        emit_phase_started(PhaseKind::Init.name(), 0);
        InitPhase::new(self.host.clone()).run(&mut ctx).await?;
        emit_phase_finished(
            PhaseKind::Init.name(),
            init_start.elapsed().as_millis() as u64,
            ctx.source_repos().len() + ctx.javadoc_repos().len(),
            0,
        );

        let mut reports = Vec::new();
        for mut phase in self.phases() {
            let kind = phase.kind();
            if !phase.is_active(&ctx) {
                emit_phase_skipped(kind.name(), "disabled by configuration");
                reports.push(PhaseReport::skipped(kind));
                continue;
            }

            let phase_start = Instant::now();
            emit_phase_started(kind.name(), ctx.source_repos().len());

            let result = match phase.configure(&ctx) {
                Ok(()) => phase.run(&ctx).await,
                Err(e) => Err(e),
            };
            let error = result.err().map(|e| {
                error!(phase = %kind, error = %e, "Phase failed");
                format!("{e:#}")
            });

            let report = PhaseReport {
                kind,
                active: true,
                outcomes: phase.outcomes().clone(),
                error,
                duration_ms: phase_start.elapsed().as_millis() as u64,
            };
            emit_phase_finished(
                kind.name(),
                report.duration_ms,
                report.outcomes.len(),
                report.failed_count(),
            );
            reports.push(report);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        emit_run_finished(&run_id, duration_ms, ctx.source_repos().len());
        info!(run_id = %run_id, duration_ms, "Grading run complete");

        Ok(PipelineResult {
            run_id,
            started_at,
            duration_ms,
            roster: ctx.roster().clone(),
            phases: reports,
            aggregation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classgrade_core::fakes::{MemoryHost, ScriptedRunner};

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::empty();
        config.set("init.org", "cs56");
        config.set("init.source_prefix", "lab1_");
        config.set("init.target", dir.to_string_lossy().to_string());
        config.set("update.delay_ms", 0);
        config.set("pipeline.echo_output", false);
        config
    }

    #[tokio::test]
    async fn test_empty_org_runs_every_phase() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(Arc::new(MemoryHost::new()), Arc::new(ScriptedRunner::new()));

        let result = pipeline.run(config(dir.path())).await.unwrap();
        assert!(!result.run_id.is_empty());
        assert!(result.roster.is_empty());
        assert_eq!(result.phases.len(), PhaseKind::ORDERED.len());
        let kinds: Vec<PhaseKind> = result.phases.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, PhaseKind::ORDERED.to_vec());
        // Validate has no test class configured.
        assert!(!result.phase(PhaseKind::Validate).unwrap().active);
        assert_eq!(result.columns().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_aggregation_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.set("test.aggregate_errors", "median");
        let pipeline = Pipeline::new(Arc::new(MemoryHost::new()), Arc::new(ScriptedRunner::new()));
        assert!(pipeline.run(config).await.is_err());
    }

    #[tokio::test]
    async fn test_phase_error_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.set("validate.test_class", "/no/such/Lab1Test.java");
        let pipeline = Pipeline::new(Arc::new(MemoryHost::new()), Arc::new(ScriptedRunner::new()));

        let result = pipeline.run(config).await.unwrap();
        let validate = result.phase(PhaseKind::Validate).unwrap();
        assert!(validate.active);
        assert!(validate.error.as_deref().unwrap().contains("not found"));
        assert_eq!(result.errored_phases().len(), 1);
    }
}
