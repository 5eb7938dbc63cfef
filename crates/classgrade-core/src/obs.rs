//! Structured observability hooks for grading run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for run, phase, and per-repository events
//!
//! Events are emitted at `info!` level except per-repository failures, which
//! are warnings. Filter with `RUST_LOG`; pass `--json` for JSON output.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("4f0c...");
/// // every event below carries run_id = "4f0c..."
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("classgrade.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started for an organization.
pub fn emit_run_started(run_id: &str, org: &str) {
    info!(event = "run.started", run_id = %run_id, org = %org);
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, repos: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        repos = repos,
    );
}

/// Emit event: a phase is about to run.
pub fn emit_phase_started(phase: &str, repos: usize) {
    info!(event = "phase.started", phase = %phase, repos = repos);
}

/// Emit event: a phase was disabled by configuration.
pub fn emit_phase_skipped(phase: &str, reason: &str) {
    info!(event = "phase.skipped", phase = %phase, reason = %reason);
}

/// Emit event: a phase completed.
pub fn emit_phase_finished(phase: &str, duration_ms: u64, recorded: usize, failed: usize) {
    info!(
        event = "phase.finished",
        phase = %phase,
        duration_ms = duration_ms,
        recorded = recorded,
        failed = failed,
    );
}

/// Emit event: one repository failed within a phase (warning level).
pub fn emit_repo_failed(phase: &str, repo: &str, owner: &str, reason: &dyn std::fmt::Display) {
    warn!(
        event = "repo.failed",
        phase = %phase,
        repo = %repo,
        owner = %owner,
        reason = %reason,
    );
}
