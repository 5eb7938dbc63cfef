//! Summary rendering: the console table and the JSON report.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use classgrade_core::AggregationMode;
use serde::{Deserialize, Serialize};

use crate::phase::{OutcomeMap, PhaseKind, PhaseOutcome, MISSING};
use crate::pipeline::{PhaseReport, PipelineResult};

/// One summary row: a source repository and its rendered cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub repo: String,
    pub owner: String,

    /// Rendered cell per active column, in column order.
    pub cells: Vec<String>,

    /// Raw outcomes keyed by phase name; absent when nothing was recorded.
    pub outcomes: BTreeMap<String, PhaseOutcome>,
}

/// Serializable snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub aggregation: AggregationMode,

    /// Header names of the active columns.
    pub columns: Vec<String>,

    pub rows: Vec<SummaryRow>,

    /// Sync status per owner, when the update phase ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<OutcomeMap>,

    /// Phases that failed as a whole, with their error.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub phase_errors: BTreeMap<String, String>,
}

impl SummaryReport {
    pub fn from_result(result: &PipelineResult) -> Self {
        let columns = result.columns();
        let rows = result
            .roster
            .source
            .iter()
            .map(|repo| {
                let mut outcomes = BTreeMap::new();
                let cells = columns
                    .iter()
                    .map(|report| {
                        let outcome = report.outcomes.get(repo.owner());
                        if let Some(outcome) = outcome {
                            outcomes.insert(report.kind.name().to_string(), outcome.clone());
                        }
                        render_cell(outcome, result.aggregation)
                    })
                    .collect();
                SummaryRow {
                    repo: repo.name().to_string(),
                    owner: repo.owner().to_string(),
                    cells,
                    outcomes,
                }
            })
            .collect();

        Self {
            run_id: result.run_id.clone(),
            generated_at: Utc::now(),
            duration_ms: result.duration_ms,
            aggregation: result.aggregation,
            columns: columns.iter().filter_map(|r| r.kind.column()).map(str::to_string).collect(),
            rows,
            update: result
                .phase(PhaseKind::Update)
                .filter(|r| r.active)
                .map(|r| r.outcomes.clone()),
            phase_errors: result
                .phases
                .iter()
                .filter_map(|r: &PhaseReport| {
                    r.error.as_ref().map(|e| (r.kind.name().to_string(), e.clone()))
                })
                .collect(),
        }
    }

    /// Header line followed by one line per source repository.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let mut header = vec!["Repo", "Owner"];
        header.extend(self.columns.iter().map(String::as_str));
        out.push_str(&header.join(" "));
        out.push('\n');

        for row in &self.rows {
            let mut line = vec![row.repo.as_str(), row.owner.as_str()];
            line.extend(row.cells.iter().map(String::as_str));
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> classgrade_core::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn render_cell(outcome: Option<&PhaseOutcome>, mode: AggregationMode) -> String {
    outcome.map_or_else(|| MISSING.to_string(), |o| o.render(mode))
}

/// Render the console summary table for a finished run.
pub fn render_table(result: &PipelineResult) -> String {
    SummaryReport::from_result(result).to_table()
}

/// Write the JSON report for a finished run to `path`.
pub fn write_report_json(result: &PipelineResult, path: &Path) -> classgrade_core::Result<()> {
    SummaryReport::from_result(result).write_json(path)
}
