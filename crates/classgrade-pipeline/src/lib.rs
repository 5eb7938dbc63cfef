//! Classgrade Pipeline - phased grading of student repositories
//!
//! Provides a grading pipeline that:
//! - Discovers an organization's lab repositories and their owners
//! - Clones or pulls every checkout, then compiles and tests it
//! - Checks documentation repositories and runs an instructor test suite
//! - Renders one summary row per student repository

pub mod phase;
pub mod phases;
pub mod pipeline;
pub mod summary;
pub mod tool;

// Re-export key types
pub use phase::{OutcomeMap, Phase, PhaseKind, PhaseOutcome, TestOutcome, MISSING};
pub use phases::{
    BuildPhase, InitPhase, InitSettings, JavadocPhase, OwnerSource, TestPhase, UpdatePhase,
    ValidatePhase,
};
pub use pipeline::{PhaseReport, Pipeline, PipelineResult};
pub use summary::{render_table, write_report_json, SummaryReport, SummaryRow};
pub use tool::{BuildTarget, BuildTool};
