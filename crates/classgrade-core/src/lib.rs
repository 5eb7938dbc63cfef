//! Classgrade Core Library
//!
//! Domain model and external collaborators for the grading pipeline:
//! configuration lookup, the access-token credential, repository snapshots,
//! the JUnit log parser, and the host, git, and process seams.

pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod fakes;
pub mod host;
pub mod log_parser;
pub mod obs;
pub mod process;
pub mod repo;
pub mod telemetry;
pub mod test_result;
pub mod vcs;

pub use config::Config;
pub use context::{CheckoutPaths, RunContext, DEFAULT_TARGET};
pub use credential::{Credential, DEFAULT_TOKEN_FILE};
pub use error::{GraderError, LogParseError, Result};
pub use host::{GithubClient, RepoHost, GITHUB_API_URL};
pub use log_parser::LogParser;
pub use process::{CommandOutput, CommandSpec, ProcessRunner, TokioProcessRunner};
pub use repo::{RemoteRepo, RepoRef, Roster};
pub use test_result::{AggregationMode, TestResult, TestSummary};
pub use vcs::{sync_checkout, SyncAction};

pub use obs::{
    emit_phase_finished, emit_phase_skipped, emit_phase_started, emit_repo_failed,
    emit_run_finished, emit_run_started, RunSpan,
};
pub use telemetry::init_tracing;

/// Classgrade version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
