//! Validate phase: run an instructor-supplied test class inside every
//! student checkout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use classgrade_core::{emit_repo_failed, ProcessRunner, RepoRef, RunContext};
use tracing::{debug, warn};

use crate::phase::{OutcomeMap, Phase, PhaseKind, PhaseOutcome, TestOutcome};
use crate::phases::test::outcome_from_output;
use crate::tool::{BuildTarget, BuildTool};

/// Default source directory inside a checkout.
pub const DEFAULT_SRC_DIR: &str = "src";

/// Suffix for a student file moved aside while an injected file is in place.
const BACKUP_SUFFIX: &str = ".classgrade-backup";

/// A file copied into a checkout; removed again when dropped.
///
/// A file already at the destination is moved aside first and put back on
/// drop, so the checkout ends up exactly as it was found.
#[derive(Debug)]
pub struct InjectedFile {
    path: PathBuf,
    backup: Option<PathBuf>,
}

impl InjectedFile {
    pub async fn copy(source: &Path, dest_dir: &Path) -> std::io::Result<Self> {
        let file_name = source.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no file name", source.display()),
            )
        })?;
        let path = dest_dir.join(file_name);

        let backup = if tokio::fs::symlink_metadata(&path).await.is_ok() {
            let mut backup_name = file_name.to_os_string();
            backup_name.push(BACKUP_SUFFIX);
            let backup = dest_dir.join(backup_name);
            tokio::fs::rename(&path, &backup).await?;
            debug!(path = %path.display(), "Moved existing file aside");
            Some(backup)
        } else {
            None
        };

        // Built before the copy so a failed copy still restores the backup.
        let injected = Self { path, backup };
        tokio::fs::copy(source, &injected.path).await?;
        Ok(injected)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InjectedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove injected file");
            }
        }
        if let Some(backup) = self.backup.take() {
            if let Err(e) = std::fs::rename(&backup, &self.path) {
                warn!(
                    backup = %backup.display(),
                    path = %self.path.display(),
                    error = %e,
                    "Failed to restore the original file"
                );
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ValidateSettings {
    test_class: PathBuf,
    suite: String,
    src_dir: String,
    tool: BuildTool,
}

pub struct ValidatePhase {
    runner: Arc<dyn ProcessRunner>,
    settings: Option<ValidateSettings>,
    outcomes: OutcomeMap,
}

impl ValidatePhase {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            settings: None,
            outcomes: OutcomeMap::new(),
        }
    }

    async fn validate_repo(&self, settings: &ValidateSettings, ctx: &RunContext, repo: &RepoRef) -> TestOutcome {
        let suite = Some(settings.suite.clone());
        let checkout = ctx.paths().source_checkout(repo);
        let src = checkout.join(&settings.src_dir);
        if !src.is_dir() {
            emit_repo_failed(
                self.kind().name(),
                repo.name(),
                repo.owner(),
                &format!("missing source directory {}", src.display()),
            );
            return TestOutcome::failed(suite);
        }

        let injected = match InjectedFile::copy(&settings.test_class, &src).await {
            Ok(injected) => injected,
            Err(e) => {
                emit_repo_failed(self.kind().name(), repo.name(), repo.owner(), &e);
                return TestOutcome::failed(suite);
            }
        };
        debug!(path = %injected.path().display(), "Injected instructor test");

        let outcome = match settings.tool.run_in(self.runner.as_ref(), &checkout).await {
            Ok(output) => outcome_from_output(&output, suite.as_deref()),
            Err(e) => {
                emit_repo_failed(self.kind().name(), repo.name(), repo.owner(), &e);
                TestOutcome::failed(suite)
            }
        };
        drop(injected);
        outcome
    }
}

#[async_trait]
impl Phase for ValidatePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Validate
    }

    /// Enabled and given an instructor test class.
    fn is_active(&self, ctx: &RunContext) -> bool {
        ctx.phase_enabled(self.kind().name())
            && ctx
                .config()
                .get_str("validate.test_class")
                .is_some_and(|s| !s.trim().is_empty())
    }

    fn configure(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        let test_class = PathBuf::from(ctx.config().require_str("validate.test_class")?);
        if !test_class.is_file() {
            bail!("instructor test class {} not found", test_class.display());
        }
        let suite = test_class
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .context("instructor test class has no file name")?;

        self.settings = Some(ValidateSettings {
            test_class,
            suite,
            src_dir: ctx.get_config("validate.src_dir", DEFAULT_SRC_DIR.to_string()),
            tool: BuildTool::from_context(ctx, BuildTarget::Test),
        });
        Ok(())
    }

    async fn run(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        let settings = self
            .settings
            .clone()
            .context("validate phase was not configured")?;

        for repo in ctx.source_repos() {
            let outcome = self.validate_repo(&settings, ctx, repo).await;
            self.outcomes
                .insert(repo.owner().to_string(), PhaseOutcome::Tests(outcome));
        }
        Ok(())
    }

    fn outcomes(&self) -> &OutcomeMap {
        &self.outcomes
    }
}
