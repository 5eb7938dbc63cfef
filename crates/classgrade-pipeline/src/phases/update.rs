//! Update phase: clone or pull every source and javadoc checkout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use classgrade_core::{emit_repo_failed, sync_checkout, ProcessRunner, RepoRef, RunContext};
use tracing::{debug, info, warn};

use crate::phase::{OutcomeMap, Phase, PhaseKind, PhaseOutcome};

/// Default pause before each batch of git operations.
pub const DEFAULT_DELAY_MS: u64 = 1000;

pub struct UpdatePhase {
    runner: Arc<dyn ProcessRunner>,
    delay: Duration,
    include_javadoc: bool,
    outcomes: OutcomeMap,
}

impl UpdatePhase {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            include_javadoc: true,
            outcomes: OutcomeMap::new(),
        }
    }

    async fn sync_batch(&mut self, repos: &[RepoRef], root: &Path) {
        // Give freshly created repositories a moment to become clonable.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        for repo in repos {
            let checkout = root.join(repo.name());
            let ok = match sync_checkout(self.runner.as_ref(), repo.clone_url(), &checkout).await {
                Ok((action, output)) if output.success() => {
                    debug!(repo = %repo.name(), action = action.as_str(), "Checkout synced");
                    true
                }
                Ok((action, output)) => {
                    warn!(
                        repo = %repo.name(),
                        action = action.as_str(),
                        exit_code = output.exit_code,
                        stderr = %output.stderr.trim(),
                        "git exited with a nonzero status"
                    );
                    false
                }
                Err(e) => {
                    emit_repo_failed(PhaseKind::Update.name(), repo.name(), repo.owner(), &e);
                    false
                }
            };

            let entry = self
                .outcomes
                .entry(repo.owner().to_string())
                .or_insert(PhaseOutcome::Flag(true));
            if !ok {
                *entry = PhaseOutcome::Flag(false);
            }
        }
    }
}

#[async_trait]
impl Phase for UpdatePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Update
    }

    fn configure(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        self.delay = Duration::from_millis(ctx.get_config("update.delay_ms", DEFAULT_DELAY_MS));
        self.include_javadoc = ctx.phase_enabled(PhaseKind::Javadoc.name());
        Ok(())
    }

    async fn run(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        info!(repos = ctx.source_repos().len(), "Updating source checkouts");
        self.sync_batch(ctx.source_repos(), &ctx.paths().source).await;

        if self.include_javadoc {
            info!(repos = ctx.javadoc_repos().len(), "Updating javadoc checkouts");
            self.sync_batch(ctx.javadoc_repos(), &ctx.paths().javadoc).await;
        }
        Ok(())
    }

    fn outcomes(&self) -> &OutcomeMap {
        &self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classgrade_core::fakes::{exit_with, ScriptedRunner};
    use classgrade_core::{Config, RemoteRepo, Roster};

    fn repo_ref(name: &str, owner: &str) -> RepoRef {
        RepoRef::new(
            RemoteRepo::new("cs56", name, format!("https://github.com/cs56/{name}.git"), "master", false),
            owner,
        )
        .unwrap()
    }

    fn context(dir: &Path, javadoc_enabled: bool) -> RunContext {
        let mut config = Config::empty();
        config.set("init.target", dir.to_string_lossy().to_string());
        config.set("update.delay_ms", 0);
        config.set("javadoc.enabled", javadoc_enabled);
        let mut ctx = RunContext::new(config);
        ctx.paths().ensure().unwrap();
        ctx.install_roster(Roster {
            source: vec![repo_ref("lab1_alice", "alice"), repo_ref("lab1_bob", "bob")],
            javadoc: vec![repo_ref("lab1_javadoc_alice", "alice")],
        });
        ctx
    }

    #[tokio::test]
    async fn test_clones_missing_and_pulls_existing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), true);
        std::fs::create_dir_all(ctx.paths().source.join("lab1_alice")).unwrap();

        let runner = Arc::new(ScriptedRunner::new());
        let mut phase = UpdatePhase::new(runner.clone());
        phase.configure(&ctx).unwrap();
        phase.run(&ctx).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].argv, vec!["git", "pull"]);
        assert_eq!(calls[1].argv[1], "clone");
        assert_eq!(calls[1].working_dir, ctx.paths().source);
        assert_eq!(calls[2].working_dir, ctx.paths().javadoc);
        assert_eq!(phase.outcomes().get("alice"), Some(&PhaseOutcome::Flag(true)));
    }

    #[tokio::test]
    async fn test_javadoc_batch_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), false);

        let runner = Arc::new(ScriptedRunner::new());
        let mut phase = UpdatePhase::new(runner.clone());
        phase.configure(&ctx).unwrap();
        phase.run(&ctx).await.unwrap();

        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_git_failure_recorded_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), true);

        let runner = Arc::new(ScriptedRunner::new().when(
            |spec| spec.argv.iter().any(|a| a.contains("lab1_bob")),
            |_| Ok(exit_with(128, "fatal: repository not found")),
        ));
        let mut phase = UpdatePhase::new(runner.clone());
        phase.configure(&ctx).unwrap();
        phase.run(&ctx).await.unwrap();

        assert_eq!(runner.calls().len(), 3);
        assert_eq!(phase.outcomes().get("bob"), Some(&PhaseOutcome::Flag(false)));
        assert_eq!(phase.outcomes().get("alice"), Some(&PhaseOutcome::Flag(true)));
    }

    #[test]
    fn test_delay_configured() {
        let mut config = Config::empty();
        config.set("update.delay_ms", 250);
        let ctx = RunContext::new(config);
        let mut phase = UpdatePhase::new(Arc::new(ScriptedRunner::new()));
        phase.configure(&ctx).unwrap();
        assert_eq!(phase.delay, Duration::from_millis(250));
    }
}
