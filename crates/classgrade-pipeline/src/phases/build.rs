//! Build phase: compile every source checkout.

use std::sync::Arc;

use async_trait::async_trait;
use classgrade_core::{emit_repo_failed, ProcessRunner, RunContext};
use tracing::debug;

use crate::phase::{OutcomeMap, Phase, PhaseKind, PhaseOutcome};
use crate::tool::{BuildTarget, BuildTool};

pub struct BuildPhase {
    runner: Arc<dyn ProcessRunner>,
    tool: Option<BuildTool>,
    outcomes: OutcomeMap,
}

impl BuildPhase {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            tool: None,
            outcomes: OutcomeMap::new(),
        }
    }
}

#[async_trait]
impl Phase for BuildPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Build
    }

    fn configure(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        self.tool = Some(BuildTool::from_context(ctx, BuildTarget::Compile));
        Ok(())
    }

    async fn run(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        let tool = self
            .tool
            .clone()
            .unwrap_or_else(|| BuildTool::from_context(ctx, BuildTarget::Compile));

        for repo in ctx.source_repos() {
            let checkout = ctx.paths().source_checkout(repo);
            let built = if !checkout.is_dir() {
                emit_repo_failed(self.kind().name(), repo.name(), repo.owner(), &"no local checkout");
                false
            } else {
                match tool.run_in(self.runner.as_ref(), &checkout).await {
                    Ok(output) => {
                        debug!(repo = %repo.name(), exit_code = output.exit_code, "Build finished");
                        output.success()
                    }
                    Err(e) => {
                        emit_repo_failed(self.kind().name(), repo.name(), repo.owner(), &e);
                        false
                    }
                }
            };
            self.outcomes
                .insert(repo.owner().to_string(), PhaseOutcome::Flag(built));
        }
        Ok(())
    }

    fn outcomes(&self) -> &OutcomeMap {
        &self.outcomes
    }
}
