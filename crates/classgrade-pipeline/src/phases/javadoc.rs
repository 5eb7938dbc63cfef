//! Javadoc phase: check that documentation repositories publish from the
//! pages branch and are public.

use async_trait::async_trait;
use classgrade_core::{RepoRef, RunContext};
use tracing::debug;

use crate::phase::{OutcomeMap, Phase, PhaseKind, PhaseOutcome};

/// Branch documentation must be served from.
pub const DEFAULT_PAGES_BRANCH: &str = "gh-pages";

pub struct JavadocPhase {
    branch: String,
    outcomes: OutcomeMap,
}

impl JavadocPhase {
    pub fn new() -> Self {
        Self {
            branch: DEFAULT_PAGES_BRANCH.to_string(),
            outcomes: OutcomeMap::new(),
        }
    }

    fn is_published(&self, repo: &RepoRef) -> bool {
        repo.default_branch() == self.branch && !repo.is_private()
    }
}

impl Default for JavadocPhase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Phase for JavadocPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Javadoc
    }

    fn configure(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        self.branch = ctx.get_config("javadoc.branch", DEFAULT_PAGES_BRANCH.to_string());
        Ok(())
    }

    async fn run(&mut self, ctx: &RunContext) -> anyhow::Result<()> {
        for repo in ctx.javadoc_repos() {
            let published = self.is_published(repo);
            debug!(
                repo = %repo.name(),
                branch = %repo.default_branch(),
                private = repo.is_private(),
                published,
                "Checked javadoc repository"
            );
            self.outcomes
                .insert(repo.owner().to_string(), PhaseOutcome::Flag(published));
        }
        Ok(())
    }

    fn outcomes(&self) -> &OutcomeMap {
        &self.outcomes
    }
}
