//! Git working-copy synchronisation.

use std::path::Path;

use crate::error::Result;
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};

/// What [`sync_checkout`] did to the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Cloned => "clone",
            SyncAction::Pulled => "pull",
        }
    }
}

/// `git clone <url> <dir-name>`, run from the destination's parent.
pub fn clone_command(url: &str, dest: &Path) -> CommandSpec {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let target = dest
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| dest.to_string_lossy().to_string());
    CommandSpec::new(
        "git_clone",
        ["git".to_string(), "clone".to_string(), url.to_string(), target],
        parent,
    )
}

/// `git pull` inside an existing checkout.
pub fn pull_command(checkout: &Path) -> CommandSpec {
    CommandSpec::new("git_pull", ["git", "pull"], checkout)
}

/// Pull when `checkout` exists, clone into it otherwise.
///
/// A nonzero git exit status is returned as data, not as an error; only a
/// failure to run git at all is an `Err`.
pub async fn sync_checkout(
    runner: &dyn ProcessRunner,
    url: &str,
    checkout: &Path,
) -> Result<(SyncAction, CommandOutput)> {
    if checkout.exists() {
        let output = runner.run(&pull_command(checkout)).await?;
        Ok((SyncAction::Pulled, output))
    } else {
        let output = runner.run(&clone_command(url, checkout)).await?;
        Ok((SyncAction::Cloned, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    #[test]
    fn test_clone_command_runs_in_parent() {
        let spec = clone_command(
            "https://github.com/cs56/lab1_alice.git",
            Path::new("repos/source/lab1_alice"),
        );
        assert_eq!(spec.argv[0], "git");
        assert_eq!(spec.argv[1], "clone");
        assert_eq!(spec.argv[3], "lab1_alice");
        assert_eq!(spec.working_dir, Path::new("repos/source"));
    }

    #[test]
    fn test_clone_command_bare_dest() {
        let spec = clone_command("url", Path::new("lab1_alice"));
        assert_eq!(spec.working_dir, Path::new("."));
    }

    #[tokio::test]
    async fn test_sync_clones_missing_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let checkout = dir.path().join("lab1_alice");

        let (action, output) = sync_checkout(&runner, "url", &checkout).await.unwrap();
        assert_eq!(action, SyncAction::Cloned);
        assert!(output.success());
        assert_eq!(runner.calls()[0].argv[1], "clone");
    }

    #[tokio::test]
    async fn test_sync_pulls_existing_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();

        let (action, _) = sync_checkout(&runner, "url", dir.path()).await.unwrap();
        assert_eq!(action, SyncAction::Pulled);
        assert_eq!(runner.calls()[0].argv, vec!["git", "pull"]);
        assert_eq!(runner.calls()[0].working_dir, dir.path());
    }
}
