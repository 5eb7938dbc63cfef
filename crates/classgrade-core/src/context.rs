//! Run-wide shared state: configuration, checkout roots, and the roster.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::repo::{RepoRef, Roster};

/// Default root for all checkouts.
pub const DEFAULT_TARGET: &str = "repos";

/// Filesystem layout for one run: `<target>/source/<repo>` and
/// `<target>/javadoc/<repo>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPaths {
    pub target: PathBuf,
    pub source: PathBuf,
    pub javadoc: PathBuf,
}

impl CheckoutPaths {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        Self {
            source: target.join("source"),
            javadoc: target.join("javadoc"),
            target,
        }
    }

    /// Create the source and javadoc roots if missing.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.source)?;
        std::fs::create_dir_all(&self.javadoc)
    }

    pub fn source_checkout(&self, repo: &RepoRef) -> PathBuf {
        self.source.join(repo.name())
    }

    pub fn javadoc_checkout(&self, repo: &RepoRef) -> PathBuf {
        self.javadoc.join(repo.name())
    }
}

/// State shared by every phase of one run.
///
/// Built before any phase executes. Only the init phase installs the roster;
/// every other phase reads it.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: Config,
    paths: CheckoutPaths,
    roster: Roster,
}

impl RunContext {
    pub fn new(config: Config) -> Self {
        let target: String = config.get_or("init.target", DEFAULT_TARGET.to_string());
        Self {
            paths: CheckoutPaths::new(target),
            config,
            roster: Roster::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dotted-path lookup that yields `default` when any segment is absent.
    pub fn get_config<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.config.get_or(path, default)
    }

    /// `<name>.enabled`, defaulting to true for unconfigured phases.
    pub fn phase_enabled(&self, name: &str) -> bool {
        self.config.get_bool(&format!("{name}.enabled"), true)
    }

    pub fn paths(&self) -> &CheckoutPaths {
        &self.paths
    }

    pub fn target(&self) -> &Path {
        &self.paths.target
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn source_repos(&self) -> &[RepoRef] {
        &self.roster.source
    }

    pub fn javadoc_repos(&self) -> &[RepoRef] {
        &self.roster.javadoc
    }

    /// Replace the repository lists. Called once by the init phase.
    pub fn install_roster(&mut self, roster: Roster) {
        self.roster = roster;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RemoteRepo;

    #[test]
    fn test_phase_enabled_defaults_true() {
        let ctx = RunContext::new(Config::empty());
        assert!(ctx.phase_enabled("build"));
        assert!(ctx.phase_enabled("no_such_phase"));
    }

    #[test]
    fn test_phase_disabled_by_config() {
        let mut config = Config::empty();
        config.set("javadoc.enabled", false);
        let ctx = RunContext::new(config);
        assert!(!ctx.phase_enabled("javadoc"));
        assert!(ctx.phase_enabled("test"));
    }

    #[test]
    fn test_target_paths() {
        let mut config = Config::empty();
        config.set("init.target", "/tmp/grading");
        let ctx = RunContext::new(config);
        assert_eq!(ctx.paths().source, PathBuf::from("/tmp/grading/source"));
        assert_eq!(ctx.paths().javadoc, PathBuf::from("/tmp/grading/javadoc"));

        let default_ctx = RunContext::new(Config::empty());
        assert_eq!(default_ctx.target(), Path::new(DEFAULT_TARGET));
    }

    #[test]
    fn test_checkout_paths_per_repo() {
        let paths = CheckoutPaths::new("repos");
        let repo = RepoRef::new(
            RemoteRepo::new("cs56", "lab1_alice", "url", "master", false),
            "alice",
        )
        .unwrap();
        assert_eq!(paths.source_checkout(&repo), PathBuf::from("repos/source/lab1_alice"));
        assert_eq!(paths.javadoc_checkout(&repo), PathBuf::from("repos/javadoc/lab1_alice"));
    }

    #[test]
    fn test_ensure_creates_roots() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CheckoutPaths::new(dir.path().join("repos"));
        paths.ensure().unwrap();
        assert!(paths.source.is_dir());
        assert!(paths.javadoc.is_dir());
    }

    #[test]
    fn test_get_config_default() {
        let ctx = RunContext::new(Config::empty());
        assert_eq!(ctx.get_config("update.delay_ms", 1000u64), 1000);
    }
}
