//! In-memory fakes for the external collaborators (testing only)
//!
//! Provides `MemoryHost` and `ScriptedRunner`, which satisfy the
//! [`RepoHost`] and [`ProcessRunner`] contracts without network access,
//! git, or a build tool.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GraderError, Result};
use crate::host::RepoHost;
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};
use crate::repo::RemoteRepo;

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// Organization listings held in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    members: HashMap<String, Vec<String>>,
    repos: HashMap<String, Vec<RemoteRepo>>,
    contributors: HashMap<String, String>,
    unreachable: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, org: &str, login: &str) -> Self {
        self.members
            .entry(org.to_string())
            .or_default()
            .push(login.to_string());
        self
    }

    pub fn with_repo(mut self, org: &str, repo: RemoteRepo) -> Self {
        self.repos.entry(org.to_string()).or_default().push(repo);
        self
    }

    /// Record `login` as the top contributor of `full_name`.
    pub fn with_contributor(mut self, full_name: &str, login: &str) -> Self {
        self.contributors
            .insert(full_name.to_string(), login.to_string());
        self
    }

    /// Make every call fail, as an unreachable API would.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            return Err(GraderError::Host("host unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RepoHost for MemoryHost {
    async fn list_members(&self, org: &str) -> Result<Vec<String>> {
        self.check_reachable()?;
        Ok(self.members.get(org).cloned().unwrap_or_default())
    }

    async fn list_repos(&self, org: &str) -> Result<Vec<RemoteRepo>> {
        self.check_reachable()?;
        Ok(self.repos.get(org).cloned().unwrap_or_default())
    }

    async fn primary_contributor(&self, repo: &RemoteRepo) -> Result<Option<String>> {
        self.check_reachable()?;
        Ok(self.contributors.get(&repo.full_name).cloned())
    }
}

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

type Matcher = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;
type Handler = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync>;

/// Process runner that answers from a script and records every call.
///
/// Rules are tried in insertion order; the first matching rule answers.
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(Matcher, Handler)>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching commands with `handler`.
    pub fn when<M, H>(mut self, matcher: M, handler: H) -> Self
    where
        M: Fn(&CommandSpec) -> bool + Send + Sync + 'static,
        H: Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        self.rules.push((Box::new(matcher), Box::new(handler)));
        self
    }

    /// Answer commands whose argv equals `argv` and whose working directory
    /// ends with `dir_suffix` with a fixed output.
    pub fn respond(self, argv: &[&str], dir_suffix: &str, output: CommandOutput) -> Self {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let dir_suffix = dir_suffix.to_string();
        self.when(
            move |spec| spec.argv == argv && spec.working_dir.ends_with(&dir_suffix),
            move |_| Ok(output.clone()),
        )
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands whose argv starts with `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program() == Some(program))
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        for (matcher, handler) in &self.rules {
            if matcher(spec) {
                return handler(spec);
            }
        }
        Ok(exit_with(0, ""))
    }
}

/// A finished process with the given exit code and stdout.
pub fn exit_with(exit_code: i32, stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: stdout.to_string(),
        stderr: String::new(),
        duration_ms: 0,
    }
}
