//! Build tool invocation shared by the build, test, and validate phases.

use std::path::Path;

use classgrade_core::{CommandOutput, CommandSpec, ProcessRunner, RunContext};

use crate::phase::PhaseKind;

/// Default build tool executable.
pub const DEFAULT_TOOL: &str = "ant";

/// Builtin build tool targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTarget {
    /// ant compile
    Compile,

    /// ant test
    Test,
}

impl BuildTarget {
    /// Config section holding this target's settings.
    pub fn section(&self) -> &'static str {
        match self {
            BuildTarget::Compile => PhaseKind::Build.name(),
            BuildTarget::Test => PhaseKind::Test.name(),
        }
    }

    pub fn default_target(&self) -> &'static str {
        match self {
            BuildTarget::Compile => "compile",
            BuildTarget::Test => "test",
        }
    }
}

/// Resolved invocation settings for one build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTool {
    pub program: String,

    pub target: String,

    /// Timeout in seconds; zero waits indefinitely.
    pub timeout_secs: u64,

    /// Print captured output to stdout after each run.
    pub echo_output: bool,
}

impl BuildTool {
    /// Read `build.tool`, `<section>.target`, `<section>.timeout_secs` and
    /// `pipeline.echo_output`.
    pub fn from_context(ctx: &RunContext, target: BuildTarget) -> Self {
        let section = target.section();
        Self {
            program: ctx.get_config("build.tool", DEFAULT_TOOL.to_string()),
            target: ctx.get_config(
                &format!("{section}.target"),
                target.default_target().to_string(),
            ),
            timeout_secs: ctx.get_config(&format!("{section}.timeout_secs"), 0u64),
            echo_output: ctx.get_config("pipeline.echo_output", true),
        }
    }

    pub fn command(&self, working_dir: &Path) -> CommandSpec {
        CommandSpec::new(
            format!("{}_{}", self.program, self.target),
            [self.program.clone(), self.target.clone()],
            working_dir,
        )
        .with_timeout(self.timeout_secs)
    }

    /// Run the target in `working_dir` and echo its output.
    pub async fn run_in(
        &self,
        runner: &dyn ProcessRunner,
        working_dir: &Path,
    ) -> classgrade_core::Result<CommandOutput> {
        let spec = self.command(working_dir);
        let output = runner.run(&spec).await?;
        if self.echo_output {
            echo(&spec, &output);
        }
        Ok(output)
    }
}

fn echo(spec: &CommandSpec, output: &CommandOutput) {
    let header = format!("{} in {}", spec.display(), spec.working_dir.display());
    println!();
    println!("{header}");
    println!("{}", "=".repeat(header.len()));
    println!("Build exited with status {}", output.exit_code);
    println!("{}", output.combined());
}

#[cfg(test)]
mod tests {
    use super::*;
    use classgrade_core::fakes::{exit_with, ScriptedRunner};
    use classgrade_core::Config;

    #[test]
    fn test_defaults() {
        let ctx = RunContext::new(Config::empty());
        let compile = BuildTool::from_context(&ctx, BuildTarget::Compile);
        assert_eq!(compile.program, "ant");
        assert_eq!(compile.target, "compile");
        assert_eq!(compile.timeout_secs, 0);
        assert!(compile.echo_output);

        let test = BuildTool::from_context(&ctx, BuildTarget::Test);
        assert_eq!(test.target, "test");
    }

    #[test]
    fn test_configured_tool() {
        let mut config = Config::empty();
        config.set("build.tool", "gradle");
        config.set("build.target", "assemble");
        config.set("test.timeout_secs", 600);
        config.set("pipeline.echo_output", false);
        let ctx = RunContext::new(config);

        let compile = BuildTool::from_context(&ctx, BuildTarget::Compile);
        assert_eq!(compile.command(Path::new("/r")).argv, vec!["gradle", "assemble"]);

        let test = BuildTool::from_context(&ctx, BuildTarget::Test);
        assert_eq!(test.program, "gradle");
        assert_eq!(test.timeout_secs, 600);
        assert!(!test.echo_output);
    }

    #[tokio::test]
    async fn test_run_in_uses_working_dir() {
        let runner = ScriptedRunner::new().respond(&["ant", "compile"], "lab1_alice", exit_with(0, "BUILD SUCCESSFUL"));
        let ctx = RunContext::new(Config::empty());
        let tool = BuildTool::from_context(&ctx, BuildTarget::Compile);

        let output = tool
            .run_in(&runner, Path::new("/repos/source/lab1_alice"))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(runner.calls()[0].working_dir, Path::new("/repos/source/lab1_alice"));
    }
}
