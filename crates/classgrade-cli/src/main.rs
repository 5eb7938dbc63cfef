//! Classgrade - grade a classroom organization's lab repositories
//!
//! The `classgrade` command discovers every student repository for one lab,
//! brings local checkouts up to date, compiles and tests them, checks the
//! documentation repositories, optionally runs an instructor test suite,
//! and prints one summary row per student.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use classgrade_core::{
    Config, Credential, GithubClient, TokioProcessRunner, DEFAULT_TOKEN_FILE, GITHUB_API_URL,
};
use classgrade_pipeline::{render_table, write_report_json, Pipeline};
use tracing::{info, warn, Level};

/// Config file read when `--config` is not given. May be absent.
const DEFAULT_CONFIG: &str = "classgrade.toml";

#[derive(Parser, Debug)]
#[command(name = "classgrade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grade a classroom organization's lab repositories", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Organization to grade (init.org)
    #[arg(short, long)]
    org: Option<String>,

    /// Lab repository name prefix, e.g. lab1_ (init.source_prefix)
    #[arg(short, long)]
    lab: Option<String>,

    /// Directory holding the checkouts (init.target)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Instructor test class to inject (validate.test_class)
    #[arg(short, long, value_name = "FILE")]
    test_class: Option<PathBuf>,

    /// Grade the existing checkouts without cloning or pulling
    #[arg(short, long)]
    skip_update: bool,

    /// Also write the summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Load the config file; only the default file may be missing.
    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Ok(Config::load(path)?),
            None if Path::new(DEFAULT_CONFIG).exists() => {
                Ok(Config::load(Path::new(DEFAULT_CONFIG))?)
            }
            None => Ok(Config::empty()),
        }
    }

    /// Command-line flags take precedence over the config file.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(org) = &self.org {
            config.set("init.org", org.as_str());
        }
        if let Some(lab) = &self.lab {
            config.set("init.source_prefix", lab.as_str());
        }
        if let Some(path) = &self.path {
            config.set("init.target", path.to_string_lossy().to_string());
        }
        if let Some(test_class) = &self.test_class {
            config.set("validate.test_class", test_class.to_string_lossy().to_string());
        }
        if self.skip_update {
            config.set("update.enabled", false);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    classgrade_core::init_tracing(cli.json, level);

    let mut config = cli.load_config().context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let token_file = PathBuf::from(config.get_or("init.token_file", DEFAULT_TOKEN_FILE.to_string()));
    let credential = Credential::load(&token_file).context("Failed to read access token")?;
    let api_url: String = config.get_or("init.api_url", GITHUB_API_URL.to_string());
    let host = GithubClient::with_api_url(&credential, &api_url)?;

    info!(version = classgrade_core::VERSION, api_url = %api_url, "Starting classgrade");
    let pipeline = Pipeline::new(Arc::new(host), Arc::new(TokioProcessRunner));
    let result = pipeline.run(config).await?;

    println!();
    print!("{}", render_table(&result));

    for phase in result.errored_phases() {
        if let Some(error) = &phase.error {
            warn!(phase = %phase.kind, error = %error, "Phase did not complete");
        }
    }

    if let Some(path) = &cli.report {
        write_report_json(&result, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote JSON report");
    }

    if result.roster.source.is_empty() {
        warn!("No source repositories matched the lab prefix");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("classgrade").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["-o", "cs56", "-l", "lab1_", "-p", "/tmp/repos", "-t", "Lab1Test.java", "-s"]);
        assert_eq!(cli.org.as_deref(), Some("cs56"));
        assert_eq!(cli.lab.as_deref(), Some("lab1_"));
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/repos")));
        assert_eq!(cli.test_class, Some(PathBuf::from("Lab1Test.java")));
        assert!(cli.skip_update);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = Config::from_toml_str(
            r#"
            [init]
            org = "cs24"
            source_prefix = "lab0_"

            [update]
            enabled = true
            "#,
        )
        .unwrap();
        let cli = parse(&["--org", "cs56", "--skip-update"]);
        cli.apply_overrides(&mut config);

        assert_eq!(config.get_str("init.org"), Some("cs56"));
        assert_eq!(config.get_str("init.source_prefix"), Some("lab0_"));
        assert!(!config.get_bool("update.enabled", true));
    }

    #[test]
    fn test_no_flags_leave_config_untouched() {
        let mut config = Config::empty();
        parse(&[]).apply_overrides(&mut config);
        assert_eq!(config, Config::empty());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let cli = parse(&["--config", "/no/such/classgrade.toml"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_explicit_config_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grading.toml");
        std::fs::write(&path, "[javadoc]\nenabled = false\n").unwrap();

        let cli = parse(&["--config", path.to_str().unwrap()]);
        let config = cli.load_config().unwrap();
        assert!(!config.get_bool("javadoc.enabled", true));
    }
}
