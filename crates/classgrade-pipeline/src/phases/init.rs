//! Init phase: resolve membership and partition the organization's
//! repositories into source and javadoc lists.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use classgrade_core::{Config, GraderError, RemoteRepo, RepoHost, RepoRef, Roster, RunContext};
use tracing::{debug, info, warn};

/// Where repository ownership comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerSource {
    /// The name suffix after the prefix, when it is an organization member;
    /// otherwise the primary contributor.
    #[default]
    Member,

    /// Always the primary contributor.
    Contributor,
}

impl FromStr for OwnerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(OwnerSource::Member),
            "contributor" => Ok(OwnerSource::Contributor),
            other => Err(format!("unknown owner source: {other}")),
        }
    }
}

/// Required and optional `init.*` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSettings {
    pub org: String,
    pub source_prefix: String,
    pub javadoc_prefix: String,
    pub owner_source: OwnerSource,
}

impl InitSettings {
    /// Missing `init.org` or `init.source_prefix` is fatal.
    pub fn from_config(config: &Config) -> classgrade_core::Result<Self> {
        let org = config.require_str("init.org")?.to_string();
        let source_prefix = config.require_str("init.source_prefix")?.to_string();

        let javadoc_prefix = config
            .get_str("init.javadoc_prefix")
            .or_else(|| config.get_str("init_javadoc_prefix"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{source_prefix}javadoc_"));

        if javadoc_prefix == source_prefix {
            return Err(GraderError::InvalidConfig {
                key: "init.javadoc_prefix".to_string(),
                reason: "must differ from init.source_prefix".to_string(),
            });
        }

        let owner_source = match config.get_str("init.owner_source") {
            None => OwnerSource::default(),
            Some(raw) => raw.parse().map_err(|reason| GraderError::InvalidConfig {
                key: "init.owner_source".to_string(),
                reason,
            })?,
        };

        Ok(Self {
            org,
            source_prefix,
            javadoc_prefix,
            owner_source,
        })
    }
}

/// Populates the run context's roster. Runs exactly once, first.
pub struct InitPhase {
    host: Arc<dyn RepoHost>,
}

impl InitPhase {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self { host }
    }

    /// Resolve settings, create the checkout roots, list the organization
    /// and install the roster. Every error here is fatal to the run.
    pub async fn run(&self, ctx: &mut RunContext) -> classgrade_core::Result<()> {
        let settings = InitSettings::from_config(ctx.config())?;
        ctx.paths().ensure()?;

        let members = self.host.list_members(&settings.org).await?;
        let repos = self.host.list_repos(&settings.org).await?;
        info!(
            org = %settings.org,
            members = members.len(),
            repos = repos.len(),
            "Listed organization"
        );

        let roster = self.build_roster(&settings, &members, repos).await;
        info!(
            source = roster.source.len(),
            javadoc = roster.javadoc.len(),
            "Found {} source repos and {} javadoc repos",
            roster.source.len(),
            roster.javadoc.len()
        );

        ctx.install_roster(roster);
        Ok(())
    }

    /// Partition by prefix and resolve each owner once.
    pub async fn build_roster(
        &self,
        settings: &InitSettings,
        members: &[String],
        repos: Vec<RemoteRepo>,
    ) -> Roster {
        let members: HashSet<&str> = members.iter().map(String::as_str).collect();
        let mut roster = Roster::default();

        for remote in repos {
            // The javadoc prefix usually extends the source prefix, so test it first.
            let (suffix, is_javadoc) =
                if let Some(rest) = remote.name.strip_prefix(&settings.javadoc_prefix) {
                    (rest.to_string(), true)
                } else if let Some(rest) = remote.name.strip_prefix(&settings.source_prefix) {
                    (rest.to_string(), false)
                } else {
                    debug!(repo = %remote.name, "Ignoring repository outside the lab prefixes");
                    continue;
                };

            let owner = self
                .resolve_owner(settings.owner_source, &members, &remote, &suffix)
                .await;
            let name = remote.name.clone();
            let Some(repo) = RepoRef::new(remote, owner) else {
                warn!(repo = %name, "Could not resolve an owner, skipping");
                continue;
            };

            if is_javadoc {
                roster.javadoc.push(repo);
            } else {
                roster.source.push(repo);
            }
        }

        roster
    }

    async fn resolve_owner(
        &self,
        source: OwnerSource,
        members: &HashSet<&str>,
        remote: &RemoteRepo,
        suffix: &str,
    ) -> String {
        if source == OwnerSource::Member && members.contains(suffix) {
            return suffix.to_string();
        }

        match self.host.primary_contributor(remote).await {
            Ok(Some(login)) if !login.trim().is_empty() => return login,
            Ok(_) => debug!(repo = %remote.name, "Repository has no contributors"),
            Err(e) => warn!(repo = %remote.name, error = %e, "Contributor lookup failed"),
        }

        if suffix.is_empty() {
            remote.name.clone()
        } else {
            suffix.to_string()
        }
    }
}
