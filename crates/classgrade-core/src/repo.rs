//! Repository identity snapshots.

use serde::{Deserialize, Serialize};

/// A repository as listed by the remote host, before ownership is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub name: String,

    /// `"<org>/<name>"`.
    pub full_name: String,

    pub clone_url: String,

    pub default_branch: String,

    #[serde(rename = "private")]
    pub is_private: bool,
}

impl RemoteRepo {
    pub fn new(
        org: &str,
        name: impl Into<String>,
        clone_url: impl Into<String>,
        default_branch: impl Into<String>,
        is_private: bool,
    ) -> Self {
        let name = name.into();
        Self {
            full_name: format!("{org}/{name}"),
            name,
            clone_url: clone_url.into(),
            default_branch: default_branch.into(),
            is_private,
        }
    }
}

/// Immutable snapshot of one repository plus its resolved owner.
///
/// Created once during init; the owner is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    name: String,
    full_name: String,
    clone_url: String,
    default_branch: String,
    is_private: bool,
    owner: String,
}

impl RepoRef {
    /// Attach an owner to a listed repository. Returns `None` when `owner`
    /// is blank.
    pub fn new(remote: RemoteRepo, owner: impl Into<String>) -> Option<Self> {
        let owner = owner.into().trim().to_string();
        if owner.is_empty() {
            return None;
        }
        Some(Self {
            name: remote.name,
            full_name: remote.full_name,
            clone_url: remote.clone_url,
            default_branch: remote.default_branch,
            is_private: remote.is_private,
            owner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// The repositories discovered by init, split by naming convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub source: Vec<RepoRef>,
    pub javadoc: Vec<RepoRef>,
}

impl Roster {
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.javadoc.is_empty()
    }
}
