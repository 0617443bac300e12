//! CI detection and commit identity for automated release commits.

use crate::error::{ReleaseError, Result};

pub const CI_VAR: &str = "CI";
pub const ACTOR_VAR: &str = "GITHUB_ACTOR";
pub const ACTOR_ID_VAR: &str = "GITHUB_ACTOR_ID";

/// Snapshot of the environment variables the release reads directly.
///
/// Tokens used by external tools (`GITHUB_TOKEN`, `GH_TOKEN`) are never read
/// here; child processes inherit them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    ci: Option<String>,
    actor: Option<String>,
    actor_id: Option<String>,
}

/// Git author identity derived from the CI actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CiEnvironment {
    /// Read the current process environment
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        CiEnvironment {
            ci: lookup(CI_VAR),
            actor: lookup(ACTOR_VAR),
            actor_id: lookup(ACTOR_ID_VAR),
        }
    }

    /// Build from key/value pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    /// Whether `CI` is set to a truthy value (`true` or `1`)
    pub fn is_ci(&self) -> bool {
        self.ci
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Commit identity for CI runs.
    ///
    /// Returns `Ok(None)` outside CI. Under CI both actor variables must be
    /// present and non-empty.
    pub fn identity(&self) -> Result<Option<CommitIdentity>> {
        if !self.is_ci() {
            return Ok(None);
        }

        let name = required(ACTOR_VAR, self.actor.as_deref())?;
        let id = required(ACTOR_ID_VAR, self.actor_id.as_deref())?;

        Ok(Some(CommitIdentity {
            email: format!("{}+{}@users.noreply.github.com", id, name),
            name: name.to_string(),
        }))
    }
}

fn required<'a>(variable: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ReleaseError::missing_credential(variable)),
    }
}
