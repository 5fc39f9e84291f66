//! Repository sources
//!
//! A [`RepositorySource`] turns a repository reference into a
//! [`RepositoryDataset`]. The pipeline never talks to a hosting service
//! directly; it goes through this trait.

pub mod file;
pub mod synthetic;

pub use file::FileSource;
pub use synthetic::SyntheticSource;

use crate::schemas::RepositoryDataset;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository fetch errors
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed repository dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Owner/name pair identifying a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub url: String,
}

impl RepoRef {
    /// Accepts `https://github.com/o/r`, `github.com/o/r` or `o/r`
    pub fn parse(input: &str) -> Result<Self, ScanError> {
        let trimmed = input.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let path = without_scheme
            .strip_prefix("www.github.com/")
            .or_else(|| without_scheme.strip_prefix("github.com/"))
            .unwrap_or(without_scheme);

        let mut segments = path
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty());
        let owner = segments.next();
        let name = segments.next().map(|n| n.trim_end_matches(".git"));

        match (owner, name) {
            (Some(owner), Some(name)) if !name.is_empty() && !owner.contains('.') => {
                let full_name = format!("{}/{}", owner, name);
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    url: format!("https://github.com/{}", full_name),
                    full_name,
                })
            }
            _ => Err(ScanError::InvalidRepository(input.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// What to fetch and how much of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub want_issues: bool,
    pub want_prs: bool,
    pub want_commits: bool,
    pub max_items: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            want_issues: true,
            want_prs: true,
            want_commits: true,
            max_items: 20,
        }
    }
}

/// Fetches repository facts
///
/// Implementations substitute empty values for anything unavailable
/// (no README, no issues) rather than failing.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn fetch(&self, repo: &RepoRef, options: &ScanOptions) -> Result<RepositoryDataset, ScanError>;
}
