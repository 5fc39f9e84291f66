//! Repository dataset loaded from a JSON file

use super::{RepoRef, RepositorySource, ScanError, ScanOptions};
use crate::schemas::RepositoryDataset;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the dataset without applying scan options
    pub async fn load(&self) -> Result<RepositoryDataset, ScanError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let dataset = serde_json::from_str(&raw)?;
        info!("Loaded repository dataset from {}", self.path.display());
        Ok(dataset)
    }
}

#[async_trait]
impl RepositorySource for FileSource {
    async fn fetch(&self, _repo: &RepoRef, options: &ScanOptions) -> Result<RepositoryDataset, ScanError> {
        let mut dataset = self.load().await?;
        if !options.want_issues {
            dataset.issues.clear();
        }
        if !options.want_prs {
            dataset.pull_requests.clear();
        }
        if !options.want_commits {
            dataset.commits.clear();
        }
        Ok(dataset)
    }
}
