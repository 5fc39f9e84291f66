//! Offline sample data for a repository reference

use super::{RepoRef, RepositorySource, ScanError, ScanOptions};
use crate::schemas::{
    CommitRecord, FileEntry, IssueRecord, PullRequestRecord, RepositoryDataset, RepositoryMetadata,
};
use async_trait::async_trait;
use tracing::debug;

/// Builds a small, deterministic dataset from the repository name alone.
///
/// Used when no dataset file is supplied and no hosting API is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }

    pub fn dataset(&self, repo: &RepoRef, options: &ScanOptions) -> RepositoryDataset {
        let files = [
            ("README.md", "file", 2048),
            ("package.json", "file", 812),
            ("src", "dir", 0),
            ("src/index.js", "file", 1530),
            ("src/routes/orders.js", "file", 4210),
            ("src/services/inventory.js", "file", 3380),
            ("src/db/client.js", "file", 960),
            ("tests", "dir", 0),
            ("tests/orders.test.js", "file", 2775),
        ];

        let issues = [
            ("Order totals ignore discount codes", "bug", "open"),
            ("Add pagination to the orders endpoint", "enhancement", "open"),
            ("Inventory count drifts under concurrent checkouts", "bug", "open"),
            ("Support CSV export of order history", "feature", "closed"),
        ];

        let pull_requests = [
            ("Cache product lookups in inventory service", "merged"),
            ("Validate request bodies on order routes", "merged"),
            ("Move database config to environment variables", "closed"),
        ];

        let mut dataset = RepositoryDataset {
            repository: RepositoryMetadata {
                name: repo.name.clone(),
                full_name: repo.full_name.clone(),
                description: format!("Order management service for {}", repo.owner),
                language: "JavaScript".to_string(),
                stars: 42,
                forks: 7,
                url: repo.url.clone(),
            },
            file_tree: files
                .iter()
                .map(|(path, kind, size)| FileEntry {
                    path: path.to_string(),
                    kind: kind.to_string(),
                    size: *size,
                })
                .collect(),
            readme: format!(
                "# {}\n\nREST API for orders and inventory built with Express and PostgreSQL.\n\n\
                 ## Getting started\n\nnpm install\nnpm test\n",
                repo.name
            ),
            ..Default::default()
        };

        dataset.dependencies.insert(
            "package.json".to_string(),
            r#"{"dependencies": {"express": "^4.18.2", "pg": "^8.11.0", "joi": "^17.9.2"}, "devDependencies": {"jest": "^29.6.0", "supertest": "^6.3.3"}}"#
                .to_string(),
        );

        if options.want_issues {
            dataset.issues = issues
                .iter()
                .enumerate()
                .map(|(i, (title, label, state))| IssueRecord {
                    number: 10 + i as u64,
                    title: title.to_string(),
                    body: format!("Reported against {}.", repo.full_name),
                    state: state.to_string(),
                    labels: vec![label.to_string()],
                    ..Default::default()
                })
                .collect();
        }

        if options.want_prs {
            dataset.pull_requests = pull_requests
                .iter()
                .enumerate()
                .map(|(i, (title, state))| PullRequestRecord {
                    number: 20 + i as u64,
                    title: title.to_string(),
                    state: state.to_string(),
                    ..Default::default()
                })
                .collect();
        }

        if options.want_commits {
            dataset.commits = vec![CommitRecord {
                sha: "0000000".to_string(),
                message: "Initial import".to_string(),
                author: repo.owner.clone(),
                date: String::new(),
            }];
        }

        dataset.normalize(options.max_items);
        dataset
    }
}

#[async_trait]
impl RepositorySource for SyntheticSource {
    async fn fetch(&self, repo: &RepoRef, options: &ScanOptions) -> Result<RepositoryDataset, ScanError> {
        debug!("Synthesizing dataset for {}", repo);
        Ok(self.dataset(repo, options))
    }
}
