//! Repository facts gathered by the scanner

use super::null_default;
use crate::agents::clip;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum characters kept per dependency manifest
pub const MANIFEST_LIMIT: usize = 1000;

/// Everything the analyzers know about a repository.
///
/// Every field tolerates absence and explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryDataset {
    #[serde(alias = "repo_info", deserialize_with = "null_default")]
    pub repository: RepositoryMetadata,
    #[serde(deserialize_with = "null_default")]
    pub file_tree: Vec<FileEntry>,
    #[serde(deserialize_with = "null_default")]
    pub readme: String,
    /// Manifest file name to raw contents
    #[serde(deserialize_with = "null_default")]
    pub dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "null_default")]
    pub issues: Vec<IssueRecord>,
    #[serde(alias = "pullRequests", alias = "prs", deserialize_with = "null_default")]
    pub pull_requests: Vec<PullRequestRecord>,
    #[serde(deserialize_with = "null_default")]
    pub commits: Vec<CommitRecord>,
}

impl RepositoryDataset {
    /// Cap every list at `max_items` and bound manifest sizes
    pub fn normalize(&mut self, max_items: usize) {
        self.file_tree.truncate(max_items);
        self.issues.truncate(max_items);
        self.pull_requests.truncate(max_items);
        self.commits.truncate(max_items);
        self.dependencies.truncate(max_items);
        for content in self.dependencies.values_mut() {
            if content.chars().count() > MANIFEST_LIMIT {
                *content = clip(content, MANIFEST_LIMIT).to_string();
            }
        }
    }

    pub fn language(&self) -> &str {
        if self.repository.language.is_empty() {
            "Unknown"
        } else {
            &self.repository.language
        }
    }

    /// Dependency manifests rendered as `name:\ncontents` blocks
    pub fn dependency_listing(&self) -> String {
        self.dependencies
            .iter()
            .map(|(name, content)| format!("{}:\n{}", name, content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryMetadata {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub language: String,
    #[serde(alias = "stargazers_count", deserialize_with = "null_default")]
    pub stars: u64,
    #[serde(alias = "forks_count", deserialize_with = "null_default")]
    pub forks: u64,
    #[serde(alias = "html_url", deserialize_with = "null_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "null_default")]
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueRecord {
    #[serde(alias = "id")]
    pub number: u64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub body: String,
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_default")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestRecord {
    #[serde(alias = "id")]
    pub number: u64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub body: String,
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_default")]
    pub merged_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitRecord {
    #[serde(deserialize_with = "null_default")]
    pub sha: String,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
    #[serde(deserialize_with = "null_default")]
    pub author: String,
    #[serde(deserialize_with = "null_default")]
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_become_empty() {
        let dataset: RepositoryDataset = serde_json::from_value(json!({
            "repository": {"name": "demo", "description": null},
            "readme": null,
            "issues": null,
            "pullRequests": [{"number": 4, "title": "Fix", "body": null}]
        }))
        .unwrap();

        assert_eq!(dataset.repository.name, "demo");
        assert!(dataset.repository.description.is_empty());
        assert!(dataset.readme.is_empty());
        assert!(dataset.issues.is_empty());
        assert_eq!(dataset.pull_requests.len(), 1);
        assert!(dataset.pull_requests[0].body.is_empty());
        assert_eq!(dataset.language(), "Unknown");
    }

    #[test]
    fn test_normalize_caps_lists_and_manifests() {
        let mut dataset = RepositoryDataset::default();
        dataset.issues = (0..30)
            .map(|n| IssueRecord {
                number: n,
                ..Default::default()
            })
            .collect();
        dataset
            .dependencies
            .insert("package.json".into(), "é".repeat(1500));

        dataset.normalize(20);

        assert_eq!(dataset.issues.len(), 20);
        assert_eq!(dataset.issues[19].number, 19);
        assert_eq!(dataset.dependencies["package.json"].chars().count(), MANIFEST_LIMIT);
    }

    #[test]
    fn test_dependency_listing_order() {
        let mut dataset = RepositoryDataset::default();
        dataset.dependencies.insert("b.txt".into(), "two".into());
        dataset.dependencies.insert("a.txt".into(), "one".into());
        assert_eq!(dataset.dependency_listing(), "b.txt:\ntwo\n\na.txt:\none");
    }
}
