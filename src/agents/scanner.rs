//! Repository scanner: gathers the dataset every analyzer works from

use super::{Agent, AgentContext, AgentRole};
use crate::a2a::MessageType;
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::schemas::RepositoryDataset;
use crate::source::{RepoRef, RepositorySource, ScanError, ScanOptions};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info};

pub(crate) const INSTRUCTION: &str = r#"You are a repository scanner. Collect repository metadata, the file tree, the README, dependency manifests, recent issues, pull requests and commits, and report them as structured JSON without interpretation. Use empty values for anything that is unavailable."#;

pub struct ScannerAgent {
    agent: Agent,
    source: Arc<dyn RepositorySource>,
}

impl ScannerAgent {
    pub fn new(
        settings: AgentSettings,
        ctx: AgentContext,
        source: Arc<dyn RepositorySource>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::Scanner, settings, ctx)?,
            source,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Fetch and normalize the dataset; a single attempt
    pub async fn scan(
        &self,
        repo: &RepoRef,
        options: &ScanOptions,
        conversation_id: Option<&str>,
    ) -> Result<RepositoryDataset, ScanError> {
        info!("Scanning {}", repo);
        self.agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Notification,
            json!({"status": "scanning", "repository": repo.full_name}),
        );

        let started = Instant::now();
        let mut dataset = match self.source.fetch(repo, options).await {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("Scan of {} failed: {}", repo, e);
                return Err(e);
            }
        };
        dataset.normalize(options.max_items);

        info!(
            "Scanned {} in {:.2}s: {} files, {} PRs, {} issues, language {}",
            repo,
            started.elapsed().as_secs_f64(),
            dataset.file_tree.len(),
            dataset.pull_requests.len(),
            dataset.issues.len(),
            dataset.language()
        );
        self.agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Response,
            json!({
                "status": "completed",
                "files": dataset.file_tree.len(),
                "pull_requests": dataset.pull_requests.len(),
                "issues": dataset.issues.len(),
            }),
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::*;
    use crate::a2a::HistoryFilter;
    use crate::schemas::IssueRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RepositorySource for CountingSource {
        async fn fetch(&self, _repo: &RepoRef, _options: &ScanOptions) -> Result<RepositoryDataset, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ScanError::Unavailable("rate limited".into()));
            }
            let mut dataset = RepositoryDataset::default();
            dataset.issues = (0..50)
                .map(|n| IssueRecord {
                    number: n,
                    ..Default::default()
                })
                .collect();
            Ok(dataset)
        }
    }

    fn scanner(fail: bool) -> (ScannerAgent, Arc<CountingSource>, AgentContext) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail,
        });
        let ctx = context(Arc::new(CannedClient::new("")));
        let scanner =
            ScannerAgent::new(AgentRole::Scanner.default_settings(), ctx.clone(), source.clone()).unwrap();
        (scanner, source, ctx)
    }

    #[tokio::test]
    async fn test_scan_normalizes_and_notifies() {
        let (scanner, _, ctx) = scanner(false);
        let repo = RepoRef::parse("octo/demo").unwrap();
        let options = ScanOptions {
            max_items: 5,
            ..Default::default()
        };

        let dataset = scanner.scan(&repo, &options, Some("conv")).await.unwrap();
        assert_eq!(dataset.issues.len(), 5);

        let notices = ctx.bus.history(&HistoryFilter::conversation("conv").sender("scanner"));
        let statuses: Vec<_> = notices.iter().map(|m| m.payload["status"].clone()).collect();
        assert_eq!(statuses, vec![json!("scanning"), json!("completed")]);
    }

    #[tokio::test]
    async fn test_scan_failure_is_not_retried() {
        let (scanner, source, _) = scanner(true);
        let repo = RepoRef::parse("octo/demo").unwrap();

        let err = scanner.scan(&repo, &ScanOptions::default(), None).await.unwrap_err();
        assert!(matches!(err, ScanError::Unavailable(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
