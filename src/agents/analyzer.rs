//! Shared behaviour of the four repository analyzers

use super::{Agent, RunOptions};
use crate::a2a::MessageType;
use crate::extract::FailureRecord;
use crate::llm::LlmError;
use crate::metrics::METRICS;
use crate::schemas::{decode, AgentSchema, Decoded, RepositoryDataset};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// An agent that turns the repository dataset into one typed analysis.
///
/// Decode failures and call timeouts are downgraded to the schema's default
/// record; any other invocation failure is returned to the caller.
#[async_trait]
pub trait Analyzer: Send + Sync {
    type Output: AgentSchema + DeserializeOwned + Serialize + Send + Sync + 'static;

    fn agent(&self) -> &Agent;

    /// What the analysis looks at, reported on the bus
    fn target(&self) -> &'static str;

    fn build_prompt(&self, dataset: &RepositoryDataset) -> String;

    /// Payload of the completion notice
    fn summarize(&self, _output: &Self::Output) -> Value {
        json!({})
    }

    async fn analyze(
        &self,
        dataset: &RepositoryDataset,
        conversation_id: Option<&str>,
    ) -> Result<Decoded<Self::Output>, LlmError> {
        let agent = self.agent();
        agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Notification,
            json!({"status": "analyzing", "target": self.target()}),
        );

        let prompt = self.build_prompt(dataset);
        let decoded = match agent.run(&prompt, RunOptions::conversation(conversation_id)).await {
            Ok(text) => decode::<Self::Output>(&text),
            Err(LlmError::Timeout(limit)) => Decoded::failed(FailureRecord::new(
                format!("completion timed out after {:?}", limit),
                "",
            )),
            Err(e) => return Err(e),
        };

        match decoded.failure() {
            Some(failure) => {
                METRICS.record_decode_failure(agent.name());
                warn!("{}: using default record: {}", agent.name(), failure.error);
            }
            None => info!("{}: analysis decoded", agent.name()),
        }

        let mut payload = self.summarize(decoded.record());
        if let Value::Object(map) = &mut payload {
            map.insert("status".into(), json!("completed"));
            map.insert("parse_failed".into(), json!(decoded.is_failed()));
        }
        agent.notify(conversation_id, "orchestrator", MessageType::Response, payload);

        Ok(decoded)
    }
}
