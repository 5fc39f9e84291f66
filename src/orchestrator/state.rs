//! Pipeline states and the transitions allowed between them

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use tracing::info;

/// Position of a run in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Scanning,
    Analyzing,
    Creating,
    Validating,
    Refining,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::Analyzing => "analyzing",
            Self::Creating => "creating",
            Self::Validating => "validating",
            Self::Refining => "refining",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline is strictly linear; `Failed` is reachable from any
/// non-terminal state.
fn is_legal(from: PipelineState, to: PipelineState) -> bool {
    use PipelineState::*;

    if to == Failed {
        return !from.is_terminal();
    }

    matches!(
        (from, to),
        (Scanning, Analyzing)
            | (Analyzing, Creating)
            | (Creating, Validating)
            | (Validating, Refining)
            | (Refining, Done)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: PipelineState,
    pub to: PipelineState,
    /// Milliseconds since the run started
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal pipeline transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Current state plus the log of every transition taken
#[derive(Debug)]
pub struct StateTracker {
    current: PipelineState,
    started: Instant,
    transitions: Vec<TransitionRecord>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Start a run in `Scanning`
    pub fn new() -> Self {
        Self {
            current: PipelineState::Scanning,
            started: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn advance(
        &mut self,
        to: PipelineState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        info!("Pipeline {} -> {}", self.current, to);
        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            reason: reason.map(str::to_string),
        });
        self.current = to;
        Ok(())
    }

    /// Move to `Failed`; no-op once terminal
    pub fn fail(&mut self, reason: &str) {
        if !self.current.is_terminal() {
            let _ = self.advance(PipelineState::Failed, Some(reason));
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }
}
