//! Audit log of every agent prompt and response

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub agent: String,
    pub prompt: String,
    pub response: String,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only transcript; a disabled transcript drops everything
#[derive(Debug, Default)]
pub struct Transcript {
    enabled: bool,
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl Transcript {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TranscriptEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, agent: &str, prompt: &str, response: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.lock().push(TranscriptEntry {
            agent: agent.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            duration_ms: elapsed.as_millis() as u64,
            recorded_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable rendering, one section per call
    pub fn render(&self) -> String {
        let entries = self.lock();
        let mut out = String::new();
        for (idx, entry) in entries.iter().enumerate() {
            let _ = writeln!(out, "{}", "=".repeat(72));
            let _ = writeln!(
                out,
                "[{}] {} at {} ({} ms)",
                idx + 1,
                entry.agent,
                entry.recorded_at.to_rfc3339(),
                entry.duration_ms
            );
            let _ = writeln!(out, "{}", "-".repeat(72));
            let _ = writeln!(out, "PROMPT:\n{}\n", entry.prompt);
            let _ = writeln!(out, "RESPONSE:\n{}\n", entry.response);
        }
        out
    }
}
