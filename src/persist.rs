//! Writing run artifacts to disk

use crate::schemas::AssessmentResult;
use crate::transcript::Transcript;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

fn stamped(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        prefix,
        Utc::now().format("%Y%m%d_%H%M%S"),
        extension
    ))
}

/// Save the full result as pretty JSON; returns the file written
pub async fn save_assessment(dir: &Path, result: &AssessmentResult) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = stamped(dir, "assessment", "json");
    let body = serde_json::to_string_pretty(result).context("Failed to serialize assessment")?;
    fs::write(&path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Assessment saved to {}", path.display());
    Ok(path)
}

/// Save the rendered transcript; `None` when nothing was recorded
pub async fn save_transcript(dir: &Path, transcript: &Transcript) -> Result<Option<PathBuf>> {
    if transcript.is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = stamped(dir, "transcript", "txt");
    fs::write(&path, transcript.render())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Transcript saved to {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_transcript_saved_only_when_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let transcript = Transcript::enabled();
        assert!(save_transcript(&out, &transcript).await.unwrap().is_none());

        transcript.record("qa_validator", "prompt", "{}", Duration::from_millis(12));
        let path = save_transcript(&out, &transcript).await.unwrap().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("transcript_") && name.ends_with(".txt"));

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("qa_validator"));
    }
}
