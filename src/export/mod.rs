//! Artifact export - the final article as Markdown and plain-text files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "md", alias = "markdown")]
    Markdown,
    #[serde(rename = "txt", alias = "text")]
    PlainText,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::PlainText => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::PlainText => "text/plain",
        }
    }
}

/// File name stem for a topic: every whitespace character becomes `_`
pub fn file_stem(topic: &str) -> String {
    topic
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Write `content` once per format into `dir`, creating it when missing.
/// Returns the written paths in `formats` order; duplicates are written once.
pub fn write_artifacts(
    dir: &Path,
    topic: &str,
    content: &str,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let stem = file_stem(topic);
    let mut written = Vec::with_capacity(formats.len());

    for format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        if written.contains(&path) {
            continue;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            mime = format.mime_type(),
            "Exported article"
        );
        written.push(path);
    }

    Ok(written)
}
