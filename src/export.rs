//! Saving generated code to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write generated content to `streamsage_generated_{timestamp}_{name}`
/// inside `dir`. Returns the written path.
pub fn export_artifact(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let file_name = format!("streamsage_generated_{timestamp}_{}", sanitize_name(name));
    let path = dir.join(file_name);
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "exported artifact");
    Ok(path)
}

/// Strip path separators and control characters from a user-supplied name.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\') && !c.is_control())
        .collect();
    if cleaned.is_empty() {
        "app.py".to_string()
    } else {
        cleaned
    }
}
