//! Static release-note index.
//!
//! The update document is a JSON file with three top-level categories, each
//! mapping an item name to its entry. It is parsed once at startup and
//! shared immutably; load failure produces a structured placeholder
//! document, never an error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

const NO_MATCH_TEXT: &str = "No updates found for the specified keyword.";

/// Versions shown when the Highlights keys cannot be parsed.
const FALLBACK_VERSIONS: [&str; 5] = ["1.32", "1.31", "1.30", "1.29", "1.28"];

/// One release-note item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateEntry {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Documentation", default)]
    pub documentation: Option<String>,
    #[serde(rename = "Issue", default)]
    pub issue: Option<String>,
    #[serde(rename = "Issues", default)]
    pub issues: Option<Vec<String>>,
}

/// Parsed update document. Categories iterate in lexicographic key order,
/// which fixes the "first match" order for lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocument {
    #[serde(rename = "Highlights", default)]
    pub highlights: BTreeMap<String, UpdateEntry>,
    #[serde(rename = "NotableChanges", default)]
    pub notable_changes: BTreeMap<String, UpdateEntry>,
    #[serde(rename = "OtherChanges", default)]
    pub other_changes: BTreeMap<String, UpdateEntry>,
}

/// Where the document came from and whether the load worked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadMetadata {
    pub source: String,
    pub last_updated: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The update document plus its load metadata. Loaded once per process.
#[derive(Debug, Clone)]
pub struct UpdateIndex {
    pub document: UpdateDocument,
    pub metadata: LoadMetadata,
}

impl UpdateIndex {
    /// Load and parse the document. Infallible: a missing or corrupt file
    /// yields a placeholder document with status `failed` and a single
    /// explanatory Highlights entry.
    pub fn load(path: &Path) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let source = path.display().to_string();

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<UpdateDocument>(&raw).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(document) => {
                tracing::debug!(source = %source, "loaded update index");
                Self {
                    document,
                    metadata: LoadMetadata {
                        source,
                        last_updated: now,
                        status: "success".to_string(),
                        error: None,
                    },
                }
            }
            Err(error) => {
                tracing::warn!(source = %source, %error, "update index unavailable, using placeholder");
                let mut highlights = BTreeMap::new();
                highlights.insert(
                    "Error".to_string(),
                    UpdateEntry {
                        description: Some(format!(
                            "Unable to load update data from {source}: {error}"
                        )),
                        ..UpdateEntry::default()
                    },
                );
                Self {
                    document: UpdateDocument {
                        highlights,
                        ..UpdateDocument::default()
                    },
                    metadata: LoadMetadata {
                        source,
                        last_updated: now,
                        status: "failed".to_string(),
                        error: Some(error),
                    },
                }
            }
        }
    }

    /// Case-insensitive keyword search across item names and entry fields.
    /// First match in document order wins. The literal query
    /// `latest updates` is answered with the highlights summary.
    pub fn lookup(&self, keyword: &str) -> String {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return NO_MATCH_TEXT.to_string();
        }
        if needle == "latest updates" {
            return self.latest_highlights();
        }

        for (category, items) in [
            ("Highlights", &self.document.highlights),
            ("Notable Changes", &self.document.notable_changes),
            ("Other Changes", &self.document.other_changes),
        ] {
            for (name, entry) in items {
                if entry_matches(name, entry, &needle) {
                    return format_match(category, name, entry);
                }
            }
        }

        NO_MATCH_TEXT.to_string()
    }

    /// Markdown bullet list of the Highlights entries.
    pub fn latest_highlights(&self) -> String {
        let mut out = String::from("Here are the latest Streamlit updates:\n");
        for (name, entry) in &self.document.highlights {
            let description = entry.description.as_deref().unwrap_or("(no description)");
            out.push_str(&format!("- **{name}**: {description}\n"));
        }
        out
    }

    /// Version numbers parsed from Highlights keys (`Version X.Y[.Z]`),
    /// newest first. Falls back to a static list when nothing parses.
    pub fn available_versions(&self) -> Vec<String> {
        let pattern = regex::Regex::new(r"Version\s+(\d+\.\d+(?:\.\d+)?)");
        let Ok(pattern) = pattern else {
            return FALLBACK_VERSIONS.iter().map(ToString::to_string).collect();
        };

        let mut versions: Vec<String> = self
            .document
            .highlights
            .keys()
            .filter_map(|name| pattern.captures(name))
            .map(|caps| caps[1].to_string())
            .collect();

        if versions.is_empty() {
            return FALLBACK_VERSIONS.iter().map(ToString::to_string).collect();
        }

        versions.sort_by(|a, b| compare_versions(b, a));
        versions.dedup();
        versions
    }

    /// (highlights, notable, other) entry counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.document.highlights.len(),
            self.document.notable_changes.len(),
            self.document.other_changes.len(),
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.metadata.status == "success"
    }
}

fn entry_matches(name: &str, entry: &UpdateEntry, needle: &str) -> bool {
    if name.to_lowercase().contains(needle) {
        return true;
    }
    let text_fields = [
        entry.description.as_deref(),
        entry.documentation.as_deref(),
        entry.issue.as_deref(),
    ];
    if text_fields
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
    {
        return true;
    }
    entry
        .issues
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

fn format_match(category: &str, name: &str, entry: &UpdateEntry) -> String {
    let mut out = format!("Section: {category}\nSub-Category: {name}\n");
    if let Some(description) = &entry.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if let Some(documentation) = &entry.documentation {
        out.push_str(&format!("Documentation: {documentation}\n"));
    }
    if let Some(issue) = &entry.issue {
        out.push_str(&format!("Issue: {issue}\n"));
    }
    if let Some(issues) = &entry.issues {
        out.push_str(&format!("Issues: {}\n", issues.join(", ")));
    }
    out
}

/// Numeric-aware comparison of dotted version strings.
fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0))
            .collect()
    };
    parse(a).cmp(&parse(b))
}
