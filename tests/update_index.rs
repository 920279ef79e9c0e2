// The bundled release-note document must load and answer the stock queries.

use std::path::Path;

use streamsage::updates::UpdateIndex;

fn bundled() -> UpdateIndex {
    UpdateIndex::load(Path::new("data/streamlit_updates.json"))
}

// ── Loading ──────────────────────────────────────────────────

#[test]
fn bundled_document_loads_successfully() {
    let index = bundled();
    assert_eq!(index.metadata.status, "success");
    let (highlights, notable, other) = index.counts();
    assert!(highlights >= 5);
    assert!(notable >= 4);
    assert!(other >= 4);
}

#[test]
fn bundled_versions_are_descending() {
    let versions = bundled().available_versions();
    assert_eq!(versions.first().map(String::as_str), Some("1.36"));
    let mut sorted = versions.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(versions, sorted);
}

// ── Queries ──────────────────────────────────────────────────

#[test]
fn latest_updates_mentions_the_newest_version() {
    let reply = bundled().lookup("latest updates");
    assert!(reply.contains("Version 1.36"));
    assert!(reply.contains("st.fragment"));
}

#[test]
fn keyword_search_finds_notable_changes() {
    let reply = bundled().lookup("chat_input");
    assert!(reply.contains("Chat input files"));
    assert!(reply.contains("Section: Notable Changes"));
}

#[test]
fn unknown_keyword_reports_no_match() {
    assert_eq!(
        bundled().lookup("blockchain"),
        "No updates found for the specified keyword."
    );
}
