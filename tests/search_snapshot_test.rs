mod helpers;

use helpers::{note, temp_stream, write_raw};
use habitat::memory::search::{self, load_profile, SearchFilter, DEFAULT_SEARCH_LIMIT};
use serde_json::json;

#[test]
fn unfiltered_search_returns_latest_ten() {
    let (_tmp, log) = temp_stream();
    for i in 0..15 {
        log.append(&note(&format!("entry {i}"), &[])).unwrap();
    }

    let response = search::search(&log, &SearchFilter::default()).unwrap();
    assert_eq!(response.total, 15);
    assert_eq!(response.results.len(), DEFAULT_SEARCH_LIMIT);
    assert_eq!(response.results[0].message_text(), "entry 5");
    assert_eq!(response.results[9].message_text(), "entry 14");
}

#[test]
fn query_is_case_insensitive_and_tag_is_exact() {
    let (_tmp, log) = temp_stream();
    log.append(&note("Nexus online", &["Echo"])).unwrap();
    log.append(&note("nexus offline", &["echo"])).unwrap();
    log.append(&note("unrelated", &["Echo"])).unwrap();

    let by_query = search::search(&log, &SearchFilter::new(Some("NEXUS"), None)).unwrap();
    assert_eq!(by_query.results.len(), 2);

    let by_tag = search::search(&log, &SearchFilter::new(None, Some("Echo"))).unwrap();
    assert_eq!(by_tag.results.len(), 2);

    let both = search::search(&log, &SearchFilter::new(Some("nexus"), Some("Echo"))).unwrap();
    assert_eq!(both.results.len(), 1);
    assert_eq!(both.results[0].message_text(), "Nexus online");
    assert_eq!(both.total, 3);
}

#[test]
fn legacy_notes_are_searchable() {
    let (_tmp, log) = temp_stream();
    write_raw(
        log.path(),
        concat!(
            "{\"ts_utc\":\"2024-05-01T10:00:00Z\",\"source\":\"echo_append\",\"note\":\"Nexus online\",\"tag\":\"Echo\"}\n",
            "garbage\n",
            "{\"ts_utc\":\"2024-05-01T11:00:00Z\",\"source\":\"echo_append\",\"note\":\"lunch\"}\n",
        ),
    );

    let response = search::search(&log, &SearchFilter::new(Some("nexus"), Some("Echo"))).unwrap();
    assert_eq!(response.total, 2);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].note_text(), "Nexus online");
}

#[test]
fn search_of_missing_stream_is_empty() {
    let (_tmp, log) = temp_stream();
    let response = search::search(&log, &SearchFilter::new(Some("x"), None)).unwrap();
    assert_eq!(response.total, 0);
    assert!(response.results.is_empty());
}

#[test]
fn snapshot_bundles_profile_and_recent_entries() {
    let (tmp, log) = temp_stream();
    for i in 0..25 {
        log.append(&note(&format!("n{i}"), &[])).unwrap();
    }
    let profile = tmp.path().join("cipher_profile.json");
    std::fs::write(&profile, "\u{feff}{\"name\":\"Cipher\",\"traits\":[\"calm\"]}").unwrap();

    let snap = search::snapshot(&log, &profile, tmp.path()).unwrap();
    assert_eq!(snap.cipher_profile, Some(json!({"name": "Cipher", "traits": ["calm"]})));
    assert_eq!(snap.recent_memories.len(), 20);
    assert_eq!(snap.echo_root, tmp.path().display().to_string());

    let value = serde_json::to_value(&snap).unwrap();
    assert!(value["ts_utc"].is_string());
    assert_eq!(value["recent_memories"][19]["details"]["text"], "n24");
}

#[test]
fn snapshot_without_profile_has_null_profile() {
    let (tmp, log) = temp_stream();
    let snap = search::snapshot(&log, &tmp.path().join("none.json"), tmp.path()).unwrap();
    assert!(snap.cipher_profile.is_none());
    assert!(snap.recent_memories.is_empty());

    let bad = tmp.path().join("bad.json");
    std::fs::write(&bad, "{nope").unwrap();
    assert!(load_profile(&bad).is_none());
}
