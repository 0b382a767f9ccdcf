mod helpers;

use helpers::{chat, note, temp_stream};
use habitat::memory::dialogue::build_dialogue;
use habitat::memory::{DialogueMessage, Role};

#[test]
fn conversation_is_rebuilt_with_roles() {
    let (_tmp, log) = temp_stream();
    log.append(&chat("Ann", "cipher", "hi")).unwrap();
    log.append(&chat("Cipher", "cipher", "hello Ann")).unwrap();
    log.append(&chat("Bob", "vexis", "other persona")).unwrap();
    log.append(&note("not chat", &["cipher"])).unwrap();

    let window = log.dialogue_window("cipher", "Ann", 6).unwrap();
    assert_eq!(
        window,
        vec![
            DialogueMessage::user("hi"),
            DialogueMessage::assistant("hello Ann"),
        ]
    );
}

#[test]
fn other_users_count_as_assistant() {
    let (_tmp, log) = temp_stream();
    log.append(&chat("Bob", "cipher", "from bob")).unwrap();

    let window = log.dialogue_window("cipher", "Ann", 6).unwrap();
    assert_eq!(window[0].role, Role::Assistant);
}

#[test]
fn window_is_the_newest_suffix() {
    let (_tmp, log) = temp_stream();
    for i in 0..30 {
        let author = if i % 2 == 0 { "Ann" } else { "Cipher" };
        log.append(&chat(author, "cipher", &format!("m{i}"))).unwrap();
    }

    let window = log.dialogue_window("cipher", "Ann", 6).unwrap();
    assert_eq!(window.len(), 12);
    let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
    let expected: Vec<String> = (18..30).map(|i| format!("m{i}")).collect();
    assert_eq!(contents, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn empty_and_missing_streams_give_empty_window() {
    let (_tmp, log) = temp_stream();
    assert!(log.dialogue_window("cipher", "Ann", 6).unwrap().is_empty());

    log.append(&chat("Ann", "cipher", "")).unwrap();
    assert!(log.dialogue_window("cipher", "Ann", 6).unwrap().is_empty());
}

#[test]
fn zero_turns_gives_nothing() {
    let entries = vec![chat("Ann", "cipher", "hi")];
    assert!(build_dialogue(&entries, "cipher", "Ann", 0).is_empty());
}

#[test]
fn summary_stands_in_for_missing_text() {
    let mut entry = chat("Ann", "cipher", "");
    entry.details.text = None;
    entry.summary = "from summary".into();

    let window = build_dialogue(&[entry], "cipher", "Ann", 6);
    assert_eq!(window, vec![DialogueMessage::user("from summary")]);
}
