use serde_json::json;

use meditation_service::timeline::{rewrite_payload, rewrite_timeline, UrlBuilder};

fn urls() -> UrlBuilder {
    UrlBuilder::new("http://api.example.com")
}

#[test]
fn rewrites_relative_wav_and_ahap_references() {
    let timeline = json!([
        {"atMs": 0, "kind": "wav", "file": "audio/intro.wav"},
        {"atMs": 1500, "kind": "ahap", "file": "pulse.ahap"},
    ]);

    let rewritten = rewrite_timeline(&timeline, &urls());

    assert_eq!(
        rewritten,
        json!([
            {"atMs": 0, "kind": "wav", "file": "http://api.example.com/api/meditations/audio/intro.wav"},
            {"atMs": 1500, "kind": "ahap", "file": "http://api.example.com/api/meditations/haptics/pulse.ahap"},
        ])
    );
}

#[test]
fn absolute_urls_pass_through_unchanged() {
    let timeline = json!([
        {"atMs": 0, "kind": "wav", "file": "http://cdn.example.com/a.wav"},
        {"atMs": 10, "kind": "ahap", "file": "https://cdn.example.com/b.ahap"},
    ]);

    assert_eq!(rewrite_timeline(&timeline, &urls()), timeline);
}

#[test]
fn unrecognized_kinds_and_malformed_entries_pass_through() {
    let timeline = json!([
        {"atMs": 0, "kind": "text", "file": "notes/intro.txt"},
        {"atMs": 10, "kind": "wav", "file": 42},
        {"atMs": 20, "kind": "wav", "file": ""},
        {"atMs": 30, "kind": "wav"},
        "not an object",
        {"atMs": 40, "kind": "wav", "file": "../escape.wav"},
    ]);

    assert_eq!(rewrite_timeline(&timeline, &urls()), timeline);
}

#[test]
fn non_array_timelines_pass_through() {
    for timeline in [json!(null), json!("legacy"), json!({"cues": []})] {
        assert_eq!(rewrite_timeline(&timeline, &urls()), timeline);
    }
}

#[test]
fn rewriting_does_not_mutate_the_input() {
    let timeline = json!([{"atMs": 0, "kind": "wav", "file": "a.wav"}]);
    let snapshot = timeline.clone();

    let _ = rewrite_timeline(&timeline, &urls());

    assert_eq!(timeline, snapshot);
}

#[test]
fn extra_entry_fields_survive_the_rewrite() {
    let timeline = json!([
        {"atMs": 0, "kind": "wav", "file": "a.wav", "gain": 0.5},
    ]);

    let rewritten = rewrite_timeline(&timeline, &urls());
    assert_eq!(rewritten[0]["gain"], json!(0.5));
    assert_eq!(
        rewritten[0]["file"],
        json!("http://api.example.com/api/meditations/audio/a.wav")
    );
}

#[test]
fn payload_rewrite_replaces_only_the_timeline_field() {
    let payload = json!({
        "id": "calm-1",
        "title": "Calm",
        "durationMs": 1000,
        "timeline": [{"atMs": 0, "kind": "wav", "file": "audio/calm-1.wav"}],
    });

    let rewritten = rewrite_payload(&payload, &urls());

    assert_eq!(rewritten["id"], json!("calm-1"));
    assert_eq!(
        rewritten["timeline"][0]["file"],
        json!("http://api.example.com/api/meditations/audio/calm-1.wav")
    );
}

#[test]
fn payload_without_timeline_gains_explicit_null() {
    let payload = json!({"id": "calm-1", "title": "Calm"});

    let rewritten = rewrite_payload(&payload, &urls());

    assert_eq!(rewritten["id"], json!("calm-1"));
    assert_eq!(rewritten["timeline"], json!(null));
    assert!(rewritten.as_object().unwrap().contains_key("timeline"));
}

#[test]
fn trailing_slash_in_base_url_is_tolerated() {
    let urls = UrlBuilder::new("http://api.example.com/");
    assert_eq!(
        urls.audio_url("a.wav"),
        "http://api.example.com/api/meditations/audio/a.wav"
    );
}
