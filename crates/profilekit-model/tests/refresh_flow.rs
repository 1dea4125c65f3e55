//! End-to-end refresh flow: fetch → offline edits → merge → partial update.
//!
//! Exercises the path the surrounding SDK drives: a profile is constructed
//! from a fetched wire object, mutated while the server copy moves on,
//! reconciled against a freshly fetched copy, and the changed subset is
//! serialized as the update payload. The TTL cache sits beside the flow
//! and is expired explicitly when the update invalidates a cached read.

use profilekit_cache::TtlCache;
use profilekit_model::Profile;
use profilekit_types::ProfileData;
use serde_json::json;

fn decode(value: serde_json::Value) -> ProfileData {
    serde_json::from_value(value).expect("well-formed wire object")
}

#[test]
fn test_offline_edits_survive_refresh() {
    // Initially fetched copy.
    let mut local = Profile::from_data(decode(json!({
        "id": "p1",
        "version": "3",
        "createdAt": 1_700_000_000_000u64,
        "attributes": [
            {"collectApp": "web", "section": "default", "data": {"plan": "free"}}
        ],
        "sessions": []
    })))
    .unwrap();
    local.reset_dirty();

    // Offline edits: an attribute change and a new session with an event.
    local
        .get_attribute_mut("plan", "web", "default")
        .unwrap()
        .set_value(json!("pro"));
    local
        .set_session(serde_json::from_value::<profilekit_types::SessionData>(json!({
            "id": "s-local",
            "collectApp": "web",
            "section": "default",
            "createdAt": 1_700_000_001_000u64,
            "data": {},
            "events": [
                {"id": "e1", "definitionId": "click", "createdAt": 1_700_000_001_500u64, "data": {"x": 1}}
            ]
        }))
        .unwrap())
        .unwrap();

    // Meanwhile the server moved on: plan bumped remotely, a session added.
    let foreign = Profile::from_data(decode(json!({
        "id": "p1",
        "version": "4",
        "createdAt": 1_700_000_000_000u64,
        "attributes": [
            {"collectApp": "web", "section": "default", "data": {"plan": "trial", "region": "eu"}}
        ],
        "sessions": [
            {"id": "s-remote", "collectApp": "web", "section": "default",
             "createdAt": 1_700_000_002_000u64, "data": {}, "events": []}
        ]
    })))
    .unwrap();

    local.merge(&foreign).unwrap();

    // Local edit wins the attribute conflict; foreign additions survive.
    assert_eq!(
        local.get_attribute("plan", "web", "default").unwrap().value(),
        &json!("pro")
    );
    assert_eq!(
        local.get_attribute("region", "web", "default").unwrap().value(),
        &json!("eu")
    );
    assert_eq!(local.version(), Some("4"));
    assert!(local.get_session("s-local").is_some());
    assert!(local.get_session("s-remote").is_some());

    // The update payload carries exactly the locally changed subset.
    let delta = local.serialize(true);
    assert_eq!(delta.attributes.len(), 1);
    assert_eq!(delta.attributes[0].data.get("plan"), Some(&json!("pro")));
    assert!(!delta.attributes[0].data.contains_key("region"));
    let session_ids: Vec<_> = delta.sessions.iter().filter_map(|s| s.id.as_deref()).collect();
    assert_eq!(session_ids, ["s-local"]);
}

#[test]
fn test_shallow_merge_worked_example() {
    // L = {id:"p", sessions:[{id:"s1", data:{a:1}, events:[{id:"e1", data:{x:1}}]}]}
    // F = same session/event ids with data {b:2} / {y:2}.
    let mut local = Profile::from_data(decode(json!({
        "id": "p",
        "sessions": [{
            "id": "s1", "collectApp": "web", "section": "default", "createdAt": 1u64,
            "data": {"a": 1},
            "events": [{"id": "e1", "definitionId": "d", "createdAt": 1u64, "data": {"x": 1}}]
        }]
    })))
    .unwrap();

    let foreign = Profile::from_data(decode(json!({
        "id": "p",
        "sessions": [{
            "id": "s1", "collectApp": "web", "section": "default", "createdAt": 1u64,
            "data": {"b": 2},
            "events": [{"id": "e1", "definitionId": "d", "createdAt": 1u64, "data": {"y": 2}}]
        }]
    })))
    .unwrap();

    local.merge(&foreign).unwrap();

    let session = local.get_session("s1").unwrap();
    assert_eq!(session.data().get("a"), Some(&json!(1)));
    assert_eq!(session.data().get("b"), Some(&json!(2)));
    let event = session.get_event("e1").unwrap();
    assert_eq!(event.data().get("x"), Some(&json!(1)));
    assert_eq!(event.data().get("y"), Some(&json!(2)));
    assert_eq!(local.session_count(), 1);
}

#[test]
fn test_cache_expired_after_update() {
    let mut cache: TtlCache<ProfileData> = TtlCache::new();

    let mut profile = Profile::from_data(decode(json!({
        "id": "p1",
        "attributes": [
            {"collectApp": "web", "section": "default", "data": {"plan": "free"}}
        ],
        "sessions": []
    })))
    .unwrap();
    profile.reset_dirty();

    let key = format!("attributes:{}", profile.id());
    cache.set(key.clone(), profile.serialize(false));
    assert!(cache.get(&key).is_some());

    // A successful attribute update invalidates the cached read.
    profile
        .get_attribute_mut("plan", "web", "default")
        .unwrap()
        .set_value(json!("pro"));
    assert!(profile.has_changes());
    cache.expire(&key);

    assert!(cache.get(&key).is_none());
}
