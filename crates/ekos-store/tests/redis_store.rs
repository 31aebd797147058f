//! Redis document store integration tests.

use chrono::Utc;
use serde_json::json;

use ekos_store::{DocumentStore, RedisStore, StoreError};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

/// Store under a namespace no other run shares.
fn store() -> (RedisStore, String) {
    let namespace = format!("ekos-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let store = RedisStore::new(&redis_url(), &namespace).expect("Failed to create store");
    (store, namespace)
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_create_rejects_existing_id() {
    let (store, _) = store();
    store.ping().await.expect("Redis not reachable");

    let doc = store.create("tasks", "t1", json!({"status": "pending"})).await.unwrap();
    assert_eq!(doc.version, 1);

    let err = store.create("tasks", "t1", json!({})).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_stale_replace_is_rejected() {
    let (store, _) = store();
    store.create("content", "c1", json!({"title": "a"})).await.unwrap();

    let second = store.replace("content", "c1", json!({"title": "b"}), 1).await.unwrap();
    assert_eq!(second.version, 2);

    let err = store
        .replace("content", "c1", json!({"title": "stale"}), 1)
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());

    let stored = store.get("content", "c1").await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.data["title"], "b");

    let missing = store.replace("content", "nope", json!({}), 1).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_put_bumps_version() {
    let (store, _) = store();

    let first = store.put("settings", "system_settings", json!({"a": 1})).await.unwrap();
    assert_eq!(first.version, 1);
    let second = store.put("settings", "system_settings", json!({"a": 2})).await.unwrap();
    assert_eq!(second.version, 2);

    let stored = store.get("settings", "system_settings").await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.data["a"], 2);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_list_skips_deleted_documents() {
    let (store, namespace) = store();
    for id in ["p1", "p2", "p3"] {
        store.create("publications", id, json!({"id": id})).await.unwrap();
    }

    assert!(store.delete("publications", "p1").await.unwrap());
    assert!(!store.delete("publications", "p1").await.unwrap());

    // Remove a hash behind the store's back; its index entry stays
    let client = redis::Client::open(redis_url()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    redis::cmd("DEL")
        .arg(format!("{namespace}:publications:p2"))
        .query_async::<()>(&mut conn)
        .await
        .unwrap();

    let ids: Vec<String> = store
        .list("publications")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["p3".to_string()]);
}
