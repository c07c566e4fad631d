use super::*;
use serde_json::json;
use std::time::Duration;

fn memory_cache(capacity: usize, ttl_secs: u64) -> Cache {
    Cache::new(
        Arc::new(MemoryCacheStore::new(capacity)),
        Duration::from_secs(ttl_secs),
    )
}

#[tokio::test]
async fn test_round_trip() {
    let cache = memory_cache(16, 60);

    cache.set_json("video_analysis:abc:free", &json!({"count": 3})).await;
    let got: Option<Value> = cache.get_json("video_analysis:abc:free").await;
    assert_eq!(got, Some(json!({"count": 3})));
}

#[tokio::test]
async fn test_typed_round_trip() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Payload {
        title: String,
        likes: u64,
    }

    let cache = memory_cache(16, 60);
    let payload = Payload {
        title: "intro".to_string(),
        likes: 12,
    };

    cache.set_json("k", &payload).await;
    let got: Option<Payload> = cache.get_json("k").await;
    assert_eq!(got, Some(payload));
}

#[tokio::test]
async fn test_miss_on_absent_key() {
    let cache = memory_cache(16, 60);
    let got: Option<Value> = cache.get_json("never-set").await;
    assert!(got.is_none());
}

#[tokio::test]
async fn test_expiry_is_logical_absence() {
    let store = MemoryCacheStore::new(16);
    assert!(
        store
            .set("k", json!(1), Some(Duration::from_millis(30)))
            .await
    );
    assert_eq!(store.get("k").await, Some(json!(1)));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(store.get("k").await, None);
}

#[tokio::test]
async fn test_no_ttl_never_expires() {
    let store = MemoryCacheStore::new(16);
    assert!(store.set("k", json!("pinned"), None).await);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(store.get("k").await, Some(json!("pinned")));
}

#[tokio::test]
async fn test_malformed_payload_is_a_miss() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(16));
    // A string where the caller expects a number-shaped struct.
    store
        .set("k", json!("not-a-struct"), Some(Duration::from_secs(60)))
        .await;

    #[derive(serde::Deserialize)]
    struct Expected {
        #[allow(dead_code)]
        count: u64,
    }

    let cache = Cache::new(store, Duration::from_secs(60));
    let got: Option<Expected> = cache.get_json("k").await;
    assert!(got.is_none());
}

#[tokio::test]
async fn test_lru_eviction_on_overflow() {
    let store = MemoryCacheStore::new(2);

    store.set("a", json!(1), None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.set("b", json!(2), None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Touch "a" so "b" becomes the least recently used entry.
    assert!(store.get("a").await.is_some());
    tokio::time::sleep(Duration::from_millis(5)).await;

    store.set("c", json!(3), None).await;

    assert!(store.get("a").await.is_some());
    assert!(store.get("b").await.is_none());
    assert!(store.get("c").await.is_some());
}

#[tokio::test]
async fn test_expired_entries_evicted_before_live_ones() {
    let store = MemoryCacheStore::new(2);

    store
        .set("stale", json!(0), Some(Duration::from_millis(10)))
        .await;
    store.set("live", json!(1), None).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Overflow eviction drops the expired entry, not the live one.
    store.set("fresh", json!(2), None).await;
    assert!(store.get("live").await.is_some());
    assert!(store.get("fresh").await.is_some());
    assert!(store.get("stale").await.is_none());
}

#[tokio::test]
async fn test_clear_removes_entry() {
    let cache = memory_cache(16, 60);
    cache.set_json("k", &json!(5)).await;
    cache.clear("k").await;
    let got: Option<Value> = cache.get_json("k").await;
    assert!(got.is_none());
}
