//! Cache and resource behaviour through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use waymark::resource::{ReadError, ResourceError, ResourceStatus};
use waymark::{create_resource, Cache, EntryOptions, Loader, Priority, ResourceStore, Route, Router};

#[tokio::test]
async fn test_ttl_expiry_cleans_tag_index() {
    let cache: Cache<u32> = Cache::new(8);
    cache.set(
        "short",
        1,
        EntryOptions::new().ttl(Duration::from_millis(10)).tag("feed"),
    );
    cache.set("long", 2, EntryOptions::new().tag("feed"));
    assert_eq!(cache.keys_for_tag("feed"), vec!["long", "short"]);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!cache.has("short"));
    assert_eq!(cache.get("short"), None);
    assert_eq!(cache.keys_for_tag("feed"), vec!["long"]);
    assert_eq!(cache.get("long"), Some(2));
    assert_eq!(cache.stats().expirations, 1);
}

#[test]
fn test_eviction_prefers_low_priority_then_oldest_access() {
    let cache: Cache<&'static str> = Cache::new(3);
    cache.set("critical", "c", EntryOptions::new().priority(Priority::Critical));
    cache.set("old", "o", EntryOptions::new());
    cache.set("young", "y", EntryOptions::new());

    // Touching `old` makes `young` the least recently used normal entry.
    assert_eq!(cache.get("old"), Some("o"));
    cache.set("new", "n", EntryOptions::new());

    assert!(cache.has("critical"));
    assert!(cache.has("old"));
    assert!(!cache.has("young"));
    assert!(cache.has("new"));
    assert_eq!(cache.stats().evictions, 1);

    cache.set("low", "l", EntryOptions::new().priority(Priority::Low));
    cache.set("another", "a", EntryOptions::new());
    assert!(!cache.has("low"));
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_full_cache_drops_expired_before_evicting() {
    let cache: Cache<u8> = Cache::new(2);
    cache.set("stale", 0, EntryOptions::new().ttl(Duration::ZERO));
    cache.set("keep", 1, EntryOptions::new().priority(Priority::Low));
    cache.set("fresh", 2, EntryOptions::new());

    assert!(cache.has("keep"));
    assert!(cache.has("fresh"));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_invalidate_by_tags_counts_distinct_entries() {
    let cache: Cache<u8> = Cache::new(8);
    cache.set("a", 1, EntryOptions::new().tags(["users", "admin"]));
    cache.set("b", 2, EntryOptions::new().tag("users"));
    cache.set("c", 3, EntryOptions::new().tag("posts"));

    assert_eq!(cache.invalidate_by_tags(["users", "admin"]), 2);
    assert!(!cache.has_tag("users"));
    assert!(!cache.has_tag("admin"));
    assert!(cache.has("c"));
    assert_eq!(cache.invalidate_by_tags(["missing"]), 0);
}

#[test]
fn test_replacing_a_key_reindexes_tags() {
    let cache: Cache<u8> = Cache::new(4);
    cache.set("k", 1, EntryOptions::new().tag("old"));
    cache.set("k", 2, EntryOptions::new().tag("new"));

    assert!(!cache.has_tag("old"));
    assert_eq!(cache.keys_for_tag("new"), vec!["k"]);
    assert_eq!(cache.get("k"), Some(2));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_resource_pending_then_success() {
    let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
    let resource = create_resource(async move { rx.await.map_err(ResourceError::new) });

    assert_eq!(resource.status(), ResourceStatus::Pending);
    let suspense = match resource.read() {
        Err(ReadError::Pending(suspense)) => suspense,
        other => panic!("expected pending, got {other:?}"),
    };
    assert!(resource.peek().is_none());

    tx.send(7).unwrap();
    suspense.wait().await;
    assert!(suspense.is_settled());
    assert_eq!(resource.read().unwrap(), 7);
    assert_eq!(resource.status(), ResourceStatus::Success);
}

#[tokio::test]
async fn test_resource_failure_is_rethrown() {
    let resource: waymark::Resource<u32> =
        create_resource(async { Err(ResourceError::new("offline")) });

    match resource.settled().await {
        Err(ReadError::Failed(error)) => assert_eq!(error.to_string(), "offline"),
        other => panic!("expected failure, got {other:?}"),
    }
    // Reading again yields the same error instead of recomputing.
    assert!(matches!(resource.read(), Err(ReadError::Failed(_))));
    assert_eq!(resource.status(), ResourceStatus::Error);
}

#[tokio::test]
async fn test_store_reuses_resource_until_invalidated() {
    let store: ResourceStore<u32> = ResourceStore::new();
    let runs = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let runs = Arc::clone(&runs);
        let resource = store.get_or_create("answer", move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        });
        assert_eq!(resource.settled().await.unwrap(), 42);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    assert!(store.invalidate("answer"));
    assert!(!store.invalidate("answer"));
    let runs_again = Arc::clone(&runs);
    store
        .get_or_create("answer", move || async move {
            runs_again.fetch_add(1, Ordering::SeqCst);
            Ok(43)
        })
        .settled()
        .await
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_route_cache_policy_skips_reload() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let stats = Route::parse("/stats")
        .unwrap()
        .with_cache_policy(
            EntryOptions::new()
                .ttl(Duration::from_secs(60))
                .priority(Priority::High)
                .tag("stats"),
        )
        .with_loader(Loader::new(move |_| {
            let n = counted.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!({ "load": n })) }
        }));
    let router = Router::builder().route(stats).build();

    let first = router.navigate("/stats").await.unwrap();
    let second = router.navigate("/stats").await.unwrap();
    assert_eq!(first.data, second.data);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(router.cache().invalidate_by_tags(["stats"]), 1);
    let third = router.navigate("/stats").await.unwrap();
    assert_eq!(third.data, Some(json!({ "load": 1 })));
}

#[tokio::test]
async fn test_janitor_purges_until_shutdown() {
    let cache = Arc::new(Cache::<u8>::new(4));
    cache.set("gone", 1, EntryOptions::new().ttl(Duration::from_millis(5)));
    cache.set("kept", 2, EntryOptions::new());

    let shutdown = waymark::Shutdown::new();
    let janitor = tokio::spawn(
        Arc::clone(&cache).run_janitor(Duration::from_millis(10), shutdown.subscribe()),
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.peek_entry("gone").is_none());
    assert!(cache.peek_entry("kept").is_some());

    shutdown.trigger();
    janitor.await.unwrap();
}
