//! Tests against a running Redis server.
//!
//! Run with: cargo test -p redigate-kv --test live_redis -- --ignored
//! The server is taken from REDIGATE_HOST / REDIGATE_PORT / REDIGATE_PASSWORD
//! (default 127.0.0.1:6379).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use redigate_core::StoreProperties;
use redigate_kv::{KvService, Operation, Redigate, StoredValue};

fn live() -> Redigate {
    let properties = StoreProperties::default()
        .with_env_overrides()
        .expect("invalid REDIGATE_* environment");
    Redigate::connect(StoreProperties {
        enabled: true,
        ..properties
    })
    .expect("invalid store properties")
}

fn key(name: &str) -> String {
    format!("redigate-test:{}:{}", std::process::id(), name)
}

async fn cleanup(kv: &KvService, keys: &[&str]) {
    for k in keys {
        kv.remove_object(k).await.unwrap();
    }
}

#[tokio::test]
#[ignore] // Requires a running Redis server
async fn test_live_object_round_trip() {
    let redigate = live();
    let kv = redigate.service();
    let k = key("user");

    kv.set_cache_object(&k, "{\"name\":\"a\"}").await.unwrap();
    assert_eq!(
        kv.get_cache_object::<String>(&k).await.unwrap().as_deref(),
        Some("{\"name\":\"a\"}")
    );
    assert!(kv.remove_object(&k).await.unwrap());
    assert_eq!(kv.get_cache_object::<String>(&k).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires a running Redis server
async fn test_live_counters_and_expiry() {
    let redigate = live();
    let kv = redigate.service();
    let k = key("counter");
    cleanup(&kv, &[&k]).await;

    assert_eq!(kv.increase_key(&k).await.unwrap(), 1);
    assert_eq!(kv.decrease_key_by(&k, 1).await.unwrap(), 0);
    assert_eq!(
        kv.increase_key_by_ex(&k, 5, Duration::from_secs(60)).await.unwrap(),
        5
    );

    let ttl = kv.ttl(&k).await.unwrap().expect("expiry should be set");
    assert!(ttl <= Duration::from_secs(60));
    assert!(kv.persist(&k).await.unwrap());
    assert_eq!(kv.ttl(&k).await.unwrap(), None);

    cleanup(&kv, &[&k]).await;
}

#[tokio::test]
#[ignore] // Requires a running Redis server
async fn test_live_concurrent_increments() {
    let redigate = live();
    let kv: Arc<KvService> = redigate.service();
    let k = key("concurrent");
    cleanup(&kv, &[&k]).await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let kv = kv.clone();
            let k = k.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    kv.increase_key_by(&k, 1).await.unwrap();
                }
            })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    assert_eq!(kv.get_cache_object::<i64>(&k).await.unwrap(), Some(500));
    cleanup(&kv, &[&k]).await;
}

#[tokio::test]
#[ignore] // Requires a running Redis server
async fn test_live_collections_and_inspect() {
    let redigate = live();
    let kv = redigate.service();
    let (list, set, hash) = (key("list"), key("set"), key("hash"));
    cleanup(&kv, &[&list, &set, &hash]).await;

    assert_eq!(kv.set_cache_list(&list, ["a", "b"]).await.unwrap(), 2);
    assert_eq!(kv.get_cache_list::<String>(&list).await.unwrap(), vec!["a", "b"]);

    assert_eq!(kv.set_cache_set(&set, [1, 2, 2]).await.unwrap(), 2);
    assert_eq!(
        kv.get_cache_set::<i64>(&set).await.unwrap(),
        HashSet::from([1, 2])
    );

    kv.set_cache_map(&hash, [("x", 1), ("y", 2)]).await.unwrap();
    assert_eq!(
        kv.get_multi_cache_map_value::<i64, _>(&hash, &["y", "nope"])
            .await
            .unwrap(),
        vec![Some(2), None]
    );

    assert!(matches!(
        kv.inspect(&list).await.unwrap(),
        Some(StoredValue::List(items)) if items.len() == 2
    ));
    let types = kv.key_types().await.unwrap();
    assert_eq!(types.get(&hash).map(String::as_str), Some("hash"));

    cleanup(&kv, &[&list, &set, &hash]).await;
}

#[tokio::test]
#[ignore] // Requires a running Redis server
async fn test_live_gate() {
    let redigate = live();
    assert!(redigate.provider().status().await.connected);

    let reported = redigate
        .gate()
        .call(Operation::new("produce").channel("redigate-test"), |kv| async move {
            kv.produce("redigate-test", "ping").await
        })
        .await;
    assert!(reported.is_success());
    assert!(reported.value >= 0);
}
