// SPDX-License-Identifier: MIT

//! Tests for the runtime startup/ready sequence and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use saturn_client::{Error, Event};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{mount_refresh, mount_self_profile, self_user_json, test_client, user_json, wait_for};

const INTERVAL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(3);

#[tokio::test]
async fn test_ready_fires_once_and_observes_self_user() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let ready_count = Arc::new(AtomicUsize::new(0));
    let observed_id = Arc::new(AtomicUsize::new(0));

    let client = test_client(&server, INTERVAL);
    let counter = ready_count.clone();
    let observed = observed_id.clone();
    let me = client.clone();
    client.on(Event::Ready, move |_| {
        let me = me.clone();
        let counter = counter.clone();
        let observed = observed.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            // The self user must already be populated inside the ready
            // handler.
            let user = me.user().await.expect("user set before ready");
            observed.store(user.id as usize, Ordering::SeqCst);
            Ok(())
        }
    });

    client.start().await.unwrap();

    let c = client.clone();
    assert!(wait_for(|| async { c.is_ready() }, WAIT).await);
    assert_eq!(observed_id.load(Ordering::SeqCst), 7);

    // Let several more refresh cycles (each re-fetching the self profile)
    // go by, plus explicit re-fetches.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.fetch_self().await.unwrap();
    client.fetch_self().await.unwrap();

    assert_eq!(ready_count.load(Ordering::SeqCst), 1);
    assert_eq!(client.user().await.unwrap().id, 7);
    assert_eq!(client.user().await.unwrap().profile().email, "ada@example.com");

    client.close().await;
}

#[tokio::test]
async fn test_start_dispatched_before_first_token_refresh() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let order = Arc::new(Mutex::new(Vec::new()));

    let client = test_client(&server, Duration::from_secs(3600));
    let o = order.clone();
    client.on(Event::Start, move |_| {
        o.lock().unwrap().push("start");
        async { Ok(()) }
    });
    let o = order.clone();
    client.on(Event::TokenRefresh, move |_| {
        o.lock().unwrap().push("token_refresh");
        async { Ok(()) }
    });

    client.start().await.unwrap();

    let o = order.clone();
    assert!(wait_for(|| async { o.lock().unwrap().len() >= 2 }, WAIT).await);
    assert_eq!(order.lock().unwrap()[..2], ["start", "token_refresh"]);

    client.close().await;
}

#[tokio::test]
async fn test_fetch_self_before_start_is_not_ready() {
    let server = MockServer::start().await;
    let client = test_client(&server, INTERVAL);

    let err = client.fetch_self().await.unwrap_err();
    assert!(matches!(err, Error::NotReady(_)));
    assert!(!client.is_ready());
}

#[tokio::test]
async fn test_cache_is_gated_until_ready() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let client = test_client(&server, INTERVAL);

    let err = client.cache().upsert(user_json(1, "Ada")).unwrap_err();
    assert!(matches!(err, Error::NotReady(_)));

    client.start().await.unwrap();
    let c = client.clone();
    assert!(wait_for(|| async { c.is_ready() }, WAIT).await);

    let user = client.cache().upsert(user_json(1, "Ada")).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(client.cache().get(1).unwrap().name, "Ada");

    client.close().await;
}

#[tokio::test]
async fn test_malformed_self_profile_surfaces_and_does_not_mark_ready() {
    let server = MockServer::start().await;
    mount_refresh(&server, json!({})).await;
    // Missing the entire private field set and most public fields.
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;

    let errors = Arc::new(AtomicUsize::new(0));

    let client = test_client(&server, INTERVAL);
    let e = errors.clone();
    client.on(Event::Error, move |_| {
        e.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    client.start().await.unwrap();

    // The built-in hook fails each cycle and surfaces via the error
    // event; the loop keeps running and the runtime never becomes ready.
    let e = errors.clone();
    assert!(wait_for(|| async { e.load(Ordering::SeqCst) >= 2 }, WAIT).await);
    assert!(!client.is_ready());
    assert!(client.user().await.is_none());

    let err = client.fetch_self().await.unwrap_err();
    assert!(matches!(err, Error::MalformedEntity(_)));

    client.close().await;
}

#[tokio::test]
async fn test_close_without_start_is_a_noop() {
    let server = MockServer::start().await;
    let client = test_client(&server, INTERVAL);

    client.close().await;
    client.close().await;
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let client = test_client(&server, Duration::from_secs(3600));
    client.start().await.unwrap();
    assert!(matches!(client.start().await, Err(Error::Config(_))));

    client.close().await;
}

#[tokio::test]
async fn test_close_cancels_sleeping_scheduler_promptly() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let refreshes = Arc::new(AtomicUsize::new(0));

    // Hour-long interval: after the first cycle the loop sits in its
    // sleep, where close() must still reach it.
    let client = test_client(&server, Duration::from_secs(3600));
    let r = refreshes.clone();
    client.on(Event::TokenRefresh, move |_| {
        r.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    client.start().await.unwrap();
    let c = client.clone();
    assert!(wait_for(|| async { c.is_ready() }, WAIT).await);

    tokio::time::timeout(Duration::from_secs(1), client.close())
        .await
        .expect("close() must not wait out the refresh interval");

    // No further cycles after shutdown.
    let count = refreshes.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(refreshes.load(Ordering::SeqCst), count);
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    mount_refresh(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;

    let client = test_client(&server, Duration::from_secs(3600));
    client.start().await.unwrap();

    let err = client.fetch_self().await.unwrap_err();
    assert!(err.is_auth_error(), "expected an auth error, got: {err}");
    assert!(!client.is_ready());

    client.close().await;
}

#[tokio::test]
async fn test_fetch_users_ingests_listing_into_cache() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            user_json(1, "A"),
            user_json(2, "B"),
            {"id": 3},
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server, INTERVAL);
    client.start().await.unwrap();
    let c = client.clone();
    assert!(wait_for(|| async { c.is_ready() }, WAIT).await);

    let outcome = client.fetch_users().await.unwrap();
    assert_eq!(outcome.users.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 2);
    assert_eq!(client.cache().get(1).unwrap().name, "A");
    assert!(client.cache().get(3).is_none());

    client.close().await;
}

#[tokio::test]
async fn test_upsert_many_through_client_cache() {
    let server = MockServer::start().await;
    mount_self_profile(&server, 7).await;
    mount_refresh(&server, json!({})).await;

    let client = test_client(&server, INTERVAL);
    client.start().await.unwrap();
    let c = client.clone();
    assert!(wait_for(|| async { c.is_ready() }, WAIT).await);

    // A self-profile payload is also a valid public user payload.
    let outcome = client.cache().upsert_many(vec![
        user_json(1, "A"),
        self_user_json(2),
        json!({"nonsense": true}),
        user_json(4, "D"),
    ]);
    assert_eq!(outcome.users.len(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 2);
    assert_eq!(client.cache().len(), 3);

    client.close().await;
}
