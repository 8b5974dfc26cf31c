// SPDX-License-Identifier: MIT

//! Shared helpers for integration tests: canned API payloads, a
//! wiremock-backed test client, and condition polling.

use std::future::Future;
use std::time::Duration;

use saturn_client::{Client, ClientConfig};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Install the test log subscriber. Safe to call from every test; only
/// the first call installs.
#[allow(dead_code)]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Public user payload as returned by user-fetch endpoints.
#[allow(dead_code)]
pub fn user_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "created_at": "2021-03-01T12:00:00+00:00",
        "updated_at": "2021-03-02T08:30:00+00:00",
        "first_name": name,
        "last_name": "Example",
        "name": name,
        "grade": 11,
        "public": true,
        "is_ambassador": false,
        "hidden": false,
        "description": "",
        "affinity": 0,
        "school_id": "s-1",
        "school_title": "Example High",
        "tags": []
    })
}

/// Self-profile payload with the account-private field set.
#[allow(dead_code)]
pub fn self_user_json(id: u64) -> Value {
    let mut raw = user_json(id, "Ada Lovelace");
    let private = json!({
        "email": "ada@example.com",
        "profile_pic_url": "https://cdn.example/pfp.jpg",
        "birthday": "2003-12-10",
        "onboarded": true,
        "phone_number": "+15550001111",
        "phone_validated": true,
        "granted_scopes": ["user:read"],
        "hashid": "abc123"
    });
    raw.as_object_mut()
        .unwrap()
        .extend(private.as_object().unwrap().clone());
    raw
}

/// Client with tokens A1/R1 pointed at the mock server.
#[allow(dead_code)]
pub fn test_client(server: &MockServer, interval: Duration) -> Client {
    init_tracing();
    let config = ClientConfig::new("A1", "R1")
        .refresh_interval(interval)
        .api_base_url(server.uri());
    Client::new(config).expect("test config should validate")
}

/// Mount a self-profile endpoint that always succeeds.
#[allow(dead_code)]
pub async fn mount_self_profile(server: &MockServer, id: u64) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(self_user_json(id)))
        .mount(server)
        .await;
}

/// Mount a refresh endpoint that always returns the given body.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Poll `condition` until it holds or the timeout elapses.
#[allow(dead_code)]
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
