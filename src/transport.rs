// SPDX-License-Identifier: MIT

//! HTTP transport for the Saturn API.
//!
//! Thin wrapper around `reqwest` that owns the platform's default header
//! set and maps every failure mode (network error, non-2xx status,
//! unparseable body) to [`Error::Transport`].

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use serde_json::Value;

use crate::error::{Error, Result};

/// Credential refresh endpoint (POST, unauthenticated, tokens in the body).
pub(crate) const REFRESH_AUTH: &str = "/auth/token/refresh";

/// Self-profile endpoint (GET, authenticated).
pub(crate) const ME: &str = "/users/me";

/// User listing endpoint (GET, authenticated, returns an array).
pub(crate) const USERS: &str = "/users";

/// HTTP session for one client runtime.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
}

impl Transport {
    /// Open a transport session against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf-8"),
        );

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            default_headers: headers,
        }
    }

    /// Authenticated GET returning the JSON body.
    pub async fn get_json(&self, path: &str, access_token: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .headers(self.default_headers.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Unauthenticated POST with a JSON body, returning the JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .headers(self.default_headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json(&self, response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(Error::Transport(format!(
                    "{}: credentials rejected",
                    Error::AUTH_ERROR_MARKER
                )));
            }

            return Err(Error::Transport(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("JSON parse error: {}", e)))
    }
}
