// SPDX-License-Identifier: MIT

//! Background credential-refresh scheduler.
//!
//! One refresh cycle: POST the current credential pair to the refresh
//! endpoint, apply whichever tokens the response supplies, dispatch
//! `token_refresh`, then sleep for the configured interval. The first
//! cycle runs immediately on startup; a failed cycle marks the state
//! `Failed`, dispatches `error`, and retries on the next tick without
//! backoff. The loop observes shutdown promptly, including while
//! sleeping or mid-request.

use std::sync::Weak;

use serde::Deserialize;
use tokio::sync::watch;

use crate::client::ClientInner;
use crate::error::{Error, Result};
use crate::events::{Event, EventPayload};
use crate::transport::REFRESH_AUTH;

/// Scheduler state, observable via [`Client::refresh_state`](crate::Client::refresh_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Waiting for the next tick.
    Idle,
    /// A refresh attempt is in flight.
    Refreshing,
    /// The last attempt failed; the scheduler will retry on its next tick.
    Failed,
}

/// Refresh endpoint response. A missing or null token means "leave the
/// stored one unchanged".
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(default)]
    pub(crate) access_token: Option<String>,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
}

/// Run the refresh loop until shutdown. Holds only a weak handle to the
/// runtime between cycles so a dropped client also stops the loop.
pub(crate) async fn run(client: Weak<ClientInner>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let Some(inner) = client.upgrade() else { return };
        let interval = inner.config.refresh_interval;

        inner.set_refresh_state(RefreshState::Refreshing);
        tokio::select! {
            result = run_cycle(&inner) => match result {
                Ok(()) => inner.set_refresh_state(RefreshState::Idle),
                Err(e) => {
                    inner.set_refresh_state(RefreshState::Failed);
                    tracing::warn!(error = %e, "Refresh cycle failed; retrying on the next tick");
                    report_failure(&inner, &e).await;
                }
            },
            _ = shutdown.changed() => {
                tracing::debug!("Refresh loop cancelled during an in-flight attempt");
                return;
            }
        }
        drop(inner);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                tracing::debug!("Refresh loop stopped");
                return;
            }
        }
    }
}

/// One refresh attempt against the refresh endpoint.
async fn run_cycle(inner: &ClientInner) -> Result<()> {
    tracing::debug!("Attempting token refresh");

    let transport = inner.transport().await?;
    let body = {
        let credentials = inner.credentials.read().await;
        serde_json::json!({
            "access_token": credentials.access,
            "refresh_token": credentials.refresh,
        })
    };

    let response = transport.post_json(REFRESH_AUTH, &body).await?;
    let refreshed = RefreshResponse::deserialize(&response)
        .map_err(|e| Error::Transport(format!("JSON parse error: {}", e)))?;
    inner.apply_refresh(refreshed).await;

    // Handler failures (including the built-in self-fetch hook) must not
    // fail the cycle itself; they surface through the error event.
    if let Err(e) = inner
        .bus
        .dispatch(Event::TokenRefresh, EventPayload::empty())
        .await
    {
        tracing::warn!(error = %e, "token_refresh handler failure");
        report_failure(inner, &e).await;
    }

    Ok(())
}

/// Surface a background failure through the error event. Failures of the
/// error handlers themselves are only logged, never re-dispatched.
async fn report_failure(inner: &ClientInner, error: &Error) {
    if let Err(e) = inner
        .bus
        .dispatch(Event::Error, EventPayload::failure(error))
        .await
    {
        tracing::warn!(error = %e, "error handler failure");
    }
}
