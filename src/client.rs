// SPDX-License-Identifier: MIT

//! The client runtime.
//!
//! Owns the transport session, the credential pair, the event bus, the
//! user cache, and the background refresh scheduler. `start()` opens the
//! session, dispatches `start`, and launches the scheduler; the
//! scheduler's first cycle triggers `token_refresh`, whose built-in
//! handler fetches the self profile and fires `ready` exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::cache::{BatchOutcome, UserCache};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::events::{Event, EventBus, EventPayload};
use crate::models::ClientUser;
use crate::refresh::{self, RefreshResponse, RefreshState};
use crate::transport::{Transport, ME, USERS};

/// The access/refresh token pair authenticating all API calls.
/// Replaced atomically by the refresh scheduler, its sole mutator.
pub(crate) struct Credentials {
    pub(crate) access: String,
    pub(crate) refresh: String,
}

/// Shared runtime state behind the [`Client`] handle.
pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) credentials: RwLock<Credentials>,
    pub(crate) bus: EventBus,
    /// Session slot; populated by `start()`, cleared by `close()`.
    transport: RwLock<Option<Transport>>,
    /// One-way flag, set on the first successful self fetch.
    ready: Arc<AtomicBool>,
    cache: UserCache,
    user: RwLock<Option<ClientUser>>,
    refresh_state: watch::Sender<RefreshState>,
    shutdown: watch::Sender<bool>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl ClientInner {
    /// Current transport session, or [`Error::NotReady`] before `start()`.
    pub(crate) async fn transport(&self) -> Result<Transport> {
        self.transport
            .read()
            .await
            .clone()
            .ok_or(Error::NotReady("the client session has not been started"))
    }

    /// Apply a refresh response under one write lock. A token absent from
    /// the response is left unchanged, never blanked.
    pub(crate) async fn apply_refresh(&self, response: RefreshResponse) {
        let mut credentials = self.credentials.write().await;
        if let Some(access) = response.access_token {
            credentials.access = access;
        }
        if let Some(refresh) = response.refresh_token {
            credentials.refresh = refresh;
        }
        tracing::debug!("Credential pair refreshed");
    }

    pub(crate) fn set_refresh_state(&self, state: RefreshState) {
        self.refresh_state.send_replace(state);
    }

    /// Fetch the authenticated self profile and store it. Dispatches
    /// `ready` exactly once, strictly after the user is stored.
    pub(crate) async fn fetch_self(&self) -> Result<ClientUser> {
        let transport = self.transport().await?;
        let access = self.credentials.read().await.access.clone();

        let raw = transport.get_json(ME, &access).await?;
        let user = ClientUser::from_value(raw)?;
        *self.user.write().await = Some(user.clone());

        if !self.ready.swap(true, Ordering::SeqCst) {
            tracing::info!(user_id = user.id, "Client ready");
            self.bus.dispatch(Event::Ready, EventPayload::empty()).await?;
        }

        Ok(user)
    }
}

/// Handle to a client runtime. Cheap to clone; all clones share one
/// session, credential pair, cache, and event registry.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Construct a runtime from validated configuration. The built-in
    /// self-fetch hook is registered as the first `token_refresh` handler
    /// here, before any external registration is possible.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let ready = Arc::new(AtomicBool::new(false));
        let (refresh_state, _) = watch::channel(RefreshState::Idle);
        let (shutdown, _) = watch::channel(false);

        let inner = Arc::new(ClientInner {
            credentials: RwLock::new(Credentials {
                access: config.access_token.clone(),
                refresh: config.refresh_token.clone(),
            }),
            bus: EventBus::new(),
            transport: RwLock::new(None),
            cache: UserCache::new(ready.clone()),
            ready,
            user: RwLock::new(None),
            refresh_state,
            shutdown,
            scheduler: Mutex::new(None),
            config,
        });

        let hook = Arc::downgrade(&inner);
        inner.bus.on(Event::TokenRefresh, move |_| {
            let hook = hook.clone();
            async move {
                match hook.upgrade() {
                    Some(inner) => inner.fetch_self().await.map(|_| ()),
                    None => Ok(()),
                }
            }
        });

        Ok(Self { inner })
    }

    /// Register an asynchronous handler for a named event. Handlers for
    /// one event are invoked in registration order but run concurrently.
    pub fn on<F, Fut>(&self, event: Event, handler: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.bus.on(event, handler);
    }

    /// Dispatch an event to every registered handler, waiting for all of
    /// them. Intended for endpoint code delivering `message` and custom
    /// events.
    pub async fn dispatch(&self, event: Event, payload: EventPayload) -> Result<()> {
        self.inner.bus.dispatch(event, payload).await
    }

    /// Open the transport session, dispatch `start`, and launch the
    /// refresh scheduler. Returns without waiting for the first refresh;
    /// `start` is always dispatched before the scheduler can fire
    /// `token_refresh`.
    pub async fn start(&self) -> Result<()> {
        {
            let mut slot = self.inner.transport.write().await;
            if slot.is_some() {
                return Err(Error::Config("client already started".into()));
            }
            *slot = Some(Transport::new(&self.inner.config.api_base_url));
        }
        tracing::info!("Client session opened");

        if let Err(e) = self
            .inner
            .bus
            .dispatch(Event::Start, EventPayload::empty())
            .await
        {
            tracing::warn!(error = %e, "start handler failure");
        }

        let shutdown = self.inner.shutdown.subscribe();
        let handle = tokio::spawn(refresh::run(Arc::downgrade(&self.inner), shutdown));
        *self.inner.scheduler.lock().await = Some(handle);

        Ok(())
    }

    /// Fetch the authenticated self profile. Transport and decode errors
    /// propagate to the caller; the background scheduler additionally
    /// surfaces them through the `error` event when its own hook fails.
    pub async fn fetch_self(&self) -> Result<ClientUser> {
        self.inner.fetch_self().await
    }

    /// Fetch the user listing and ingest it into the local cache
    /// best-effort. Requires the runtime to be ready, like any other
    /// cache mutation; per-entity decode failures are reported in the
    /// outcome alongside the successes.
    pub async fn fetch_users(&self) -> Result<BatchOutcome> {
        let transport = self.inner.transport().await?;
        let access = self.inner.credentials.read().await.access.clone();

        let raw = transport.get_json(USERS, &access).await?;
        let raws = match raw {
            serde_json::Value::Array(items) => items,
            _ => {
                return Err(Error::MalformedEntity(
                    "user listing: expected an array".into(),
                ))
            }
        };

        Ok(self.inner.cache.upsert_many(raws))
    }

    /// Stop the scheduler and release the session. Idempotent, safe to
    /// call without `start()`, and safe concurrently with an in-flight
    /// refresh (the attempt is cancelled cleanly).
    pub async fn close(&self) {
        self.inner.shutdown.send_replace(true);

        let handle = self.inner.scheduler.lock().await.take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                tracing::warn!("Refresh scheduler task panicked");
            }
        }

        if self.inner.transport.write().await.take().is_some() {
            tracing::info!("Client session closed");
        }
    }

    /// Current access token.
    pub async fn access_token(&self) -> String {
        self.inner.credentials.read().await.access.clone()
    }

    /// Current refresh token.
    pub async fn refresh_token(&self) -> String {
        self.inner.credentials.read().await.refresh.clone()
    }

    /// The authenticated user, once the first self fetch has completed.
    pub async fn user(&self) -> Option<ClientUser> {
        self.inner.user.read().await.clone()
    }

    /// Whether the runtime has established its identity. Never resets.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    /// Current scheduler state.
    pub fn refresh_state(&self) -> RefreshState {
        *self.inner.refresh_state.borrow()
    }

    /// The local user-entity cache.
    pub fn cache(&self) -> &UserCache {
        &self.inner.cache
    }
}
