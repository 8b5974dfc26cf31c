// SPDX-License-Identifier: MIT

//! Named-event registry with concurrent fan-out dispatch.
//!
//! The runtime pre-declares a fixed set of events (`ready`, `message`,
//! `error`, `token_refresh`, `start`); consumers may register handlers
//! under new names as well. Dispatch to a name with no handlers is a
//! silent no-op so that new event names never break existing dispatch
//! sites.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::join_all;
use serde_json::Value;

use crate::error::{Error, Result};

/// A named event the runtime or a consumer can dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// First successful self-profile fetch completed; `user` is populated.
    Ready,
    /// Reserved for endpoint code delivering inbound messages.
    Message,
    /// A background failure; payload carries the failure detail.
    Error,
    /// A credential refresh cycle completed successfully.
    TokenRefresh,
    /// The runtime session was opened.
    Start,
    /// A consumer-defined event name.
    Custom(String),
}

impl Event {
    /// The event names registered at bus construction.
    pub(crate) const DECLARED: [Event; 5] = [
        Event::Ready,
        Event::Message,
        Event::Error,
        Event::TokenRefresh,
        Event::Start,
    ];

    /// Wire/display name of the event.
    pub fn name(&self) -> &str {
        match self {
            Event::Ready => "ready",
            Event::Message => "message",
            Event::Error => "error",
            Event::TokenRefresh => "token_refresh",
            Event::Start => "start",
            Event::Custom(name) => name,
        }
    }

    /// Construct a consumer-defined event.
    pub fn custom(name: impl Into<String>) -> Self {
        Event::Custom(name.into())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque per-event data bag passed to every handler.
///
/// Built-in events dispatch with an empty payload except `error`, which
/// carries `{"error": <detail>}`.
#[derive(Clone, Debug, Default)]
pub struct EventPayload(Option<Arc<Value>>);

impl EventPayload {
    /// A payload carrying no data.
    pub fn empty() -> Self {
        Self(None)
    }

    /// A payload carrying arbitrary JSON data.
    pub fn json(value: Value) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// Failure-detail payload used for the `error` event.
    pub fn failure(detail: impl fmt::Display) -> Self {
        Self::json(serde_json::json!({ "error": detail.to_string() }))
    }

    /// The attached data, if any.
    pub fn value(&self) -> Option<&Value> {
        self.0.as_deref()
    }
}

/// Boxed future returned by an event handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A registered event handler.
pub type Handler = Arc<dyn Fn(EventPayload) -> HandlerFuture + Send + Sync>;

/// Registry of named events to ordered handler lists.
pub struct EventBus {
    handlers: DashMap<Event, Vec<Handler>>,
}

impl EventBus {
    /// Create a bus with the pre-declared event set.
    pub fn new() -> Self {
        let handlers = DashMap::new();
        for event in Event::DECLARED {
            handlers.insert(event, Vec::new());
        }
        Self { handlers }
    }

    /// Append a handler to an event's ordered list. Unknown event names
    /// get their list created lazily.
    pub fn register(&self, event: Event, handler: Handler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    /// Register a plain async closure as a handler.
    pub fn on<F, Fut>(&self, event: Event, handler: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(
            event,
            Arc::new(move |payload| Box::pin(handler(payload)) as HandlerFuture),
        );
    }

    /// Number of handlers currently registered for an event.
    pub fn handler_count(&self, event: &Event) -> usize {
        self.handlers.get(event).map(|h| h.len()).unwrap_or(0)
    }

    /// Invoke every handler registered for `event` concurrently and wait
    /// for all of them. Handlers start in registration order but complete
    /// in any order. All failures are collected into a single
    /// [`Error::Dispatch`]; an unknown or handlerless event is a no-op.
    pub async fn dispatch(&self, event: Event, payload: EventPayload) -> Result<()> {
        // Snapshot outside the await so registration never deadlocks
        // against an in-flight dispatch.
        let handlers = self
            .handlers
            .get(&event)
            .map(|list| list.value().clone())
            .unwrap_or_default();

        tracing::debug!(event = %event, handlers = handlers.len(), "Dispatching event");

        if handlers.is_empty() {
            return Ok(());
        }

        let results = join_all(handlers.iter().map(|h| h(payload.clone()))).await;
        let failures: Vec<Error> = results.into_iter().filter_map(|r| r.err()).collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Dispatch { event, failures })
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
