// SPDX-License-Identifier: MIT

//! saturn-client: async client runtime for the Saturn social-platform API.
//!
//! The runtime authenticates with an access/refresh token pair, keeps the
//! pair fresh in the background without interrupting callers, exposes a
//! subscribe/dispatch event model, and maintains a local cache of fetched
//! user entities.
//!
//! ```no_run
//! use saturn_client::{Client, ClientConfig, Event, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new(ClientConfig::new("access", "refresh"))?;
//!
//!     let me = client.clone();
//!     client.on(Event::Ready, move |_| {
//!         let me = me.clone();
//!         async move {
//!             if let Some(user) = me.user().await {
//!                 println!("connected as {}", user.name);
//!             }
//!             Ok(())
//!         }
//!     });
//!
//!     client.start().await?;
//!     // ... application runs ...
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod refresh;
pub mod transport;

pub use cache::{BatchOutcome, CacheEntry, UserCache};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::{Event, EventBus, EventPayload};
pub use models::{ClientUser, Media, Permissions, User};
pub use refresh::RefreshState;
pub use transport::Transport;
