// SPDX-License-Identifier: MIT

//! Local cache of fetched user entities.
//!
//! Keyed by numeric user id, safe under concurrent upserts from racing
//! endpoint responses. The cache is the sole mutator of its entries;
//! an update replaces the stored snapshot wholesale rather than merging
//! field-by-field, so a later write can never resurrect stale fields.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::User;

/// A cached entity and the time it was last written.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub user: User,
    /// Strictly increases across writes to the same id.
    pub last_updated: DateTime<Utc>,
}

/// Outcome of a best-effort batch upsert: every element is attempted,
/// and the caller sees the failures alongside the successes.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Entities inserted or replaced, in input order.
    pub users: Vec<User>,
    /// Input index and error for each element that failed.
    pub failures: Vec<(usize, Error)>,
}

impl BatchOutcome {
    /// Whether every element was applied.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Keyed store of user entities with staleness tracking.
#[derive(Clone)]
pub struct UserCache {
    entries: Arc<DashMap<u64, CacheEntry>>,
    ready: Arc<AtomicBool>,
}

impl UserCache {
    /// Create a cache gated on the runtime's ready flag.
    pub(crate) fn new(ready: Arc<AtomicBool>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ready,
        }
    }

    /// Look up a locally cached entity. Never blocks on the network and
    /// never fetches remotely.
    pub fn get(&self, id: u64) -> Option<User> {
        self.entries.get(&id).map(|entry| entry.user.clone())
    }

    /// Insert or replace the entity decoded from `raw`.
    ///
    /// Fails with [`Error::NotReady`] until the runtime has established
    /// its identity, and with [`Error::MalformedEntity`] if the payload
    /// does not decode. An existing entry has its snapshot replaced
    /// wholesale and its `last_updated` bumped.
    pub fn upsert(&self, raw: Value) -> Result<User> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(Error::NotReady(
                "the user cache cannot be modified before the client has connected",
            ));
        }

        let user = User::from_value(raw)?;
        let id = user.id;
        let now = Utc::now();

        match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                // Keep last_updated strictly increasing even if the
                // clock has not advanced between two writes.
                let previous = occupied.get().last_updated;
                let last_updated = if now > previous {
                    now
                } else {
                    previous + Duration::nanoseconds(1)
                };
                occupied.insert(CacheEntry {
                    user: user.clone(),
                    last_updated,
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    user: user.clone(),
                    last_updated: now,
                });
            }
        }

        Ok(user)
    }

    /// Apply [`upsert`](Self::upsert) to each payload, attempting every
    /// element regardless of earlier failures.
    pub fn upsert_many(&self, raws: Vec<Value>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, raw) in raws.into_iter().enumerate() {
            match self.upsert(raw) {
                Ok(user) => outcome.users.push(user),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping entity in batch upsert");
                    outcome.failures.push((index, e));
                }
            }
        }
        outcome
    }

    /// Independent copy of the cache contents; mutating it never affects
    /// the cache.
    pub fn snapshot(&self) -> HashMap<u64, CacheEntry> {
        self.entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
