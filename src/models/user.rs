// SPDX-License-Identifier: MIT

//! User entities.
//!
//! [`User`] is an immutable-on-read view over the raw payload the API
//! returned for a user; [`ClientUser`] is the account owner's view with
//! the private field set layered on top. Derived values (timestamps,
//! nested media, birthday) are recomputed from the current snapshot on
//! every access rather than cached, so they always reflect the latest
//! raw data.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Media, Permissions};

/// Decoded public user fields. Required fields fail the decode when
/// absent; optional fields tolerate both `null` and omission.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    /// Numeric user id
    pub id: u64,
    /// Creation timestamp (RFC 3339, parsed on access)
    pub created_at: String,
    /// Last-update timestamp (RFC 3339, parsed on access)
    pub updated_at: String,
    pub first_name: String,
    pub last_name: String,
    /// Display name
    pub name: String,
    pub grade: i64,
    pub public: bool,
    pub is_ambassador: bool,
    pub hidden: bool,
    pub description: String,
    pub affinity: i64,
    pub school_id: String,
    pub school_title: String,
    pub tags: Vec<String>,
    #[serde(default, rename = "user_cohort")]
    pub cohort: Option<String>,
    #[serde(default, rename = "user_instagram")]
    pub instagram: Option<String>,
    #[serde(default, rename = "user_tiktok")]
    pub tiktok: Option<String>,
    #[serde(default, rename = "user_venmo")]
    pub venmo: Option<String>,
    #[serde(default, rename = "user_vsco")]
    pub vsco: Option<String>,
    #[serde(default, rename = "user_education")]
    pub education: Option<String>,
    #[serde(default, rename = "user_city")]
    pub city: Option<String>,
    #[serde(default, rename = "user_workplace")]
    pub workplace: Option<String>,
    #[serde(default, rename = "user_snapchat")]
    pub snapchat: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Raw media payload; materialized via [`User::profile_picture`]
    #[serde(default)]
    pub profile_picture: Option<Value>,
    /// Shape undocumented upstream, kept opaque
    #[serde(default)]
    pub ambassador_school: Option<Value>,
    /// Shape undocumented upstream, kept opaque
    #[serde(default)]
    pub waitlist_school: Option<Value>,
    /// Raw course payloads; the API has never documented their schema
    #[serde(default)]
    pub courses: Vec<Value>,
}

/// Account-private fields present only on the self profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientProfile {
    pub email: String,
    pub profile_pic_url: String,
    /// ISO date (parsed on access via [`ClientUser::birthday`])
    pub birthday: String,
    pub onboarded: bool,
    pub phone_number: String,
    pub phone_validated: bool,
    pub granted_scopes: Vec<String>,
    pub hashid: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub gender_preference: Option<String>,
    #[serde(default)]
    pub referred_by: Option<Value>,
    #[serde(default)]
    pub ambassador_school_id: Option<Value>,
    #[serde(default)]
    pub schedule_type_response: Option<Value>,
    #[serde(default)]
    pub lite_to_live_completed: Option<Value>,
    #[serde(default)]
    pub gameball_id: Option<Value>,
}

/// Read view over a raw user payload.
#[derive(Debug, Clone)]
pub struct User {
    raw: Arc<Value>,
    record: UserRecord,
}

impl User {
    /// Decode a user from its raw payload. Fails with
    /// [`Error::MalformedEntity`] when a required field is missing.
    pub fn from_value(raw: Value) -> Result<Self> {
        let record = UserRecord::deserialize(&raw)
            .map_err(|e| Error::MalformedEntity(format!("user: {}", e)))?;
        Ok(Self {
            raw: Arc::new(raw),
            record,
        })
    }

    /// Replace the raw snapshot wholesale. No field-by-field merging.
    pub fn update(&mut self, raw: Value) -> Result<()> {
        *self = Self::from_value(raw)?;
        Ok(())
    }

    /// The raw snapshot this view reads from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Creation time, parsed from the current snapshot.
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp("created_at", &self.record.created_at)
    }

    /// Last-update time, parsed from the current snapshot.
    pub fn updated_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp("updated_at", &self.record.updated_at)
    }

    /// Profile picture, materialized from the current snapshot.
    pub fn profile_picture(&self) -> Result<Option<Media>> {
        match &self.record.profile_picture {
            Some(raw) if !raw.is_null() => Media::from_value(raw).map(Some),
            _ => Ok(None),
        }
    }

    /// The user's courses as opaque payloads.
    pub fn courses(&self) -> &[Value] {
        &self.record.courses
    }
}

impl Deref for User {
    type Target = UserRecord;

    fn deref(&self) -> &UserRecord {
        &self.record
    }
}

/// The authenticated account's own user: every [`User`] field plus the
/// private profile. Composition, not inheritance; both halves are
/// decoded from the same raw snapshot.
#[derive(Debug, Clone)]
pub struct ClientUser {
    user: User,
    profile: ClientProfile,
}

impl ClientUser {
    /// Decode the base user fields, then the private extension, from one
    /// raw payload. A payload lacking the private fields (e.g. fetched
    /// through a non-privileged endpoint) fails with
    /// [`Error::MalformedEntity`], the same kind as any other decode
    /// failure.
    pub fn from_value(raw: Value) -> Result<Self> {
        let profile = ClientProfile::deserialize(&raw)
            .map_err(|e| Error::MalformedEntity(format!("client user: {}", e)))?;
        let user = User::from_value(raw)?;
        Ok(Self { user, profile })
    }

    /// Replace the raw snapshot wholesale.
    pub fn update(&mut self, raw: Value) -> Result<()> {
        *self = Self::from_value(raw)?;
        Ok(())
    }

    /// The account-private field set.
    pub fn profile(&self) -> &ClientProfile {
        &self.profile
    }

    /// Birthday, parsed from the current snapshot.
    pub fn birthday(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.profile.birthday, "%Y-%m-%d").map_err(|e| {
            Error::MalformedEntity(format!("birthday '{}': {}", self.profile.birthday, e))
        })
    }

    /// Capability flags derived from the granted scopes.
    pub fn permissions(&self) -> Permissions {
        Permissions::from_scopes(&self.profile.granted_scopes)
    }

    /// The base (public) view of this user.
    pub fn as_user(&self) -> &User {
        &self.user
    }
}

impl Deref for ClientUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::MalformedEntity(format!("{} '{}': {}", field, value, e)))
}
