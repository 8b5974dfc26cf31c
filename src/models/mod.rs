// SPDX-License-Identifier: MIT

//! Typed read views over raw API payloads.

pub mod media;
pub mod permissions;
pub mod user;

pub use media::Media;
pub use permissions::Permissions;
pub use user::{ClientProfile, ClientUser, User, UserRecord};
