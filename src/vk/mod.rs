// src/vk/mod.rs
// =============================================================================
// This module fetches users, followers, subscriptions and groups from VK.
//
// Submodules:
// - client: the reqwest-based VkClient
// - types: raw VK JSON shapes and the normalized records
//
// The Fetcher trait is what the traverser talks to. VkClient is the real
// implementation; tests plug in a scripted one.
// =============================================================================

mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::VkClient;
pub use types::{GroupRecord, UserRecord};

/// Maps a remote identifier to a normalized record, one call per entity.
///
/// `Ok(None)` means VK answered but the entity is missing, deactivated or
/// closed. `Err` means the request itself or the response shape failed.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Looks up a user by numeric id or screen name
    async fn user(&self, id: &str) -> Result<Option<UserRecord>>;

    /// First page of follower ids of a user
    async fn followers(&self, user_id: i64) -> Result<Vec<i64>>;

    /// First page of community ids the user is subscribed to
    async fn subscriptions(&self, user_id: i64) -> Result<Vec<i64>>;

    async fn group(&self, group_id: i64) -> Result<Option<GroupRecord>>;
}
