// src/crawl/traverse.rs
// =============================================================================
// This module implements the crawl with a depth-first, recursive approach.
//
// How it works:
// 1. Fetch the seed user and write it to the graph (depth 0)
// 2. Fetch one page of the user's followers
// 3. For each follower: write it, write FOLLOW (follower -> user), recurse
// 4. Stop expanding followers once depth > max_depth
// 5. Fetch the seed's group subscriptions, write each group and SUBSCRIBE
//    (groups are leaves, nothing is fetched below them)
//
// Nothing here aborts the crawl: a failed request or write is logged,
// counted in CrawlStats, and the loop moves on to the next id.
//
// There is no visited set. A user reachable through two branches is fetched
// and written twice; MERGE makes the second write a no-op update.
//
// Politeness:
// - A fixed pause after each written entity keeps us under VK's request rate
// =============================================================================

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use crate::graph::{Edge, GraphStore};
use crate::vk::{Fetcher, GroupRecord, UserRecord};

/// Knobs for one crawl
#[derive(Debug, Clone)]
pub struct TraverseOptions {
    /// Followers of a user at depth d are expanded while d <= max_depth
    pub max_depth: u32,
    /// Crawl subscriptions of every follower, not only the seed's
    pub follower_subscriptions: bool,
    /// Pause after each written entity
    pub delay: Duration,
}

/// Counters collected during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub users: usize,
    pub groups: usize,
    pub edges: usize,
    /// Entities VK reported as missing, deleted, banned or closed
    pub unavailable: usize,
    pub fetch_failures: usize,
    pub write_failures: usize,
}

/// What a crawl produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// None when the seed could not be fetched; nothing else was crawled then
    pub seed: Option<UserRecord>,
    pub stats: CrawlStats,
}

pub struct Traverser<'a> {
    fetcher: &'a dyn Fetcher,
    store: &'a dyn GraphStore,
    options: TraverseOptions,
    stats: CrawlStats,
}

impl<'a> Traverser<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, store: &'a dyn GraphStore, options: TraverseOptions) -> Self {
        Self {
            fetcher,
            store,
            options,
            stats: CrawlStats::default(),
        }
    }

    /// Crawls from `seed` (numeric id or screen name) and returns the report
    pub async fn crawl(mut self, seed: &str) -> CrawlReport {
        tracing::info!(seed, max_depth = self.options.max_depth, "starting crawl");

        let Some(seed_user) = self.fetch_user(seed).await else {
            tracing::error!(seed, "could not fetch seed user, nothing to crawl");
            return CrawlReport {
                seed: None,
                stats: self.stats,
            };
        };

        self.write_user(&seed_user).await;
        self.expand_followers(seed_user.id, 0).await;
        self.expand_subscriptions(seed_user.id).await;

        tracing::info!(stats = ?self.stats, "crawl finished");
        CrawlReport {
            seed: Some(seed_user),
            stats: self.stats,
        }
    }

    // Async fns can't call themselves directly (the future would have
    // infinite size), so the recursive step returns a boxed future.
    fn expand_followers(&mut self, user_id: i64, depth: u32) -> BoxFuture<'_, ()> {
        async move {
            if depth > self.options.max_depth {
                return;
            }

            let follower_ids = match self.fetcher.followers(user_id).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::error!(user = user_id, error = %e, "failed to fetch followers");
                    self.stats.fetch_failures += 1;
                    return;
                }
            };
            tracing::info!(user = user_id, depth, count = follower_ids.len(), "expanding followers");

            for follower_id in follower_ids {
                let Some(follower) = self.fetch_user(&follower_id.to_string()).await else {
                    continue;
                };

                if self.write_user(&follower).await {
                    self.write_edge(Edge::follow(follower.id, user_id)).await;
                }
                if self.options.follower_subscriptions {
                    self.expand_subscriptions(follower.id).await;
                }
                self.pause().await;

                self.expand_followers(follower.id, depth + 1).await;
            }
        }
        .boxed()
    }

    async fn expand_subscriptions(&mut self, user_id: i64) {
        let group_ids = match self.fetcher.subscriptions(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(user = user_id, error = %e, "failed to fetch subscriptions");
                self.stats.fetch_failures += 1;
                return;
            }
        };
        tracing::info!(user = user_id, count = group_ids.len(), "expanding subscriptions");

        for group_id in group_ids {
            let Some(group) = self.fetch_group(group_id).await else {
                continue;
            };

            if self.write_group(&group).await {
                self.write_edge(Edge::subscribe(user_id, group.id)).await;
            }
            self.pause().await;
        }
    }

    async fn fetch_user(&mut self, id: &str) -> Option<UserRecord> {
        match self.fetcher.user(id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                self.stats.unavailable += 1;
                None
            }
            Err(e) => {
                tracing::error!(user = id, error = %e, "failed to fetch user");
                self.stats.fetch_failures += 1;
                None
            }
        }
    }

    async fn fetch_group(&mut self, id: i64) -> Option<GroupRecord> {
        match self.fetcher.group(id).await {
            Ok(Some(group)) => Some(group),
            Ok(None) => {
                self.stats.unavailable += 1;
                None
            }
            Err(e) => {
                tracing::error!(group = id, error = %e, "failed to fetch group");
                self.stats.fetch_failures += 1;
                None
            }
        }
    }

    // Returns false when the node could not be written, so callers skip
    // the edge that would point at it.
    async fn write_user(&mut self, user: &UserRecord) -> bool {
        match self.store.upsert_user(user).await {
            Ok(()) => {
                self.stats.users += 1;
                true
            }
            Err(e) => {
                tracing::error!(user = user.id, error = %e, "failed to write user");
                self.stats.write_failures += 1;
                false
            }
        }
    }

    async fn write_group(&mut self, group: &GroupRecord) -> bool {
        match self.store.upsert_group(group).await {
            Ok(()) => {
                self.stats.groups += 1;
                true
            }
            Err(e) => {
                tracing::error!(group = group.id, error = %e, "failed to write group");
                self.stats.write_failures += 1;
                false
            }
        }
    }

    async fn write_edge(&mut self, edge: Edge) {
        match self.store.upsert_edge(&edge).await {
            Ok(true) => self.stats.edges += 1,
            // an endpoint is missing, e.g. the seed itself failed to write
            Ok(false) => tracing::warn!(
                from = edge.from,
                to = edge.to,
                relation = edge.relation.as_str(),
                "relationship endpoint missing, nothing written"
            ),
            Err(e) => {
                tracing::error!(
                    from = edge.from,
                    to = edge.to,
                    relation = edge.relation.as_str(),
                    error = %e,
                    "failed to write relationship"
                );
                self.stats.write_failures += 1;
            }
        }
    }

    async fn pause(&self) {
        if !self.options.delay.is_zero() {
            tokio::time::sleep(self.options.delay).await;
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why BoxFuture for expand_followers?
//    - An async fn compiles to a state machine that contains the futures it
//      awaits. If it awaits itself, the type would contain itself forever.
//    - Boxing puts the inner future on the heap, which gives it a fixed size.
//    - .boxed() comes from futures::FutureExt and also requires Send.
//
// 2. Why &mut self in every helper?
//    - Stats are counted as we go. Because the crawl is strictly sequential
//      (no parallel fetching), a plain &mut borrow is enough; no Mutex.
//
// 3. Depth semantics:
//    - The seed is depth 0. Its followers are fetched at depth 0 and written
//      as depth-1 users. With max_depth = 2, users up to depth 3 end up in
//      the graph, and the followers of depth-3 users are never requested.
// -----------------------------------------------------------------------------
