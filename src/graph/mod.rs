// src/graph/mod.rs
// =============================================================================
// This module writes users, groups and their relationships into a graph.
//
// Submodules:
// - neo4j: the real store, Cypher over Bolt via neo4rs
// - memory: an in-process store used by --dry-run and by tests
//
// Every write is an upsert (Cypher MERGE): writing the same user twice
// updates the node instead of duplicating it. That is what lets the crawler
// revisit users reachable through several branches without tracking them.
// =============================================================================

mod memory;
mod neo4j;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::vk::{GroupRecord, UserRecord};

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// The fixed set of relationship types we create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    /// follower -> followed user
    Follow,
    /// user -> group
    Subscribe,
}

impl Relation {
    /// The Cypher relationship type
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Follow => "FOLLOW",
            Relation::Subscribe => "SUBSCRIBE",
        }
    }

    /// Node labels of the (from, to) endpoints
    pub fn endpoint_labels(self) -> (&'static str, &'static str) {
        match self {
            Relation::Follow => ("User", "User"),
            Relation::Subscribe => ("User", "Group"),
        }
    }
}

/// A directed relationship between two node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: i64,
    pub to: i64,
    pub relation: Relation,
}

impl Edge {
    pub fn follow(follower: i64, followed: i64) -> Self {
        Self {
            from: follower,
            to: followed,
            relation: Relation::Follow,
        }
    }

    pub fn subscribe(user: i64, group: i64) -> Self {
        Self {
            from: user,
            to: group,
            relation: Relation::Subscribe,
        }
    }
}

/// A node with how many incoming relationships it has
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedNode {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

/// What the end-of-run report shows about the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub total_users: i64,
    pub total_groups: i64,
    /// Users with the most followers
    pub top_users: Vec<RankedNode>,
    /// Groups with the most subscribers
    pub top_groups: Vec<RankedNode>,
}

/// Idempotent writes of nodes and edges, plus the summary queries
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_user(&self, user: &UserRecord) -> Result<()>;

    async fn upsert_group(&self, group: &GroupRecord) -> Result<()>;

    /// Creates the edge if both endpoints exist. Missing endpoints are a
    /// no-op and return `Ok(false)`.
    async fn upsert_edge(&self, edge: &Edge) -> Result<bool>;

    /// Totals plus the `top` most followed users and most subscribed groups.
    /// Ties are broken by ascending id.
    async fn summary(&self, top: usize) -> Result<GraphSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_constructors() {
        let follow = Edge::follow(2, 1);
        assert_eq!((follow.from, follow.to), (2, 1));
        assert_eq!(follow.relation.as_str(), "FOLLOW");
        assert_eq!(follow.relation.endpoint_labels(), ("User", "User"));

        let subscribe = Edge::subscribe(1, 100);
        assert_eq!(subscribe.relation.as_str(), "SUBSCRIBE");
        assert_eq!(subscribe.relation.endpoint_labels(), ("User", "Group"));
    }
}
