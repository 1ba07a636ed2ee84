// src/graph/memory.rs
// =============================================================================
// In-memory GraphStore with the same MERGE semantics as the Neo4j one.
//
// Used by `crawl --dry-run` (see what a crawl would write without a database)
// and as the store in traversal tests.
// =============================================================================

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Edge, GraphStore, GraphSummary, RankedNode, Relation};
use crate::error::Result;
use crate::vk::{GroupRecord, UserRecord};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<i64, UserRecord>,
    groups: HashMap<i64, GroupRecord>,
    edges: HashSet<Edge>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn user(&self, id: i64) -> Option<UserRecord> {
        self.inner.lock().await.users.get(&id).cloned()
    }

    #[cfg(test)]
    pub async fn has_edge(&self, edge: Edge) -> bool {
        self.inner.lock().await.edges.contains(&edge)
    }

    #[cfg(test)]
    pub async fn edge_count(&self) -> usize {
        self.inner.lock().await.edges.len()
    }
}

impl Inner {
    fn has_endpoints(&self, edge: &Edge) -> bool {
        let from = self.users.contains_key(&edge.from);
        let to = match edge.relation {
            Relation::Follow => self.users.contains_key(&edge.to),
            Relation::Subscribe => self.groups.contains_key(&edge.to),
        };
        from && to
    }

    // Counts incoming edges of one relation type and ranks the targets
    fn ranked(&self, relation: Relation, top: usize) -> Vec<RankedNode> {
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for edge in self.edges.iter().filter(|e| e.relation == relation) {
            *counts.entry(edge.to).or_default() += 1;
        }

        let mut ranked: Vec<RankedNode> = counts
            .into_iter()
            .map(|(id, count)| RankedNode {
                id,
                name: self.name_of(relation, id),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));
        ranked.truncate(top);
        ranked
    }

    fn name_of(&self, relation: Relation, id: i64) -> String {
        let name = match relation {
            Relation::Follow => self.users.get(&id).map(|u| u.name.clone()),
            Relation::Subscribe => self.groups.get(&id).map(|g| g.name.clone()),
        };
        name.unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.inner.lock().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn upsert_group(&self, group: &GroupRecord) -> Result<()> {
        self.inner.lock().await.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        // MATCH on both ends first, like the Cypher version
        if !inner.has_endpoints(edge) {
            return Ok(false);
        }
        inner.edges.insert(*edge);
        Ok(true)
    }

    async fn summary(&self, top: usize) -> Result<GraphSummary> {
        let inner = self.inner.lock().await;
        Ok(GraphSummary {
            total_users: inner.users.len() as i64,
            total_groups: inner.groups.len() as i64,
            top_users: inner.ranked(Relation::Follow, top),
            top_groups: inner.ranked(Relation::Subscribe, top),
        })
    }
}
