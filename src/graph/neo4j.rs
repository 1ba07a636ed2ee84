// src/graph/neo4j.rs
// =============================================================================
// Neo4j-backed GraphStore.
//
// neo4rs keeps a pool of Bolt connections inside `Graph`, so one Neo4jStore
// is shared for the whole crawl. All values go in as query parameters; only
// the relationship type and labels are spliced into the Cypher text, and
// those come from the closed `Relation` enum.
// =============================================================================

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query, Row};

use super::{Edge, GraphStore, GraphSummary, RankedNode, Relation};
use crate::config::GraphSettings;
use crate::error::{CrawlError, Result};
use crate::vk::{GroupRecord, UserRecord};

const UPSERT_USER: &str = "
    MERGE (u:User {id: $id})
    SET u.screen_name = $screen_name,
        u.name = $name,
        u.sex = $sex,
        u.city = $city";

const UPSERT_GROUP: &str = "
    MERGE (g:Group {id: $id})
    SET g.name = $name,
        g.screen_name = $screen_name";

const COUNT_USERS: &str = "MATCH (u:User) RETURN count(u) AS total";
const COUNT_GROUPS: &str = "MATCH (g:Group) RETURN count(g) AS total";

const TOP_USERS: &str = "
    MATCH (u:User)<-[:FOLLOW]-(f:User)
    RETURN u.id AS id, coalesce(u.name, '') AS name, count(f) AS total
    ORDER BY total DESC, id ASC
    LIMIT $limit";

const TOP_GROUPS: &str = "
    MATCH (g:Group)<-[:SUBSCRIBE]-(u:User)
    RETURN g.id AS id, coalesce(g.name, '') AS name, count(u) AS total
    ORDER BY total DESC, id ASC
    LIMIT $limit";

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect(settings: &GraphSettings) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str());
        if let Some(db) = &settings.database {
            builder = builder.db(db.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;
        tracing::info!(uri = %settings.uri, "connected to Neo4j");

        Ok(Self { graph })
    }

    // Runs a single-column count query
    async fn count(&self, cypher: &str) -> Result<i64> {
        let mut rows = self.graph.execute(query(cypher)).await?;
        match rows.next().await? {
            Some(row) => column::<i64>(&row, "total"),
            None => Ok(0),
        }
    }

    async fn ranked(&self, cypher: &str, top: usize) -> Result<Vec<RankedNode>> {
        let limit = i64::try_from(top).unwrap_or(i64::MAX);
        let mut rows = self.graph.execute(query(cypher).param("limit", limit)).await?;

        let mut ranked = Vec::new();
        while let Some(row) = rows.next().await? {
            ranked.push(RankedNode {
                id: column(&row, "id")?,
                name: column(&row, "name")?,
                count: column(&row, "total")?,
            });
        }
        Ok(ranked)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.graph.run(user_query(user)).await?;
        tracing::debug!(user = user.id, "user upserted");
        Ok(())
    }

    async fn upsert_group(&self, group: &GroupRecord) -> Result<()> {
        let q = query(UPSERT_GROUP)
            .param("id", group.id)
            .param("name", group.name.as_str())
            .param("screen_name", group.screen_name.as_str());
        self.graph.run(q).await?;
        tracing::debug!(group = group.id, "group upserted");
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let q = query(&edge_cypher(edge.relation))
            .param("from_id", edge.from)
            .param("to_id", edge.to);
        let mut rows = self.graph.execute(q).await?;
        let matched = match rows.next().await? {
            Some(row) => column::<i64>(&row, "matched")? > 0,
            None => false,
        };
        tracing::debug!(
            from = edge.from,
            to = edge.to,
            relation = edge.relation.as_str(),
            matched,
            "relationship upserted"
        );
        Ok(matched)
    }

    async fn summary(&self, top: usize) -> Result<GraphSummary> {
        Ok(GraphSummary {
            total_users: self.count(COUNT_USERS).await?,
            total_groups: self.count(COUNT_GROUPS).await?,
            top_users: self.ranked(TOP_USERS, top).await?,
            top_groups: self.ranked(TOP_GROUPS, top).await?,
        })
    }
}

fn user_query(user: &UserRecord) -> Query {
    query(UPSERT_USER)
        .param("id", user.id)
        .param("screen_name", user.screen_name.as_str())
        .param("name", user.name.as_str())
        .param("sex", optional(user.sex.map(i64::from)))
        .param("city", optional(user.city.clone()))
}

// Absent values are stored as null so re-crawls clear stale properties
fn optional<T: Into<BoltType>>(value: Option<T>) -> BoltType {
    value.map_or(BoltType::Null(BoltNull), Into::into)
}

// Relationship types can't be query parameters in Cypher, so the type and
// the endpoint labels are formatted in from the enum. count(*) is 0 when
// either MATCH finds nothing.
fn edge_cypher(relation: Relation) -> String {
    let (from_label, to_label) = relation.endpoint_labels();
    format!(
        "MATCH (a:{} {{id: $from_id}})\n\
         MATCH (b:{} {{id: $to_id}})\n\
         MERGE (a)-[:{}]->(b)\n\
         RETURN count(*) AS matched",
        from_label,
        to_label,
        relation.as_str()
    )
}

fn column<T: serde::de::DeserializeOwned>(row: &Row, key: &str) -> Result<T> {
    row.get::<T>(key)
        .map_err(|e| CrawlError::Row(format!("column `{}`: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_edge_cypher() {
        assert_eq!(
            edge_cypher(Relation::Follow),
            "MATCH (a:User {id: $from_id})\nMATCH (b:User {id: $to_id})\nMERGE (a)-[:FOLLOW]->(b)\nRETURN count(*) AS matched"
        );
    }

    #[test]
    fn test_subscribe_edge_targets_group() {
        let cypher = edge_cypher(Relation::Subscribe);
        assert!(cypher.contains("(b:Group {id: $to_id})"));
        assert!(cypher.contains("MERGE (a)-[:SUBSCRIBE]->(b)"));
    }

    #[test]
    fn test_user_query_params() {
        let q = user_query(&UserRecord {
            id: 1,
            name: "Ivan Petrov".to_string(),
            screen_name: "ipetrov".to_string(),
            sex: None,
            city: Some("Moscow".to_string()),
        });
        assert!(q.has_param_key("id"));
        assert!(q.has_param_key("sex"));
        assert!(q.has_param_key("city"));
    }

    #[test]
    fn test_optional_maps_none_to_null() {
        assert!(matches!(optional::<i64>(None), BoltType::Null(_)));
        assert!(matches!(optional(Some(2_i64)), BoltType::Integer(_)));
    }
}
