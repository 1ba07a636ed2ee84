// src/vk/client.rs
// =============================================================================
// The VK API client: one GET per entity, JSON in, normalized record out.
//
// Every call goes to <base>/method/<name> with the access token and API
// version attached. The response is unwrapped from VK's envelope:
//   {"response": ...}                      -> Ok
//   {"error": {"error_code", "error_msg"}} -> CrawlError::Api
//   anything else                          -> CrawlError::Shape
//
// Only the first page of each list is requested (count = page size).
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::types::{Envelope, GroupsById, IdPage, RawUser, Subscriptions, Unavailable};
use super::{Fetcher, GroupRecord, UserRecord};
use crate::config::ApiSettings;
use crate::error::{CrawlError, Result};

const USER_FIELDS: &str = "screen_name,sex,city,followers_count";

pub struct VkClient {
    http: Client,
    settings: ApiSettings,
}

impl VkClient {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        // One client for the whole crawl so connections get reused
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("vk-graph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, settings })
    }

    // Calls a VK method and unwraps the envelope.
    // `params` are the method-specific query parameters.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.settings.base_url.join(&format!("method/{}", method))?;

        tracing::debug!(method, ?params, "calling VK API");

        let response = self
            .http
            .get(url)
            .query(&[
                ("access_token", self.settings.token.as_str()),
                ("v", self.settings.version.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|source| CrawlError::Transport {
                method: method.to_string(),
                // the URL carries access_token in its query string
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                method: method.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CrawlError::Transport {
                method: method.to_string(),
                source: source.without_url(),
            })?;

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| CrawlError::Shape {
                method: method.to_string(),
                detail: e.to_string(),
            })?;

        match (envelope.response, envelope.error) {
            (_, Some(error)) => Err(CrawlError::Api {
                method: method.to_string(),
                code: error.error_code,
                message: error.error_msg,
            }),
            (Some(response), None) => Ok(response),
            (None, None) => Err(CrawlError::Shape {
                method: method.to_string(),
                detail: "neither `response` nor `error` present".to_string(),
            }),
        }
    }

    fn page_size(&self) -> String {
        self.settings.page_size.to_string()
    }
}

#[async_trait]
impl Fetcher for VkClient {
    async fn user(&self, id: &str) -> Result<Option<UserRecord>> {
        let users: Vec<RawUser> = self
            .call(
                "users.get",
                &[("user_ids", id.to_string()), ("fields", USER_FIELDS.to_string())],
            )
            .await?;

        let Some(raw) = users.into_iter().next() else {
            tracing::warn!(user = id, "VK returned no such user");
            return Ok(None);
        };

        match raw.into_record() {
            Ok(record) => {
                tracing::info!(user = record.id, name = %record.name, "fetched user");
                Ok(Some(record))
            }
            Err(Unavailable::Deactivated(reason)) => {
                tracing::warn!(user = id, %reason, "user is deleted or banned");
                Ok(None)
            }
            Err(Unavailable::Closed) => {
                tracing::warn!(user = id, "user profile is closed");
                Ok(None)
            }
        }
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<i64>> {
        let page: IdPage = self
            .call(
                "users.getFollowers",
                &[("user_id", user_id.to_string()), ("count", self.page_size())],
            )
            .await?;

        tracing::debug!(user = user_id, count = page.items.len(), "fetched followers");
        Ok(page.items)
    }

    async fn subscriptions(&self, user_id: i64) -> Result<Vec<i64>> {
        let subscriptions: Subscriptions = self
            .call(
                "users.getSubscriptions",
                &[("user_id", user_id.to_string()), ("count", self.page_size())],
            )
            .await?;

        tracing::debug!(
            user = user_id,
            count = subscriptions.groups.items.len(),
            "fetched subscriptions"
        );
        Ok(subscriptions.groups.items)
    }

    async fn group(&self, group_id: i64) -> Result<Option<GroupRecord>> {
        let groups: GroupsById = self
            .call("groups.getById", &[("group_id", group_id.to_string())])
            .await?;

        let Some(raw) = groups.into_first() else {
            tracing::warn!(group = group_id, "VK returned no such group");
            return Ok(None);
        };

        match raw.into_record() {
            Ok(record) => Ok(Some(record)),
            Err(Unavailable::Deactivated(reason)) => {
                tracing::warn!(group = group_id, %reason, "group is deleted or banned");
                Ok(None)
            }
            Err(Unavailable::Closed) => {
                tracing::warn!(group = group_id, "group is closed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    fn client_for(server: &MockServer) -> VkClient {
        VkClient::new(ApiSettings {
            base_url: Url::parse(&server.url("/")).unwrap(),
            token: "secret".to_string(),
            version: "5.131".to_string(),
            page_size: 200,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_is_fetched_and_normalized() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/method/users.get")
                    .query_param("user_ids", "42")
                    .query_param("access_token", "secret")
                    .query_param("v", "5.131");
                then.status(200).json_body(json!({
                    "response": [{
                        "id": 42,
                        "first_name": "Ivan",
                        "last_name": "Petrov",
                        "screen_name": "ipetrov",
                        "sex": 2,
                        "city": {"id": 1, "title": "Moscow"}
                    }]
                }));
            })
            .await;

        let user = client_for(&server).user("42").await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(user.id, 42);
        assert_eq!(user.name, "Ivan Petrov");
        assert_eq!(user.city.as_deref(), Some("Moscow"));
    }

    #[tokio::test]
    async fn test_closed_user_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/users.get");
                then.status(200).json_body(json!({
                    "response": [{"id": 5, "first_name": "A", "last_name": "B", "is_closed": true}]
                }));
            })
            .await;

        assert_eq!(client_for(&server).user("5").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_user_array_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/users.get");
                then.status(200).json_body(json!({"response": []}));
            })
            .await;

        assert_eq!(client_for(&server).user("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/users.getFollowers");
                then.status(200).json_body(json!({
                    "error": {"error_code": 30, "error_msg": "This profile is private"}
                }));
            })
            .await;

        let err = client_for(&server).followers(1).await.unwrap_err();
        assert!(matches!(err, CrawlError::Api { code: 30, .. }));
    }

    #[tokio::test]
    async fn test_followers_page() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/method/users.getFollowers")
                    .query_param("user_id", "1")
                    .query_param("count", "200");
                then.status(200)
                    .json_body(json!({"response": {"count": 3, "items": [10, 11, 12]}}));
            })
            .await;

        let ids = client_for(&server).followers(1).await.unwrap();

        mock.assert_async().await;
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_subscriptions_take_groups_only() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/users.getSubscriptions");
                then.status(200).json_body(json!({
                    "response": {
                        "users": {"count": 1, "items": [99]},
                        "groups": {"count": 2, "items": [1, 2]}
                    }
                }));
            })
            .await;

        assert_eq!(client_for(&server).subscriptions(1).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_group_lookup() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/method/groups.getById")
                    .query_param("group_id", "7");
                then.status(200).json_body(json!({
                    "response": [{"id": 7, "name": "Rustaceans", "screen_name": "rust", "is_closed": 0}]
                }));
            })
            .await;

        let group = client_for(&server).group(7).await.unwrap().unwrap();
        assert_eq!(
            group,
            GroupRecord {
                id: 7,
                name: "Rustaceans".to_string(),
                screen_name: "rust".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getById");
                then.status(502);
            })
            .await;

        let err = client_for(&server).group(1).await.unwrap_err();
        assert!(matches!(err, CrawlError::Status { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // nothing listens on port 1, so the request fails before any response
        let client = VkClient::new(ApiSettings {
            base_url: Url::parse("http://127.0.0.1:1/").unwrap(),
            token: "SUPERSECRET".to_string(),
            version: "5.131".to_string(),
            page_size: 200,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let err = client.followers(1).await.unwrap_err();

        assert!(matches!(err, CrawlError::Transport { .. }));
        let logged = format!("{} {:?}", err, err);
        assert!(!logged.contains("SUPERSECRET"), "token leaked: {}", logged);
    }

    #[tokio::test]
    async fn test_wrong_shape() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/users.getFollowers");
                then.status(200).json_body(json!({"response": "not a page"}));
            })
            .await;

        let err = client_for(&server).followers(1).await.unwrap_err();
        assert!(matches!(err, CrawlError::Shape { .. }));
    }
}
