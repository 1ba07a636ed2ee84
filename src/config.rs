// src/config.rs
// =============================================================================
// Turns raw CLI arguments into validated settings.
//
// clap already merged flags with environment variables and defaults; this
// layer checks the values make sense (token present, page size in range,
// URL parses) so the fetcher and graph store can trust what they receive.
// =============================================================================

use std::time::Duration;

use url::Url;

use crate::cli::{ApiArgs, CrawlArgs, GraphArgs};
use crate::crawl::TraverseOptions;
use crate::error::{CrawlError, Result};

/// VK accepts at most 1000 ids per users.getFollowers page.
const MAX_PAGE_SIZE: u32 = 1000;

/// Everything needed to talk to the VK API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub token: String,
    pub version: String,
    pub page_size: u32,
    pub timeout: Duration,
}

/// Everything needed to open a Neo4j connection pool
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl ApiSettings {
    pub fn from_args(args: &ApiArgs, page_size: u32) -> Result<Self> {
        let token = args
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CrawlError::Config(
                    "access token not found; set VK_ACCESS_TOKEN or pass --token".to_string(),
                )
            })?
            .to_string();

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CrawlError::Config(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        if args.timeout_secs == 0 {
            return Err(CrawlError::Config(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            base_url: normalize_base_url(&args.api_base)?,
            token,
            version: args.api_version.clone(),
            page_size,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}

impl From<&GraphArgs> for GraphSettings {
    fn from(args: &GraphArgs) -> Self {
        Self {
            uri: args.neo4j_uri.clone(),
            user: args.neo4j_user.clone(),
            password: args.neo4j_password.clone(),
            database: args.neo4j_db.clone().filter(|db| !db.is_empty()),
        }
    }
}

impl From<&CrawlArgs> for TraverseOptions {
    fn from(args: &CrawlArgs) -> Self {
        Self {
            max_depth: args.max_depth,
            follower_subscriptions: args.follower_subscriptions,
            delay: Duration::from_millis(args.delay_ms),
        }
    }
}

// Url::join drops the last path segment unless the base ends with '/',
// so "http://host/api" has to become "http://host/api/".
fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_args(token: Option<&str>, base: &str) -> ApiArgs {
        ApiArgs {
            token: token.map(str::to_string),
            api_version: "5.131".to_string(),
            api_base: base.to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let err = ApiSettings::from_args(&api_args(None, "https://api.vk.com/"), 200).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        let err = ApiSettings::from_args(&api_args(Some("  "), "https://api.vk.com/"), 200).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn test_page_size_bounds() {
        let args = api_args(Some("t"), "https://api.vk.com/");
        assert!(ApiSettings::from_args(&args, 0).is_err());
        assert!(ApiSettings::from_args(&args, 1001).is_err());
        assert_eq!(ApiSettings::from_args(&args, 1000).unwrap().page_size, 1000);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut args = api_args(Some("t"), "https://api.vk.com/");
        args.timeout_secs = 0;
        let err = ApiSettings::from_args(&args, 200).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        args.timeout_secs = 1;
        assert_eq!(ApiSettings::from_args(&args, 200).unwrap().timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let settings = ApiSettings::from_args(&api_args(Some("t"), "http://127.0.0.1:8080/api"), 200).unwrap();
        assert_eq!(settings.base_url.as_str(), "http://127.0.0.1:8080/api/");
        assert_eq!(
            settings.base_url.join("method/users.get").unwrap().as_str(),
            "http://127.0.0.1:8080/api/method/users.get"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiSettings::from_args(&api_args(Some("t"), "not a url"), 200).unwrap_err();
        assert!(matches!(err, CrawlError::Url(_)));
    }

    #[test]
    fn test_empty_database_means_default() {
        let settings = GraphSettings::from(&GraphArgs {
            neo4j_uri: "bolt://localhost:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "neo4j".to_string(),
            neo4j_db: Some(String::new()),
        });
        assert_eq!(settings.database, None);
    }
}
