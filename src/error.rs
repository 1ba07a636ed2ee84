// src/error.rs
// =============================================================================
// Error types shared by the fetcher, the graph store and the config layer.
//
// main.rs still uses anyhow (it only needs to print and pick an exit code),
// but the modules below it return CrawlError so the traverser can tell a
// network failure from a VK API error or a broken response.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: lets the ? operator convert foreign errors automatically
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("request to VK method {method} failed: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    /// VK answered with a non-2xx HTTP status
    #[error("VK method {method} returned HTTP {status}")]
    Status {
        method: String,
        status: reqwest::StatusCode,
    },

    /// VK answered 200 with an `error` object instead of `response`
    #[error("VK method {method} returned error {code}: {message}")]
    Api {
        method: String,
        code: i64,
        message: String,
    },

    /// The body did not have the shape we expected
    #[error("unexpected response shape from VK method {method}: {detail}")]
    Shape { method: String, detail: String },

    #[error("graph store error: {0}")]
    Graph(#[from] neo4rs::Error),

    /// A graph row was missing a column or had the wrong type
    #[error("unexpected graph row: {0}")]
    Row(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
