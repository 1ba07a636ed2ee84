// src/crawl/mod.rs
// =============================================================================
// This module handles the social-graph crawl.
//
// Features:
// - Recursive follower expansion starting from a seed user
// - Configurable depth limit (seed is depth 0)
// - Group subscriptions as leaf nodes
// - Polite crawling with a fixed delay between writes
//
// The traverser only knows two traits: vk::Fetcher to read and
// graph::GraphStore to write. main.rs decides which implementations to use.
// =============================================================================

mod traverse;

// Re-export the traverser and its inputs/outputs
pub use traverse::{CrawlReport, CrawlStats, TraverseOptions, Traverser};
