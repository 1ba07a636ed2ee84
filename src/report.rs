// src/report.rs
// =============================================================================
// Prints what a run produced: crawl counters and the graph summary.
//
// Two formats, picked with --json:
// - a human-readable table for the terminal
// - pretty JSON on stdout for scripts (logs go to stderr, so it stays clean)
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::crawl::CrawlStats;
use crate::graph::{GraphSummary, RankedNode};
use crate::vk::UserRecord;

/// Everything the report shows. `seed` and `stats` are absent for `report`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<&'a UserRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a CrawlStats>,
    pub summary: &'a GraphSummary,
}

pub fn print_report(report: &RunReport<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_table(report));
    }
    Ok(())
}

fn render_table(report: &RunReport<'_>) -> String {
    let mut out = String::new();

    if let Some(seed) = report.seed {
        out.push_str(&format!("🌱 Seed: {} ({})\n", seed.name, seed.id));
    }

    if let Some(stats) = report.stats {
        out.push_str("\n📊 Crawl:\n");
        out.push_str(&format!("   👤 Users written: {}\n", stats.users));
        out.push_str(&format!("   👥 Groups written: {}\n", stats.groups));
        out.push_str(&format!("   🔗 Relationships written: {}\n", stats.edges));
        out.push_str(&format!("   🚫 Unavailable: {}\n", stats.unavailable));
        out.push_str(&format!("   ⚠️  Fetch failures: {}\n", stats.fetch_failures));
        out.push_str(&format!("   ⚠️  Write failures: {}\n", stats.write_failures));
    }

    let summary = report.summary;
    out.push_str(&format!("\n{}\n", "-".repeat(80)));
    out.push_str(&format!("Total users: {}\n", summary.total_users));
    out.push_str(&format!("Total groups: {}\n", summary.total_groups));

    out.push_str(&format!("\nTop {} users by followers:\n", summary.top_users.len()));
    out.push_str(&render_ranking(&summary.top_users, "FOLLOWERS"));

    out.push_str(&format!("\nTop {} groups by subscribers:\n", summary.top_groups.len()));
    out.push_str(&render_ranking(&summary.top_groups, "SUBSCRIBERS"));

    out
}

fn render_ranking(nodes: &[RankedNode], count_header: &str) -> String {
    if nodes.is_empty() {
        return "   (none)\n".to_string();
    }

    let mut out = format!("{:<12} {:<50} {:>12}\n", "ID", "NAME", count_header);
    out.push_str(&format!("{}\n", "=".repeat(76)));
    for node in nodes {
        // Truncate long names for display (by chars, names are often Cyrillic)
        let name = if node.name.chars().count() > 47 {
            format!("{}...", node.name.chars().take(47).collect::<String>())
        } else {
            node.name.clone()
        };
        out.push_str(&format!("{:<12} {:<50} {:>12}\n", node.id, name, node.count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> GraphSummary {
        GraphSummary {
            total_users: 3,
            total_groups: 1,
            top_users: vec![RankedNode { id: 1, name: "Ivan Petrov".to_string(), count: 2 }],
            top_groups: vec![],
        }
    }

    #[test]
    fn test_table_contains_totals_and_rankings() {
        let summary = summary();
        let table = render_table(&RunReport { seed: None, stats: None, summary: &summary });

        assert!(table.contains("Total users: 3"));
        assert!(table.contains("Total groups: 1"));
        assert!(table.contains("Ivan Petrov"));
        assert!(table.contains("(none)"));
        assert!(!table.contains("Crawl:"));
    }

    #[test]
    fn test_long_names_are_truncated_on_char_boundary() {
        let nodes = vec![RankedNode { id: 1, name: "Ж".repeat(60), count: 1 }];
        let table = render_ranking(&nodes, "FOLLOWERS");
        assert!(table.contains(&format!("{}...", "Ж".repeat(47))));
    }

    #[test]
    fn test_json_omits_missing_seed_and_stats() {
        let summary = summary();
        let value = serde_json::to_value(RunReport { seed: None, stats: None, summary: &summary }).unwrap();

        assert!(value.get("seed").is_none());
        assert!(value.get("stats").is_none());
        assert_eq!(value["summary"]["total_users"], 3);
        assert_eq!(value["summary"]["top_users"][0]["count"], 2);
    }

    #[test]
    fn test_json_includes_crawl_stats() {
        let summary = summary();
        let stats = CrawlStats { users: 3, edges: 2, ..CrawlStats::default() };
        let value = serde_json::to_value(RunReport { seed: None, stats: Some(&stats), summary: &summary }).unwrap();

        assert_eq!(value["stats"]["users"], 3);
        assert_eq!(value["stats"]["fetch_failures"], 0);
    }
}
