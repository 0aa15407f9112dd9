//! Plain-text rendering of ranked results and progress events

use super::types::{ProgressStatus, SearchProgress, SearchResult};
use std::fmt::Write;

/// Message returned when there is nothing to show
pub const NO_RESULTS_MESSAGE: &str = "No results found across any data sources.";

/// Render a ranked result list as a summary grouped by source.
///
/// Only the first `limit` results are rendered. The header counts every
/// result passed in, but only the sources present in the rendered part.
pub fn format_results(results: &[SearchResult], limit: usize) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let shown = &results[..limit.min(results.len())];
    let groups = group_by_source(shown);

    let mut out = String::new();
    let _ = write!(
        out,
        "Found {} results across {} sources:\n\n",
        results.len(),
        groups.len()
    );

    for (source, items) in &groups {
        let _ = writeln!(out, "**{}** ({} results):", source, items.len());
        for item in items {
            let _ = writeln!(out, "- **{}**", item.title);
            let _ = writeln!(out, "  {}", item.content);
            if let Some(ref url) = item.url {
                let _ = writeln!(out, "  {}", url);
            }
            out.push('\n');
        }
    }

    out
}

/// Group results by source, sources in order of first appearance
pub fn group_by_source(results: &[SearchResult]) -> Vec<(&str, Vec<&SearchResult>)> {
    let mut groups: Vec<(&str, Vec<&SearchResult>)> = Vec::new();

    for result in results {
        match groups.iter().position(|(source, _)| *source == result.source) {
            Some(idx) => groups[idx].1.push(result),
            None => groups.push((result.source.as_str(), vec![result])),
        }
    }

    groups
}

/// One status line for a progress event, e.g. `✅ Slack: completed (3 results)`
pub fn format_progress(progress: &SearchProgress) -> String {
    let marker = match progress.status {
        ProgressStatus::Completed => '✅',
        ProgressStatus::Error => '❌',
        ProgressStatus::Searching => '⏳',
    };

    let mut line = format!("{} {}: {}", marker, progress.source, progress.status);
    if let Some(count) = progress.result_count {
        let _ = write!(line, " ({} results)", count);
    }
    line
}
