//! The final output shape and the quote-swapping text renderer described in
//! SPEC_FULL.md §6: results serialize to ordinary JSON internally, then the
//! renderer swaps `"` and `'` so the emitted document reads like the
//! original tool's single-quoted, Python-repr-flavored report.

use crate::state::RunCounters;
use chrono::{DateTime, Utc};
use indexadvisor::Coverage;
use reportstore::AggregatedEntry;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
	pub lines_passed: u64,
	pub lines_processed: u64,
	pub lines_recommended: u64,
	pub unique_recommendations: u64,
	pub unparsable_with_timestamp: u64,
	pub unparsable_without_timestamp: u64,
	pub unparsable_time_millis: u64,
	pub time_range_start: Option<DateTime<Utc>>,
	pub time_range_end: Option<DateTime<Utc>>,
	pub dex_wall_time_millis: u128,
	pub timed_out: bool,
}

impl RunStats {
	pub fn snapshot(counters: &RunCounters, dex_wall_time_millis: u128, timed_out: bool) -> Self {
		use std::sync::atomic::Ordering;
		let time_range = *counters.time_range.lock().unwrap();
		Self {
			lines_passed: counters.lines_passed.load(Ordering::Relaxed),
			lines_processed: counters.lines_processed.load(Ordering::Relaxed),
			lines_recommended: counters.lines_recommended.load(Ordering::Relaxed),
			unique_recommendations: counters.unique_recommendations(),
			unparsable_with_timestamp: counters.unparsable_with_timestamp.load(Ordering::Relaxed),
			unparsable_without_timestamp: counters.unparsable_without_timestamp.load(Ordering::Relaxed),
			unparsable_time_millis: counters.unparsable_time_millis.load(Ordering::Relaxed),
			time_range_start: time_range.start,
			time_range_end: time_range.end,
			dex_wall_time_millis,
			timed_out,
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
	pub run_stats: RunStats,
	pub results: Vec<ResultEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
	pub namespace: String,
	pub query_mask: String,
	pub last_seen_date: Option<DateTime<Utc>>,
	pub supported: bool,
	pub index_status: &'static str,
	pub recommendation: Option<RecommendationView>,
	pub stats: StatsView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
	pub index: String,
	pub shell_command: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
	pub count: u64,
	pub total_time_millis: i64,
	pub avg_time_millis: i64,
}

impl From<&AggregatedEntry> for ResultEntry {
	fn from(e: &AggregatedEntry) -> Self {
		ResultEntry {
			namespace: e.namespace.clone(),
			query_mask: e.query_mask.clone(),
			last_seen_date: e.last_seen_date,
			supported: e.supported,
			index_status: coverage_str(e.index_status),
			recommendation: e.recommendation.as_ref().map(|r| RecommendationView {
				index: r.index.clone(),
				shell_command: r.shell_command.clone(),
			}),
			stats: StatsView {
				count: e.stats.count,
				total_time_millis: e.stats.total_time_millis,
				avg_time_millis: e.stats.avg_time_millis,
			},
		}
	}
}

fn coverage_str(c: Coverage) -> &'static str {
	match c {
		Coverage::Unknown => "unknown",
		Coverage::None => "none",
		Coverage::Partial => "partial",
		Coverage::Full => "full",
	}
}

/// Swaps `"` and `'` throughout, then restores any backslash-escaped single
/// quote (originally an escaped double quote inside a string literal, now
/// escaped the wrong way round after the swap) to a bare `"`.
pub fn render_with_quote_swap(json: &str) -> String {
	let swapped: String = json
		.chars()
		.map(|c| match c {
			'"' => '\'',
			'\'' => '"',
			other => other,
		})
		.collect();
	swapped.replace("\\'", "\"")
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn quote_swap_flips_delimiters() {
		let json = r#"{"a": "b", "c": 1}"#;
		assert_eq!(render_with_quote_swap(json), "{'a': 'b', 'c': 1}");
	}

	#[test]
	fn quote_swap_restores_embedded_double_quotes() {
		let json = r#"{"a": "it's \"quoted\""}"#;
		assert_eq!(render_with_quote_swap(json), r#"{'a': 'it"s "quoted"'}"#);
	}
}
