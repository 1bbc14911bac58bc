//! Keyed by `(namespace, queryMask)`. Accumulates running occurrence counts
//! and service-time totals per query shape, the way the teacher crate's
//! `StreamStore` accumulates per-label-set stream data behind a
//! `DashMap` — see DESIGN.md for why this crate merges unconditionally
//! once the key matches, rather than the conditional reading of spec.md
//! §4.10 taken literally.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use indexadvisor::{Coverage, PerQueryReport, Recommendation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatedStats {
	pub count: u64,
	pub total_time_millis: i64,
	pub avg_time_millis: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEntry {
	pub namespace: String,
	pub query_mask: String,
	pub last_seen_date: Option<DateTime<Utc>>,
	pub supported: bool,
	pub index_status: Coverage,
	pub recommendation: Option<Recommendation>,
	pub stats: AggregatedStats,
}

#[derive(Default)]
pub struct ReportAggregator {
	entries: DashMap<(String, String), AggregatedEntry>,
}

impl ReportAggregator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Folds one per-occurrence report into the running aggregate for its
	/// `(namespace, queryMask)`. Reports with no mask (the timing-fallback
	/// handler's unparseable-but-timed lines) carry no shape identity and
	/// are not aggregated — the driver tallies them separately as
	/// unparsable lines.
	pub fn add(&self, report: &PerQueryReport) {
		let Some(mask) = report.query_mask.clone() else {
			return;
		};
		let key = (report.namespace.clone(), mask.clone());
		let millis = report.parsed.stats.millis;
		let ts = report.parsed.ts;

		self.entries
			.entry(key)
			.and_modify(|entry| {
				entry.stats.count += 1;
				entry.stats.total_time_millis += millis;
				entry.stats.avg_time_millis = entry.stats.total_time_millis / entry.stats.count as i64;
				if let Some(ts) = ts {
					if entry.last_seen_date.map(|cur| ts > cur).unwrap_or(true) {
						entry.last_seen_date = Some(ts);
					}
				}
				// A first occurrence observed before the index cache was
				// warm carries no usable analysis; heal it once a later
				// occurrence does.
				if entry.index_status == Coverage::Unknown {
					entry.index_status = report.index_status;
					entry.recommendation = report.recommendation.clone();
					entry.supported = report.query_analysis.supported;
				}
			})
			.or_insert_with(|| AggregatedEntry {
				namespace: report.namespace.clone(),
				query_mask: mask,
				last_seen_date: ts,
				supported: report.query_analysis.supported,
				index_status: report.index_status,
				recommendation: report.recommendation.clone(),
				stats: AggregatedStats {
					count: 1,
					total_time_millis: millis,
					avg_time_millis: millis,
				},
			});
	}

	/// Entries sorted by total service time, descending.
	pub fn get_reports(&self) -> Vec<AggregatedEntry> {
		let mut entries: Vec<AggregatedEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
		entries.sort_by(|a, b| b.stats.total_time_millis.cmp(&a.stats.total_time_millis));
		entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use indexadvisor::{analyzer::QueryAnalysis, index_analyzer::IndexAnalysis};
	use pretty_assertions::assert_eq;
	use queryscrub::{NormalizedRecord, Stats};

	fn report(ns: &str, mask: &str, millis: i64, ts: Option<DateTime<Utc>>) -> PerQueryReport {
		PerQueryReport {
			query_mask: Some(mask.to_string()),
			namespace: ns.to_string(),
			parsed: NormalizedRecord {
				ns: ns.to_string(),
				query: queryscrub::Value::empty_doc(),
				orderby: None,
				command: None,
				query_mask: Some(mask.to_string()),
				stats: Stats {
					millis,
					extra: Default::default(),
				},
				supported: true,
				ts,
			},
			query_analysis: QueryAnalysis {
				analyzed_fields: vec![],
				field_count: 0,
				supported: true,
				query_mask: Some(mask.to_string()),
			},
			index_analysis: IndexAnalysis {
				index_status: Coverage::None,
				full_indexes: vec![],
				partial_indexes: vec![],
			},
			recommendation: None,
			index_status: Coverage::None,
		}
	}

	#[test]
	fn first_occurrence_creates_an_entry() {
		let agg = ReportAggregator::new();
		agg.add(&report("mydb.mycoll", "mask1", 150, None));
		let reports = agg.get_reports();
		assert_eq!(reports.len(), 1);
		assert_eq!(reports[0].stats.count, 1);
		assert_eq!(reports[0].stats.total_time_millis, 150);
		assert_eq!(reports[0].stats.avg_time_millis, 150);
	}

	#[test]
	fn two_occurrences_merge_count_and_average_with_integer_division() {
		let agg = ReportAggregator::new();
		agg.add(&report("mydb.mycoll", "mask1", 150, None));
		agg.add(&report("mydb.mycoll", "mask1", 50, None));
		let reports = agg.get_reports();
		assert_eq!(reports.len(), 1);
		assert_eq!(reports[0].stats.count, 2);
		assert_eq!(reports[0].stats.total_time_millis, 200);
		assert_eq!(reports[0].stats.avg_time_millis, 100);
	}

	#[test]
	fn last_seen_date_advances_monotonically() {
		let agg = ReportAggregator::new();
		let t1 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		let t2 = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		agg.add(&report("mydb.mycoll", "mask1", 10, Some(t2)));
		agg.add(&report("mydb.mycoll", "mask1", 10, Some(t1)));
		assert_eq!(agg.get_reports()[0].last_seen_date, Some(t2));
	}

	#[test]
	fn distinct_masks_stay_separate_entries() {
		let agg = ReportAggregator::new();
		agg.add(&report("mydb.mycoll", "mask1", 10, None));
		agg.add(&report("mydb.mycoll", "mask2", 500, None));
		let reports = agg.get_reports();
		assert_eq!(reports.len(), 2);
		assert_eq!(reports[0].query_mask, "mask2");
		assert_eq!(reports[1].query_mask, "mask1");
	}

	#[test]
	fn reports_with_no_mask_are_not_aggregated() {
		let agg = ReportAggregator::new();
		let mut r = report("?", "unused", 77, None);
		r.query_mask = None;
		agg.add(&r);
		assert!(agg.is_empty());
	}
}
