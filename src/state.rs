use crate::config::AppConfig;
use common::TimeRange;
use dashmap::DashSet;
use reportstore::{IndexCache, IndexSource, ReportAggregator};
use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc, Mutex,
};

/// Everything the ingestion loop needs: the core stores it folds records
/// into, plus the counters `RunStats` is assembled from once the run ends.
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<AppConfig>,
	pub index_source: Arc<dyn IndexSource>,
	pub index_cache: Arc<IndexCache>,
	pub aggregator: Arc<ReportAggregator>,
	pub counters: Arc<RunCounters>,
}

impl AppState {
	pub fn new(config: Arc<AppConfig>, index_source: Arc<dyn IndexSource>) -> Self {
		Self {
			config,
			index_source,
			index_cache: Arc::new(IndexCache::new()),
			aggregator: Arc::new(ReportAggregator::new()),
			counters: Arc::new(RunCounters::default()),
		}
	}
}

/// Atomics so a timed-out run can still read a consistent snapshot of
/// progress from the main task while the blocking ingestion task keeps
/// running to completion in the background.
#[derive(Default)]
pub struct RunCounters {
	pub lines_passed: AtomicU64,
	pub lines_processed: AtomicU64,
	pub lines_recommended: AtomicU64,
	pub unparsable_with_timestamp: AtomicU64,
	pub unparsable_without_timestamp: AtomicU64,
	pub unparsable_time_millis: AtomicU64,
	pub time_range: Mutex<TimeRange>,
	recommendation_shapes: DashSet<String>,
}

impl RunCounters {
	pub fn observe_line(&self) {
		self.lines_passed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn observe_processed(&self, ts: Option<chrono::DateTime<chrono::Utc>>) {
		self.lines_processed.fetch_add(1, Ordering::Relaxed);
		if let Some(ts) = ts {
			self.time_range.lock().unwrap().observe(ts);
		}
	}

	/// Lines no handler could make sense of, and the timing-fallback handler's
	/// "unparseable but still timed" records: `millis` feeds the unparsed-time
	/// tally (spec §4.3) instead of `lines_processed`, since no query shape
	/// was recovered for either.
	pub fn observe_unparsable(&self, has_timestamp: bool, millis: i64) {
		if has_timestamp {
			self.unparsable_with_timestamp.fetch_add(1, Ordering::Relaxed);
		} else {
			self.unparsable_without_timestamp.fetch_add(1, Ordering::Relaxed);
		}
		if millis > 0 {
			self.unparsable_time_millis.fetch_add(millis as u64, Ordering::Relaxed);
		}
	}

	pub fn observe_recommendation(&self, index_shape: &str) {
		self.lines_recommended.fetch_add(1, Ordering::Relaxed);
		self.recommendation_shapes.insert(index_shape.to_string());
	}

	pub fn unique_recommendations(&self) -> u64 {
		self.recommendation_shapes.len() as u64
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn unparsable_lines_split_by_timestamp_presence() {
		let counters = RunCounters::default();
		counters.observe_unparsable(true, 0);
		counters.observe_unparsable(false, 0);
		assert_eq!(counters.unparsable_with_timestamp.load(Ordering::Relaxed), 1);
		assert_eq!(counters.unparsable_without_timestamp.load(Ordering::Relaxed), 1);
	}

	#[test]
	fn unparsable_millis_accumulate_into_the_unparsed_time_tally() {
		let counters = RunCounters::default();
		counters.observe_unparsable(true, 77);
		counters.observe_unparsable(false, 23);
		assert_eq!(counters.unparsable_time_millis.load(Ordering::Relaxed), 100);
	}
}
