use chrono::{DateTime, Utc};

pub mod index;
pub mod log;

/// A `database.collection` pair, split lazily from the dotted form that
/// appears in log lines, profile entries, and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
	pub db: String,
	pub collection: String,
}

impl Namespace {
	pub fn parse(ns: &str) -> Option<Self> {
		let (db, collection) = ns.split_once('.')?;
		Some(Self {
			db: db.to_string(),
			collection: collection.to_string(),
		})
	}

	pub fn dotted(&self) -> String {
		format!("{}.{}", self.db, self.collection)
	}
}

/// The first/last-seen window tracked while a run is in progress. Bounds
/// widen monotonically: `observe` never narrows the range.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeRange {
	pub start: Option<DateTime<Utc>>,
	pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
	pub fn observe(&mut self, ts: DateTime<Utc>) {
		self.start = Some(match self.start {
			Some(s) if s <= ts => s,
			_ => ts,
		});
		self.end = Some(match self.end {
			Some(e) if e >= ts => e,
			_ => ts,
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn namespace_parse_splits_on_first_dot() {
		let ns = Namespace::parse("mydb.my.nested.collection").unwrap();
		assert_eq!(ns.db, "mydb");
		assert_eq!(ns.collection, "my.nested.collection");
	}

	#[test]
	fn namespace_parse_rejects_missing_dot() {
		assert!(Namespace::parse("nodothere").is_none());
	}

	#[test]
	fn time_range_widens_monotonically() {
		let mut tr = TimeRange::default();
		let t1 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		let t2 = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		tr.observe(t2);
		tr.observe(t1);
		assert_eq!(tr.start, Some(t1));
		assert_eq!(tr.end, Some(t2));
	}
}
