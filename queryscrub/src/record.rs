use crate::value::Value;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Service-time and auxiliary counters lifted from the trailing `key:value`
/// tokens on a log line, or from a profile entry's `millis` field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
	pub millis: i64,
	pub extra: IndexMap<String, i64>,
}

/// The extractor's output: one query or command observed once, with its
/// shape fingerprint already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
	pub ns: String,
	pub query: Value,
	pub orderby: Option<Value>,
	pub command: Option<String>,
	pub query_mask: Option<String>,
	pub stats: Stats,
	pub supported: bool,
	pub ts: Option<DateTime<Utc>>,
}

impl NormalizedRecord {
	pub fn unparsed(millis: i64) -> Self {
		Self {
			ns: "?".to_string(),
			query: Value::empty_doc(),
			orderby: None,
			command: None,
			query_mask: None,
			stats: Stats {
				millis,
				extra: IndexMap::new(),
			},
			supported: false,
			ts: None,
		}
	}
}
