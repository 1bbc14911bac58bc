//! Regex-driven extraction of a normalized record from one log line or one
//! structured profile entry.

use crate::parser::parse_document;
use crate::record::{NormalizedRecord, Stats};
use crate::scrub::build_mask;
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

static STANDARD_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^.*\[(?P<connection>[^\]]*)\]\s+(?P<operation>\S+)\s+(?P<ns>\S+\.\S+)\s+query:\s+(?P<query>\{.*\})\s+(?P<stats>(?:\S+\s+)*)(?P<query_time>\d+)ms\s*$",
	)
	.expect("valid regex")
});

static COMMAND_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^.*\[(?P<connection>[^\]]*)\]\s+command\s+(?P<ns>\S+\.\$cmd)\s+command:\s+(?P<query>\{.*\})\s+(?P<stats>(?:\S+\s+)*)(?P<query_time>\d+)ms\s*$",
	)
	.expect("valid regex")
});

static UPDATE_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^.*\[(?P<connection>[^\]]*)\]\s+update\s+(?P<ns>\S+\.\S+)\s+query:\s+(?P<query>\{.*\})\s+update:\s+(?P<update>\{.*\})\s+(?P<stats>(?:\S+\s+)*)(?P<query_time>\d+)ms\s*$",
	)
	.expect("valid regex")
});

static TIMING_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?P<query_time>\d+)ms\s*$").expect("valid regex")
});

const SUPPORTED_COMMANDS: [&str; 3] = ["count", "findAndModify", "geoNear"];

/// Parses the trailing `key:value` stats tokens on a log line. Skips the
/// literal `locks(micros)` marker and any token whose value isn't an
/// integer.
fn parse_stats_tokens(raw: &str) -> IndexMap<String, i64> {
	let mut out = IndexMap::new();
	for token in raw.split_whitespace() {
		if token == "locks(micros)" {
			continue;
		}
		let mut parts = token.splitn(2, ':');
		let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
			continue;
		};
		if let Ok(n) = value.parse::<i64>() {
			out.insert(key.to_string(), n);
		}
	}
	out
}

fn unwrap_query_envelope(doc: IndexMap<String, Value>) -> (Value, Option<Value>) {
	if doc.contains_key("$query") {
		let mut doc = doc;
		let orderby = doc.shift_remove("$orderby");
		let query = doc.shift_remove("$query").unwrap_or_else(Value::empty_doc);
		(query, orderby)
	} else {
		(Value::Doc(doc), None)
	}
}

pub fn handle_standard_query(line: &str) -> Option<NormalizedRecord> {
	let caps = STANDARD_QUERY_RE.captures(line)?;
	let ns = caps.name("ns")?.as_str().to_string();
	let query_time: i64 = caps.name("query_time")?.as_str().parse().ok()?;
	let stats = parse_stats_tokens(caps.name("stats").map(|m| m.as_str()).unwrap_or(""));
	let parsed = parse_document(caps.name("query")?.as_str()).ok()?;
	let (query, orderby) = match parsed {
		Value::Doc(doc) => unwrap_query_envelope(doc),
		other => (other, None),
	};
	let query_mask = Some(build_mask(&query, orderby.as_ref(), None));
	Some(NormalizedRecord {
		ns,
		query,
		orderby,
		command: None,
		query_mask,
		stats: Stats {
			millis: query_time,
			extra: stats,
		},
		supported: true,
		ts: None,
	})
}

/// Shared between the `$cmd` log handler (§4.3) and the profile entry
/// handler's `command` op (§4.4): both hand this a `db` name and an already
/// parsed command document.
fn build_command_record(
	db: &str,
	doc: &IndexMap<String, Value>,
	stats: Stats,
) -> Option<NormalizedRecord> {
	let command_name = doc.keys().next()?.clone();
	if !SUPPORTED_COMMANDS.contains(&command_name.as_str()) {
		return Some(NormalizedRecord {
			ns: format!("{db}.$cmd"),
			query: Value::empty_doc(),
			orderby: None,
			command: Some(command_name),
			query_mask: None,
			stats,
			supported: false,
			ts: None,
		});
	}

	if command_name == "geoNear" {
		let collection = doc.get(&command_name)?.as_str()?.to_string();
		let predicate = doc.get("search").cloned().unwrap_or_else(Value::empty_doc);
		let query_mask = Some(build_mask(&predicate, None, None));
		return Some(NormalizedRecord {
			ns: format!("{db}.{collection}"),
			query: predicate,
			orderby: None,
			command: Some(command_name),
			query_mask,
			stats,
			supported: true,
			ts: None,
		});
	}

	let collection = doc.get(&command_name)?.as_str()?.to_string();
	let predicate = doc.get("query").cloned().unwrap_or_else(Value::empty_doc);
	let orderby = doc.get("sort").cloned();
	let query_mask = Some(build_mask(&predicate, orderby.as_ref(), Some(&command_name)));
	Some(NormalizedRecord {
		ns: format!("{db}.{collection}"),
		query: predicate,
		orderby,
		command: Some(command_name),
		query_mask,
		stats,
		supported: true,
		ts: None,
	})
}

pub fn handle_command_query(line: &str) -> Option<NormalizedRecord> {
	let caps = COMMAND_QUERY_RE.captures(line)?;
	let ns_cmd = caps.name("ns")?.as_str();
	let db = ns_cmd.strip_suffix(".$cmd")?;
	let query_time: i64 = caps.name("query_time")?.as_str().parse().ok()?;
	let stats = parse_stats_tokens(caps.name("stats").map(|m| m.as_str()).unwrap_or(""));
	let parsed = parse_document(caps.name("query")?.as_str()).ok()?;
	let doc = parsed.as_doc()?;
	build_command_record(
		db,
		doc,
		Stats {
			millis: query_time,
			extra: stats,
		},
	)
}

pub fn handle_update_query(line: &str) -> Option<NormalizedRecord> {
	let caps = UPDATE_QUERY_RE.captures(line)?;
	let ns = caps.name("ns")?.as_str().to_string();
	let query_time: i64 = caps.name("query_time")?.as_str().parse().ok()?;
	let stats = parse_stats_tokens(caps.name("stats").map(|m| m.as_str()).unwrap_or(""));
	let query = parse_document(caps.name("query")?.as_str()).ok()?;
	// the update document itself is discarded; only the predicate matters.
	let query_mask = Some(build_mask(&query, None, None));
	Some(NormalizedRecord {
		ns,
		query,
		orderby: None,
		command: None,
		query_mask,
		stats: Stats {
			millis: query_time,
			extra: stats,
		},
		supported: true,
		ts: None,
	})
}

pub fn handle_timing_fallback(line: &str) -> Option<NormalizedRecord> {
	let caps = TIMING_FALLBACK_RE.captures(line)?;
	let millis: i64 = caps.name("query_time")?.as_str().parse().ok()?;
	Some(NormalizedRecord::unparsed(millis))
}

/// Handler order matters: `$cmd` lines syntactically overlap generic
/// queries, so the command handler must run before the standard-query
/// handler.
pub fn log_line_handlers() -> Vec<fn(&str) -> Option<NormalizedRecord>> {
	vec![
		handle_command_query,
		handle_standard_query,
		handle_update_query,
		handle_timing_fallback,
	]
}

pub fn handle_profile_entry(entry: &IndexMap<String, Value>) -> Option<NormalizedRecord> {
	let op = entry.get("op")?.as_str()?;
	let ns = entry.get("ns")?.as_str()?.to_string();
	let millis = entry.get("millis")?.as_int().unwrap_or(0);
	let stats = Stats {
		millis,
		extra: IndexMap::new(),
	};

	match op {
		"insert" => None,
		"query" => {
			let query_val = entry.get("query")?.clone();
			let (query, orderby) = match query_val {
				Value::Doc(doc) => unwrap_query_envelope(doc),
				other => (other, None),
			};
			let query_mask = Some(build_mask(&query, orderby.as_ref(), None));
			Some(NormalizedRecord {
				ns,
				query,
				orderby,
				command: None,
				query_mask,
				stats,
				supported: true,
				ts: None,
			})
		}
		"update" => {
			let query = entry.get("query").cloned().unwrap_or_else(Value::empty_doc);
			let orderby = entry
				.get("updateobj")
				.and_then(Value::as_doc)
				.and_then(|d| d.get("orderby"))
				.cloned();
			let query_mask = Some(build_mask(&query, orderby.as_ref(), None));
			Some(NormalizedRecord {
				ns,
				query,
				orderby,
				command: None,
				query_mask,
				stats,
				supported: true,
				ts: None,
			})
		}
		"command" => {
			let doc = entry.get("command")?.as_doc()?;
			let db = ns.split('.').next()?;
			build_command_record(db, doc, stats)
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn standard_query_unwraps_query_envelope() {
		let line = r#"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { $query: { a: 1 }, $orderby: { a: 1 } } ntoreturn:0 nscanned:1 123ms"#;
		let rec = handle_standard_query(line).unwrap();
		assert_eq!(rec.ns, "mydb.mycoll");
		assert_eq!(rec.stats.millis, 123);
		assert!(rec.orderby.is_some());
		assert_eq!(rec.stats.extra["nscanned"], 1);
	}

	#[test]
	fn command_query_extracts_count() {
		let line = r#"Thu Jan  1 00:00:00 [conn1] command mydb.$cmd command: { count: "mycoll", query: { a: 1 } } keyUpdates:0 140ms"#;
		let rec = handle_command_query(line).unwrap();
		assert_eq!(rec.ns, "mydb.mycoll");
		assert_eq!(rec.command.as_deref(), Some("count"));
		assert!(rec.supported);
	}

	#[test]
	fn command_query_rejects_unsupported_command() {
		let line = r#"Thu Jan  1 00:00:00 [conn1] command mydb.$cmd command: { aggregate: "mycoll" } 10ms"#;
		let rec = handle_command_query(line).unwrap();
		assert_eq!(rec.ns, "mydb.$cmd");
		assert!(!rec.supported);
	}

	#[test]
	fn update_query_discards_update_document() {
		let line = r#"Thu Jan  1 00:00:00 [conn1] update mydb.mycoll query: { a: 1 } update: { $set: { b: 2 } } 5ms"#;
		let rec = handle_update_query(line).unwrap();
		assert_eq!(rec.ns, "mydb.mycoll");
		assert_eq!(rec.stats.millis, 5);
	}

	#[test]
	fn timing_fallback_matches_unparseable_slow_line() {
		let line = "some garbage that still ends in 77ms";
		let rec = handle_timing_fallback(line).unwrap();
		assert_eq!(rec.ns, "?");
		assert_eq!(rec.stats.millis, 77);
		assert!(!rec.supported);
		assert!(rec.query_mask.is_none());
	}

	#[test]
	fn profile_insert_is_ignored() {
		let mut entry = IndexMap::new();
		entry.insert("op".to_string(), Value::Str("insert".to_string()));
		entry.insert("ns".to_string(), Value::Str("mydb.mycoll".to_string()));
		entry.insert("millis".to_string(), Value::Int(1));
		assert!(handle_profile_entry(&entry).is_none());
	}

	#[test]
	fn profile_query_extracts_predicate() {
		let mut query = IndexMap::new();
		query.insert("a".to_string(), Value::Int(1));
		let mut entry = IndexMap::new();
		entry.insert("op".to_string(), Value::Str("query".to_string()));
		entry.insert("ns".to_string(), Value::Str("mydb.mycoll".to_string()));
		entry.insert("millis".to_string(), Value::Int(42));
		entry.insert("query".to_string(), Value::Doc(query));
		let rec = handle_profile_entry(&entry).unwrap();
		assert_eq!(rec.ns, "mydb.mycoll");
		assert_eq!(rec.stats.millis, 42);
	}
}
