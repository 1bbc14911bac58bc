//! Tries handlers in a fixed order and returns the first non-empty result,
//! then attaches the line's timestamp (if any) to the record.

use crate::handlers::{handle_profile_entry, log_line_handlers};
use crate::record::NormalizedRecord;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<ts>\w{3} \w{3}\s+\d{1,2} \d{2}:\d{2}:\d{2})").expect("valid regex"));

/// `Wkd Mon D HH:MM:SS`, year absent; the current UTC year is assumed.
fn extract_timestamp(line: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
	let caps = TIMESTAMP_RE.captures(line)?;
	let raw = caps.name("ts")?.as_str();
	let with_year = format!("{raw} {}", now.format("%Y"));
	let naive = NaiveDateTime::parse_from_str(&with_year, "%a %b %e %H:%M:%S %Y").ok()?;
	Some(Utc.from_utc_datetime(&naive))
}

/// Whether `line` carries a recognizable log timestamp prefix, independent
/// of whether any handler can make sense of the rest of the line. Lets a
/// driver distinguish "unparsable but clearly a log line" from "not a log
/// line at all" when `dispatch_log_line` returns `None`.
pub fn has_timestamp_prefix(line: &str) -> bool {
	TIMESTAMP_RE.is_match(line)
}

/// Runs the ordered handler list against one log line; a handler that
/// panics-equivalent (returns `None`) simply yields no result and the
/// dispatcher moves to the next one.
pub fn dispatch_log_line(line: &str, now: DateTime<Utc>) -> Option<NormalizedRecord> {
	let mut record = log_line_handlers().into_iter().find_map(|h| h(line))?;
	record.ts = extract_timestamp(line, now);
	Some(record)
}

/// Dispatches a structured profile-collection entry. The timestamp, if the
/// entry carries one as an RFC 3339 string, is attached directly — profile
/// entries don't need the log-line timestamp regex.
pub fn dispatch_profile_entry(entry: &IndexMap<String, Value>) -> Option<NormalizedRecord> {
	let mut record = handle_profile_entry(entry)?;
	record.ts = entry
		.get("ts")
		.and_then(Value::as_str)
		.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
		.map(|dt| dt.with_timezone(&Utc));
	Some(record)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn attaches_timestamp_with_assumed_year() {
		let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
		let line = "Thu Jan  1 03:04:05 [conn1] query mydb.mycoll query: { a: 1 } 12ms";
		let rec = dispatch_log_line(line, now).unwrap();
		let ts = rec.ts.unwrap();
		assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-01-01 03:04:05");
	}

	#[test]
	fn command_handler_runs_before_standard_handler() {
		let now = Utc::now();
		let line = r#"Thu Jan  1 00:00:00 [conn1] command mydb.$cmd command: { count: "mycoll", query: { a: 1 } } 12ms"#;
		let rec = dispatch_log_line(line, now).unwrap();
		assert_eq!(rec.command.as_deref(), Some("count"));
	}

	#[test]
	fn falls_through_to_timing_fallback_on_unrecognized_line() {
		let now = Utc::now();
		let line = "totally unstructured line ending in 9ms";
		let rec = dispatch_log_line(line, now).unwrap();
		assert_eq!(rec.ns, "?");
		assert!(!rec.supported);
	}

	#[test]
	fn returns_none_for_lines_with_no_handler_match() {
		let now = Utc::now();
		assert!(dispatch_log_line("nothing relevant here", now).is_none());
	}
}
