//! Turns driver-native BSON documents (profile entries, index specs) into
//! the `queryscrub::Value` the permissive log-line parser also produces, so
//! downstream analysis never needs to know which source a record came from.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use mongodb::bson::{Bson, Document};
use queryscrub::Value;

pub fn document_to_map(doc: &Document) -> IndexMap<String, Value> {
	doc.iter().map(|(k, v)| (k.clone(), bson_to_value(v))).collect()
}

/// Converts a driver `DateTime` to UTC by way of its millisecond epoch
/// value, not its `Display` impl. Shared with `input.rs`'s profile-poll
/// watermark so both readings of the same field agree.
pub fn chrono_from_bson_datetime(ts: mongodb::bson::DateTime) -> DateTime<Utc> {
	DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or_default()
}

fn bson_to_value(b: &Bson) -> Value {
	match b {
		Bson::Null => Value::Null,
		Bson::Boolean(b) => Value::Bool(*b),
		Bson::Int32(i) => Value::Int(*i as i64),
		Bson::Int64(i) => Value::Int(*i),
		Bson::Double(f) => Value::Float(*f),
		Bson::String(s) => Value::Str(s.clone()),
		Bson::Array(items) => Value::Array(items.iter().map(bson_to_value).collect()),
		Bson::Document(doc) => Value::Doc(document_to_map(doc)),
		// `ts` on a profile entry is a driver `DateTime`, not a string; route it
		// through the same millisecond conversion the profile-poll watermark
		// uses rather than through `Bson`'s `Display`, so `dispatch_profile_entry`
		// can recover it with `DateTime::parse_from_rfc3339` reliably.
		Bson::DateTime(dt) => Value::Str(chrono_from_bson_datetime(*dt).to_rfc3339()),
		other => Value::Str(other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mongodb::bson::doc;
	use pretty_assertions::assert_eq;

	#[test]
	fn converts_scalars_and_nesting() {
		let doc = doc! {
			"ns": "mydb.mycoll",
			"millis": 12i64,
			"query": { "a": 1, "tags": ["x", "y"] },
		};
		let map = document_to_map(&doc);
		assert_eq!(map.get("ns"), Some(&Value::Str("mydb.mycoll".to_string())));
		assert_eq!(map.get("millis"), Some(&Value::Int(12)));
		match map.get("query") {
			Some(Value::Doc(inner)) => {
				assert_eq!(inner.get("a"), Some(&Value::Int(1)));
				assert_eq!(
					inner.get("tags"),
					Some(&Value::Array(vec![
						Value::Str("x".to_string()),
						Value::Str("y".to_string())
					]))
				);
			}
			other => panic!("expected nested doc, got {other:?}"),
		}
	}

	#[test]
	fn datetime_round_trips_through_rfc3339_not_display() {
		let ts = mongodb::bson::DateTime::from_millis(1_700_000_000_000);
		let doc = doc! { "ts": ts };
		let map = document_to_map(&doc);
		let rendered = map.get("ts").and_then(Value::as_str).expect("ts stringified");
		let reparsed = DateTime::parse_from_rfc3339(rendered)
			.expect("must be valid rfc3339")
			.with_timezone(&Utc);
		assert_eq!(reparsed, chrono_from_bson_datetime(ts));
	}
}
