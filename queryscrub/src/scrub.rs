//! Recursive replacement of literal values with placeholders, and canonical
//! serialization of the resulting shape into a query mask.

use crate::value::{canonical_json, Value};
use indexmap::IndexMap;

const PLACEHOLDER: &str = "<val>";

/// Multi-valued predicate operators whose argument list order is not
/// semantically meaningful; scrubbing collapses it to a single placeholder
/// element rather than a sorted list of placeholders.
const LIST_VALUE_OPERATORS: [&str; 3] = ["$in", "$nin", "$all"];

/// Replaces every leaf value with `<val>`, sorting sequences so that two
/// queries differing only in list-argument order collapse to one mask.
pub fn scrub(v: &Value) -> Value {
	match v {
		Value::Doc(map) => {
			let mut out = IndexMap::with_capacity(map.len());
			for (k, val) in map {
				if LIST_VALUE_OPERATORS.contains(&k.as_str()) {
					out.insert(k.clone(), Value::Array(vec![Value::Str(PLACEHOLDER.to_string())]));
				} else {
					out.insert(k.clone(), scrub(val));
				}
			}
			Value::Doc(out)
		}
		Value::Array(items) => {
			let mut scrubbed: Vec<Value> = items.iter().map(scrub).collect();
			scrubbed.sort_by_key(canonical_json);
			Value::Array(scrubbed)
		}
		_ => Value::Str(PLACEHOLDER.to_string()),
	}
}

/// Builds the canonical query mask: the scrubbed predicate wrapped in a
/// `$query`/`$orderby`/`$cmd` envelope, serialized with keys sorted ascending
/// at every level.
pub fn build_mask(query: &Value, orderby: Option<&Value>, command: Option<&str>) -> String {
	let mut envelope = IndexMap::new();
	envelope.insert("$query".to_string(), scrub(query));
	if let Some(ob) = orderby {
		envelope.insert("$orderby".to_string(), scrub(ob));
	}
	if let Some(cmd) = command {
		envelope.insert("$cmd".to_string(), Value::Str(cmd.to_string()));
	}
	canonical_json(&Value::Doc(envelope))
}
