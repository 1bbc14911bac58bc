use indexmap::IndexMap;

/// An ordered document value. Mirrors the shapes a log-embedded query or
/// profile entry can carry; map iteration order is insertion order, never
/// re-sorted except when serialized canonically via [`canonical_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	Array(Vec<Value>),
	Doc(IndexMap<String, Value>),
}

impl Value {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			Value::Float(f) => Some(*f as i64),
			_ => None,
		}
	}

	pub fn as_doc(&self) -> Option<&IndexMap<String, Value>> {
		match self {
			Value::Doc(d) => Some(d),
			_ => None,
		}
	}

	pub fn empty_doc() -> Self {
		Value::Doc(IndexMap::new())
	}
}

/// Serializes `v` with keys sorted ascending at every nesting level and no
/// whitespace, the way `small_json` does: `,`/`:` separators, nothing else.
pub fn canonical_json(v: &Value) -> String {
	let mut out = String::new();
	write_canonical(v, &mut out);
	out
}

/// Serializes `v` preserving map insertion order, with the `", "`/`": "`
/// spacing of a hand-written shell literal. Used where key order is itself
/// the payload — the recommendation synthesizer's index shape — so it must
/// not alphabetize like [`canonical_json`] does.
pub fn ordered_json(v: &Value) -> String {
	let mut out = String::new();
	write_ordered(v, &mut out);
	out
}

fn write_ordered(v: &Value, out: &mut String) {
	match v {
		Value::Doc(map) => {
			out.push('{');
			for (i, (k, val)) in map.iter().enumerate() {
				if i > 0 {
					out.push_str(", ");
				}
				out.push('"');
				escape_into(k, out);
				out.push_str("\": ");
				write_ordered(val, out);
			}
			out.push('}');
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push_str(", ");
				}
				write_ordered(item, out);
			}
			out.push(']');
		}
		scalar => write_canonical(scalar, out),
	}
}

fn write_canonical(v: &Value, out: &mut String) {
	match v {
		Value::Null => out.push_str("null"),
		Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
		Value::Int(i) => out.push_str(&i.to_string()),
		Value::Float(f) => out.push_str(&format_float(*f)),
		Value::Str(s) => {
			out.push('"');
			escape_into(s, out);
			out.push('"');
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_canonical(item, out);
			}
			out.push(']');
		}
		Value::Doc(map) => {
			let mut keys: Vec<&String> = map.keys().collect();
			keys.sort();
			out.push('{');
			for (i, k) in keys.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				out.push('"');
				escape_into(k, out);
				out.push('"');
				out.push(':');
				write_canonical(&map[*k], out);
			}
			out.push('}');
		}
	}
}

fn format_float(f: f64) -> String {
	if f.fract() == 0.0 && f.is_finite() {
		format!("{:.1}", f)
	} else {
		f.to_string()
	}
}

fn escape_into(s: &str, out: &mut String) {
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\t' => out.push_str("\\t"),
			'\r' => out.push_str("\\r"),
			_ => out.push(c),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn canonical_json_sorts_keys() {
		let mut m = IndexMap::new();
		m.insert("b".to_string(), Value::Int(1));
		m.insert("a".to_string(), Value::Int(2));
		assert_eq!(canonical_json(&Value::Doc(m)), r#"{"a":2,"b":1}"#);
	}

	#[test]
	fn canonical_json_nests_and_sorts_recursively() {
		let mut inner = IndexMap::new();
		inner.insert("z".to_string(), Value::Bool(true));
		inner.insert("y".to_string(), Value::Null);
		let mut outer = IndexMap::new();
		outer.insert("x".to_string(), Value::Doc(inner));
		assert_eq!(
			canonical_json(&Value::Doc(outer)),
			r#"{"x":{"y":null,"z":true}}"#
		);
	}
}
