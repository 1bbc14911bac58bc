//! Classifies each field of a normalized query by the access role it plays,
//! producing the ordered field list the index analyzer walks against.

use queryscrub::{NormalizedRecord, Value};

/// Composite operators that wrap whole sub-queries; never analyzable field
/// by field.
const COMPOSITE_OPERATORS: [&str; 3] = ["$or", "$nor", "$and"];

/// Operators dex has no index-shape story for.
const UNSUPPORTED_OPERATORS: [&str; 8] = [
	"$mod",
	"$exists",
	"$size",
	"$type",
	"$elemMatch",
	"$where",
	"$near",
	"$within",
];

/// Operators that narrow a field to a range rather than pinning it to one
/// value. `$not` is included even though it wraps another operator — see
/// DESIGN.md's open-question note.
const RANGE_OPERATORS: [&str; 9] = [
	"$ne", "$gt", "$lt", "$gte", "$lte", "$in", "$nin", "$all", "$not",
];

/// The role a field plays in an ideal compound index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
	Equiv,
	Range,
	Sort,
	Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedField {
	pub field_name: String,
	pub field_type: FieldRole,
	pub seq: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnalysis {
	pub analyzed_fields: Vec<AnalyzedField>,
	pub field_count: usize,
	pub supported: bool,
	pub query_mask: Option<String>,
}

/// Classifies a predicate value once its key has been established not to be
/// a composite or otherwise-unsupported operator: an empty or non-mapping
/// value is EQUIV; a mapping whose inner keys are all range operators is
/// RANGE; anything else is UNSUPPORTED.
fn classify_predicate_value(value: &Value) -> FieldRole {
	match value {
		Value::Doc(map) if !map.is_empty() => {
			if map.keys().all(|k| RANGE_OPERATORS.contains(&k.as_str())) {
				FieldRole::Range
			} else {
				FieldRole::Unsupported
			}
		}
		_ => FieldRole::Equiv,
	}
}

/// Builds the ordered field-role list for a normalized record: sort fields
/// first (in sort-specification order), then predicate fields in source
/// order, skipping any predicate key already claimed by the sort.
pub fn analyze_query(record: &NormalizedRecord) -> QueryAnalysis {
	let mut supported = record.supported;
	let mut analyzed_fields = Vec::new();
	let mut sort_field_names: Vec<&str> = Vec::new();

	if let Some(orderby) = record.orderby.as_ref().and_then(Value::as_doc) {
		for (seq, key) in orderby.keys().enumerate() {
			analyzed_fields.push(AnalyzedField {
				field_name: key.clone(),
				field_type: FieldRole::Sort,
				seq: Some(seq),
			});
			sort_field_names.push(key.as_str());
		}
	}

	if let Some(doc) = record.query.as_doc() {
		for (key, value) in doc {
			if sort_field_names.contains(&key.as_str()) {
				continue;
			}
			let field_type = if COMPOSITE_OPERATORS.contains(&key.as_str())
				|| UNSUPPORTED_OPERATORS.contains(&key.as_str())
			{
				supported = false;
				FieldRole::Unsupported
			} else {
				let role = classify_predicate_value(value);
				if role == FieldRole::Unsupported {
					supported = false;
				}
				role
			};
			analyzed_fields.push(AnalyzedField {
				field_name: key.clone(),
				field_type,
				seq: None,
			});
		}
	}

	QueryAnalysis {
		field_count: analyzed_fields.len(),
		supported,
		query_mask: record.query_mask.clone(),
		analyzed_fields,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use queryscrub::dispatcher::dispatch_log_line;

	fn analyze_line(line: &str) -> QueryAnalysis {
		let rec = dispatch_log_line(line, chrono::Utc::now()).unwrap();
		analyze_query(&rec)
	}

	#[test]
	fn empty_subdocument_is_equiv() {
		let qa = analyze_line(
			"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { a: {} } 5ms",
		);
		assert_eq!(qa.analyzed_fields[0].field_type, FieldRole::Equiv);
	}

	#[test]
	fn in_operator_is_range_not_equiv() {
		let qa = analyze_line(
			"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { a: {$in: [1,2]} } 5ms",
		);
		assert_eq!(qa.analyzed_fields[0].field_type, FieldRole::Range);
	}

	#[test]
	fn near_is_unsupported() {
		let qa = analyze_line(
			"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { geoOne: {$near: [50,50]} } 5ms",
		);
		assert_eq!(qa.analyzed_fields[0].field_type, FieldRole::Unsupported);
		assert!(!qa.supported);
	}

	#[test]
	fn sort_fields_precede_predicate_fields_and_dedupe() {
		let qa = analyze_line(
			"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { $query: { a: 1, b: 2 }, $orderby: { b: 1 } } 5ms",
		);
		let names: Vec<&str> = qa
			.analyzed_fields
			.iter()
			.map(|f| f.field_name.as_str())
			.collect();
		assert_eq!(names, vec!["b", "a"]);
		assert_eq!(qa.analyzed_fields[0].field_type, FieldRole::Sort);
	}

	#[test]
	fn composite_operator_marks_unsupported() {
		let qa = analyze_line(
			"Thu Jan  1 00:00:00 [conn1] query mydb.mycoll query: { $or: [{a: 1}] } 5ms",
		);
		assert!(!qa.supported);
		assert_eq!(qa.analyzed_fields[0].field_type, FieldRole::Unsupported);
	}
}
