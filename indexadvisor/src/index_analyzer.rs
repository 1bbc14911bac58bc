//! Scores each cached index's coverage and ideal-order status against a
//! query analysis, then rolls the per-index reports up into one verdict for
//! the query.

use crate::analyzer::{FieldRole, QueryAnalysis};
use common::index::{IndexCatalog, IndexDescriptor};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
	Unknown,
	None,
	Partial,
	Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
	pub coverage: Coverage,
	pub ideal_order: bool,
	pub query_fields_covered: usize,
	pub index: IndexDescriptor,
	pub supported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexAnalysis {
	pub index_status: Coverage,
	pub full_indexes: Vec<(String, IndexReport)>,
	pub partial_indexes: Vec<(String, IndexReport)>,
}

/// Walks one index's key list against the query's field roles. See
/// spec §4.7: the walk aborts on a `2d` key or on a key absent from the
/// query entirely; otherwise it tracks how many leading keys are covered
/// and whether each one sits in its ideal role position.
pub fn index_report(index: &IndexDescriptor, qa: &QueryAnalysis) -> IndexReport {
	let all_names: HashSet<&str> = qa
		.analyzed_fields
		.iter()
		.map(|f| f.field_name.as_str())
		.collect();
	let equiv: Vec<&str> = fields_with_role(qa, FieldRole::Equiv);
	let sort: Vec<&str> = fields_with_role(qa, FieldRole::Sort);
	let range: Vec<&str> = fields_with_role(qa, FieldRole::Range);

	let equiv_end = equiv.len();
	let sort_end = equiv_end + sort.len();
	let range_end = sort_end + range.len();

	let mut coverage = Coverage::None;
	let mut ideal_order = true;
	let mut supported = true;
	let mut covered = 0usize;

	for (field_name, direction) in &index.key {
		if direction.is_geo2d() {
			supported = false;
			break;
		}
		if !all_names.contains(field_name.as_str()) {
			break;
		}
		if covered == 0 {
			coverage = Coverage::Partial;
		}
		if covered < equiv_end {
			if !equiv.contains(&field_name.as_str()) {
				ideal_order = false;
			}
		} else if covered < sort_end {
			if !sort.contains(&field_name.as_str()) {
				ideal_order = false;
			}
		} else if covered < range_end && !range.contains(&field_name.as_str()) {
			ideal_order = false;
		}
		covered += 1;
	}

	if covered == qa.field_count {
		coverage = Coverage::Full;
	}

	IndexReport {
		coverage,
		ideal_order,
		query_fields_covered: covered,
		index: index.clone(),
		supported,
	}
}

fn fields_with_role(qa: &QueryAnalysis, role: FieldRole) -> Vec<&str> {
	qa.analyzed_fields
		.iter()
		.filter(|f| f.field_type == role)
		.map(|f| f.field_name.as_str())
		.collect()
}

/// Scores every index in the catalog and rolls the results up: `full` if
/// any index report was full, else `partial` if any was partial, else
/// `none`. A `2d`-aborted report (`supported = false`) contributes to
/// neither bucket.
pub fn analyze_indexes(catalog: &IndexCatalog, qa: &QueryAnalysis) -> IndexAnalysis {
	let mut full_indexes = Vec::new();
	let mut partial_indexes = Vec::new();

	for (name, index) in catalog {
		let report = index_report(index, qa);
		if !report.supported {
			continue;
		}
		match report.coverage {
			Coverage::Full => full_indexes.push((name.clone(), report)),
			Coverage::Partial => partial_indexes.push((name.clone(), report)),
			_ => {}
		}
	}

	let index_status = if !full_indexes.is_empty() {
		Coverage::Full
	} else if !partial_indexes.is_empty() {
		Coverage::Partial
	} else {
		Coverage::None
	};

	IndexAnalysis {
		index_status,
		full_indexes,
		partial_indexes,
	}
}

/// A recommendation is unnecessary only when some full index also achieves
/// ideal key order.
pub fn needs_recommendation(analysis: &IndexAnalysis) -> bool {
	!analysis
		.full_indexes
		.iter()
		.any(|(_, report)| report.ideal_order)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::analyzer::AnalyzedField;
	use common::index::IndexDirection;
	use pretty_assertions::assert_eq;

	fn qa_with(fields: Vec<(&str, FieldRole)>) -> QueryAnalysis {
		let analyzed_fields: Vec<AnalyzedField> = fields
			.into_iter()
			.enumerate()
			.map(|(i, (name, role))| AnalyzedField {
				field_name: name.to_string(),
				field_type: role,
				seq: if role == FieldRole::Sort { Some(i) } else { None },
			})
			.collect();
		QueryAnalysis {
			field_count: analyzed_fields.len(),
			supported: true,
			query_mask: None,
			analyzed_fields,
		}
	}

	fn asc(fields: &[&str]) -> IndexDescriptor {
		IndexDescriptor::new(
			fields
				.iter()
				.map(|f| (f.to_string(), IndexDirection::Ascending))
				.collect(),
		)
	}

	#[test]
	fn unindexed_field_yields_no_coverage() {
		let qa = qa_with(vec![("simpleUnindexedField", FieldRole::Equiv)]);
		let idx = asc(&["simpleIndexedField"]);
		let report = index_report(&idx, &qa);
		assert_eq!(report.coverage, Coverage::None);
	}

	#[test]
	fn exact_single_field_match_is_full_and_ideal() {
		let qa = qa_with(vec![("simpleIndexedField", FieldRole::Equiv)]);
		let idx = asc(&["simpleIndexedField"]);
		let report = index_report(&idx, &qa);
		assert_eq!(report.coverage, Coverage::Full);
		assert!(report.ideal_order);
	}

	#[test]
	fn wrong_order_breaks_ideal_but_can_still_be_full() {
		// index has rangefield before equivfield; query wants equiv first.
		let qa = qa_with(vec![
			("complexIndexedFieldNine", FieldRole::Equiv),
			("complexIndexedFieldTen", FieldRole::Range),
		]);
		let idx = asc(&["complexIndexedFieldTen", "complexIndexedFieldNine"]);
		let report = index_report(&idx, &qa);
		assert_eq!(report.coverage, Coverage::Full);
		assert!(!report.ideal_order);
	}

	#[test]
	fn geo_2d_index_is_unsupported_and_aborts() {
		let qa = qa_with(vec![("geoOne", FieldRole::Unsupported)]);
		let idx = IndexDescriptor::new(vec![("geoOne".to_string(), IndexDirection::Geo2d)]);
		let report = index_report(&idx, &qa);
		assert!(!report.supported);
	}

	#[test]
	fn three_field_prefix_covers_two_field_query() {
		let qa = qa_with(vec![
			("complexIndexedFieldOne", FieldRole::Equiv),
			("complexIndexedFieldTwo", FieldRole::Equiv),
		]);
		let idx = asc(&[
			"complexIndexedFieldOne",
			"complexIndexedFieldTwo",
			"complexIndexedFieldThree",
		]);
		let report = index_report(&idx, &qa);
		assert_eq!(report.coverage, Coverage::Full);
		assert!(report.ideal_order);
	}
}
