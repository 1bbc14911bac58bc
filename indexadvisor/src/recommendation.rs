//! Synthesizes the canonical "ideal index" shape for a query that has no
//! sufficiently good existing index, plus the shell command an operator can
//! paste in to create it.

use crate::analyzer::{AnalyzedField, FieldRole, QueryAnalysis};
use indexmap::IndexMap;
use itertools::Itertools;
use queryscrub::value::{ordered_json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
	pub index: String,
	pub shell_command: String,
}

/// Emits `{fE1: 1, ..., fS1: 1, ..., fR1: 1, ...}`: EQUIV fields in
/// predicate order, then SORT fields in sort-specification order, then
/// RANGE fields in predicate order, all ascending. `None` if the query has
/// no fields left to index once sort/predicate roles are laid out (nothing
/// useful to recommend).
pub fn synthesize_recommendation(collection: &str, qa: &QueryAnalysis) -> Option<Recommendation> {
	let by_role: std::collections::HashMap<FieldRole, Vec<&AnalyzedField>> = qa
		.analyzed_fields
		.iter()
		.into_group_map_by(|f| f.field_type);

	let mut ordered_fields = IndexMap::new();
	for role in [FieldRole::Equiv, FieldRole::Sort, FieldRole::Range] {
		for field in by_role.get(&role).into_iter().flatten() {
			ordered_fields.insert(field.field_name.clone(), Value::Int(1));
		}
	}
	if ordered_fields.is_empty() {
		return None;
	}

	let index = ordered_json(&Value::Doc(ordered_fields));
	let shell_command = format!(
		"db[\"{}\"].ensureIndex({}, {{\"background\": true}})",
		collection, index
	);
	Some(Recommendation {
		index,
		shell_command,
	})
}
