//! Ties the query analyzer, index analyzer, and recommendation synthesizer
//! together into the per-query report the aggregator consumes.

use crate::analyzer::{analyze_query, QueryAnalysis};
use crate::index_analyzer::{analyze_indexes, needs_recommendation, Coverage, IndexAnalysis};
use crate::recommendation::{synthesize_recommendation, Recommendation};
use common::index::IndexCatalog;
use common::Namespace;
use queryscrub::parser::parse_document;
use queryscrub::NormalizedRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PerQueryReport {
	pub query_mask: Option<String>,
	pub namespace: String,
	pub parsed: NormalizedRecord,
	pub query_analysis: QueryAnalysis,
	pub index_analysis: IndexAnalysis,
	pub recommendation: Option<Recommendation>,
	pub index_status: Coverage,
}

/// Produces the full report for one normalized record against the index
/// catalog for its collection. Mirrors `_generate_query_report`: index
/// analysis and recommendation synthesis only run when the query itself is
/// supported and has at least one analyzed field (spec §4.6).
pub fn analyze(record: &NormalizedRecord, catalog: &IndexCatalog) -> PerQueryReport {
	let query_analysis = analyze_query(record);

	let (index_analysis, recommendation) =
		if query_analysis.analyzed_fields.is_empty() || !query_analysis.supported {
			(
				IndexAnalysis {
					index_status: Coverage::Unknown,
					full_indexes: Vec::new(),
					partial_indexes: Vec::new(),
				},
				None,
			)
		} else {
			let index_analysis = analyze_indexes(catalog, &query_analysis);
			let recommendation = if needs_recommendation(&index_analysis) {
				let collection = Namespace::parse(&record.ns)
					.map(|ns| ns.collection)
					.unwrap_or_else(|| record.ns.clone());
				synthesize_recommendation(&collection, &query_analysis)
			} else {
				None
			};
			(index_analysis, recommendation)
		};

	// Open question (b): validate the synthesized shape round-trips through
	// the same permissive parser used on log-embedded predicates. A shape
	// that fails to re-parse (e.g. a scrubbed regex literal survived into a
	// field name) is discarded and the query downgraded to unsupported.
	let (recommendation, mut supported) = match recommendation {
		Some(rec) if parse_document(&rec.index).is_ok() => (Some(rec), query_analysis.supported),
		Some(_) => (None, false),
		None => (None, query_analysis.supported),
	};
	if !query_analysis.supported {
		supported = false;
	}

	let mut query_analysis = query_analysis;
	query_analysis.supported = supported;

	PerQueryReport {
		query_mask: record.query_mask.clone(),
		namespace: record.ns.clone(),
		index_status: index_analysis.index_status,
		parsed: record.clone(),
		query_analysis,
		index_analysis,
		recommendation,
	}
}
