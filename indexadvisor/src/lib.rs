pub mod analyzer;
pub mod index_analyzer;
pub mod recommendation;
pub mod report;

pub use analyzer::{analyze_query, AnalyzedField, FieldRole, QueryAnalysis};
pub use index_analyzer::{analyze_indexes, index_report, needs_recommendation, Coverage, IndexAnalysis, IndexReport};
pub use recommendation::{synthesize_recommendation, Recommendation};
pub use report::{analyze, PerQueryReport};
