pub mod aggregator;
pub mod index_cache;

pub use aggregator::{AggregatedEntry, AggregatedStats, ReportAggregator};
pub use index_cache::{IndexCache, IndexSource, StaticIndexSource};
