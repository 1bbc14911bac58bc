//! Keyed by `(database, collection)`, lazily populated from the live
//! server and never re-fetched once an entry exists. Mirrors the teacher
//! crate's `StreamStore`: a `DashMap`-backed store safe to share across
//! concurrent readers, built once per key.

use common::index::IndexCatalog;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

/// The external collaborator that actually talks to the database. Kept as a
/// trait so the core stays testable without a live connection — the crate
/// that wires up the CLI driver supplies a MongoDB-backed implementation;
/// tests and config-driven runs can supply a static one instead.
pub trait IndexSource: Send + Sync {
	fn fetch_indexes(&self, database: &str, collection: &str) -> anyhow::Result<IndexCatalog>;
}

/// A fixed, in-memory `IndexSource` for tests and for callers who already
/// have index metadata (e.g. from a config file) and don't want a live
/// connection.
#[derive(Debug, Clone, Default)]
pub struct StaticIndexSource {
	catalogs: std::collections::HashMap<(String, String), IndexCatalog>,
}

impl StaticIndexSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_catalog(mut self, database: &str, collection: &str, catalog: IndexCatalog) -> Self {
		self.catalogs
			.insert((database.to_string(), collection.to_string()), catalog);
		self
	}
}

impl IndexSource for StaticIndexSource {
	fn fetch_indexes(&self, database: &str, collection: &str) -> anyhow::Result<IndexCatalog> {
		Ok(self
			.catalogs
			.get(&(database.to_string(), collection.to_string()))
			.cloned()
			.unwrap_or_default())
	}
}

#[derive(Default)]
pub struct IndexCache {
	entries: DashMap<(String, String), Arc<IndexCatalog>>,
}

impl IndexCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached catalog for `(database, collection)`, fetching it
	/// through `source` on first observation. A fetch failure is logged and
	/// treated as an empty catalog for this run — it is never re-attempted,
	/// matching `_ensure_index_cache`'s build-once-per-key discipline.
	pub fn get_or_fetch(
		&self,
		database: &str,
		collection: &str,
		source: &dyn IndexSource,
	) -> Arc<IndexCatalog> {
		let key = (database.to_string(), collection.to_string());
		self.entries
			.entry(key)
			.or_insert_with(|| {
				let catalog = source.fetch_indexes(database, collection).unwrap_or_else(|err| {
					warn!(database, collection, error = %err, "failed to fetch index metadata; treating collection as unindexed");
					IndexCatalog::new()
				});
				Arc::new(catalog)
			})
			.clone()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
