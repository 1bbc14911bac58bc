use indexmap::IndexMap;

/// A single key's direction or special type within an index, as returned by
/// the server's index metadata (`db[collection].index_information()` in the
/// original). Almost always `Ascending`/`Descending`; `Geo2d` is the one
/// special case the analyzer treats differently.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDirection {
	Ascending,
	Descending,
	Geo2d,
	Other(String),
}

impl IndexDirection {
	pub fn is_geo2d(&self) -> bool {
		matches!(self, IndexDirection::Geo2d)
	}
}

impl From<i64> for IndexDirection {
	fn from(value: i64) -> Self {
		if value < 0 {
			IndexDirection::Descending
		} else {
			IndexDirection::Ascending
		}
	}
}

impl From<&str> for IndexDirection {
	fn from(value: &str) -> Self {
		if value == "2d" {
			IndexDirection::Geo2d
		} else {
			IndexDirection::Other(value.to_string())
		}
	}
}

/// One index's key pattern, in the order the server reports it. Order is
/// significant: it drives the prefix walk in the index analyzer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexDescriptor {
	pub key: Vec<(String, IndexDirection)>,
}

impl IndexDescriptor {
	pub fn new(key: Vec<(String, IndexDirection)>) -> Self {
		Self { key }
	}
}

/// All indexes known for one collection, keyed by index name, in the order
/// the server returned them.
pub type IndexCatalog = IndexMap<String, IndexDescriptor>;
